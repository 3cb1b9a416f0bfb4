//! Trait encoder: gives every qualifying trait a bit position in its category.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{Result, SolveError};
use crate::mask::{TraitMask, TRAIT_BITS};
use crate::tables::{TraitId, TraitRow};

pub const CATEGORY_COUNT: u8 = 5;

/// One of the five trait axes ("colors"), numbered 1..=5 as in the trait table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(u8);

impl Category {
    pub fn new(n: u32) -> Option<Self> {
        (1..=CATEGORY_COUNT as u32)
            .contains(&n)
            .then_some(Self(n as u8))
    }

    pub fn all() -> impl Iterator<Item = Category> {
        (1..=CATEGORY_COUNT).map(Category)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a trait lives: its category and its single-bit mask there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitSlot {
    pub category: Category,
    pub mask: TraitMask,
}

/// Immutable trait-to-bit assignment for one run.
///
/// Within a category traits are ordered by id and numbered from bit 0, so the
/// same trait table always yields the same positions.
#[derive(Debug, Clone)]
pub struct TraitEncoder {
    by_category: [Vec<TraitId>; CATEGORY_COUNT as usize],
    slots: HashMap<TraitId, TraitSlot>,
    titles: HashMap<TraitId, String>,
}

impl TraitEncoder {
    /// Encodes the traits of `tier`; rows of any other tier are ignored.
    pub fn build(traits: &[TraitRow], tier: u8) -> Result<Self> {
        let mut by_category: [Vec<TraitId>; CATEGORY_COUNT as usize] = Default::default();
        for row in traits.iter().filter(|t| t.tier == tier) {
            let category = Category::new(row.color).ok_or(SolveError::InvalidCategory {
                trait_id: row.id,
                category: row.color,
            })?;
            by_category[category.index()].push(row.id);
        }

        let titles: HashMap<TraitId, String> = traits
            .iter()
            .filter(|t| t.tier == tier)
            .filter_map(|t| Some((t.id, t.title.clone()?)))
            .collect();
        let mut slots = HashMap::new();
        for (category, ids) in Category::all().zip(by_category.iter_mut()) {
            ids.sort_unstable();
            ids.dedup();
            if ids.len() > TRAIT_BITS as usize {
                return Err(SolveError::TooManyTraits {
                    category: category.get(),
                    count: ids.len(),
                });
            }
            for (position, &id) in ids.iter().enumerate() {
                slots.insert(
                    id,
                    TraitSlot {
                        category,
                        mask: TraitMask::bit(position as u8),
                    },
                );
            }
            let named: Vec<&str> = ids
                .iter()
                .filter_map(|id| titles.get(id).map(String::as_str))
                .collect();
            debug!(
                category = category.get(),
                traits = ids.len(),
                titles = ?named,
                "category encoded"
            );
        }

        Ok(Self {
            by_category,
            slots,
            titles,
        })
    }

    pub fn lookup(&self, id: TraitId) -> Option<TraitSlot> {
        self.slots.get(&id).copied()
    }

    /// Traits of `category` in bit order.
    pub fn traits(&self, category: Category) -> &[TraitId] {
        &self.by_category[category.index()]
    }

    #[cfg(test)]
    fn trait_at(&self, category: Category, position: u8) -> Option<TraitId> {
        self.traits(category).get(position as usize).copied()
    }

    /// Display title of a qualifying trait, when the trait table has one.
    pub fn title(&self, id: TraitId) -> Option<&str> {
        self.titles.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
