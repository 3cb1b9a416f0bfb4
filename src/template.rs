//! Solution template builder.
//!
//! A template pairs two partitions, one per category, into four card slots.
//! Slot `k` asks for a card whose mask in the first category is the first
//! partition's mask `k` and whose mask in the second category is the second
//! partition's mask `row[k]`, for one row of a fixed interleave table. Every
//! slot carries three bits in total: a 2-bit mask on one side always meets a
//! 1-bit mask on the other.

use crate::mask::TraitMask;
use crate::partition::{Partition, PartitionCache, Shape, SLOTS};

/// Masks a slot's card must carry in the first and second category.
pub type SlotPair = (TraitMask, TraitMask);

pub type Template = [SlotPair; SLOTS];

pub type Interleave = [usize; SLOTS];

/// `2,2,1,1` against `2,2,1,1`: first-side pairs meet second-side singles and
/// the other way round.
pub const CROSS_INTERLEAVE: [Interleave; 4] = [[2, 3, 0, 1], [2, 3, 1, 0], [3, 2, 0, 1], [3, 2, 1, 0]];

/// `2,1,1,1` against `2,2,2,1`.
pub const FIRST_HEAVY_INTERLEAVE: [Interleave; 6] = [
    [3, 0, 1, 2],
    [3, 0, 2, 1],
    [3, 1, 0, 2],
    [3, 1, 2, 0],
    [3, 2, 0, 1],
    [3, 2, 1, 0],
];

/// `2,2,2,1` against `2,1,1,1`.
pub const SECOND_HEAVY_INTERLEAVE: [Interleave; 6] = [
    [1, 2, 3, 0],
    [1, 3, 2, 0],
    [2, 1, 3, 0],
    [2, 3, 1, 0],
    [3, 1, 2, 0],
    [3, 2, 1, 0],
];

/// Which way a context's trait pair sits across its category pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// One trait in each category.
    Cross,
    /// Both traits in the first category.
    FirstHeavy,
    /// Both traits in the second category.
    SecondHeavy,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::Cross,
        TemplateKind::FirstHeavy,
        TemplateKind::SecondHeavy,
    ];

    /// Partition shapes of the first and second category.
    pub const fn shapes(self) -> (Shape, Shape) {
        match self {
            TemplateKind::Cross => (Shape::TwoTwoOneOne, Shape::TwoTwoOneOne),
            TemplateKind::FirstHeavy => (Shape::TwoOneOneOne, Shape::TwoTwoTwoOne),
            TemplateKind::SecondHeavy => (Shape::TwoTwoTwoOne, Shape::TwoOneOneOne),
        }
    }

    pub const fn interleave(self) -> &'static [Interleave] {
        match self {
            TemplateKind::Cross => &CROSS_INTERLEAVE,
            TemplateKind::FirstHeavy => &FIRST_HEAVY_INTERLEAVE,
            TemplateKind::SecondHeavy => &SECOND_HEAVY_INTERLEAVE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TemplateKind::Cross => "2x2",
            TemplateKind::FirstHeavy => "3+1",
            TemplateKind::SecondHeavy => "1+3",
        }
    }

    /// Every template around the given anchors.
    pub fn templates<'a>(
        self,
        cache: &'a PartitionCache,
        first_anchor: TraitMask,
        second_anchor: TraitMask,
    ) -> impl Iterator<Item = Template> + 'a {
        let (first_shape, second_shape) = self.shapes();
        interleave(
            cache.get(first_shape, first_anchor),
            cache.get(second_shape, second_anchor),
            self.interleave(),
        )
    }
}

fn interleave<'a>(
    first: &'a [Partition],
    second: &'a [Partition],
    table: &'static [Interleave],
) -> impl Iterator<Item = Template> + 'a {
    first.iter().flat_map(move |a| {
        second.iter().flat_map(move |b| {
            table
                .iter()
                .map(move |row| std::array::from_fn(|k| (a[k], b[row[k]])))
        })
    })
}

/// Templates for a trait pair split across the two categories (1-bit anchors).
pub fn find_solutions_2_2(
    cache: &PartitionCache,
    first_anchor: TraitMask,
    second_anchor: TraitMask,
) -> impl Iterator<Item = Template> + '_ {
    TemplateKind::Cross.templates(cache, first_anchor, second_anchor)
}

/// Templates for a trait pair inside the first category (2-bit anchor there,
/// nothing anchored in the second).
pub fn find_solutions_3_1(
    cache: &PartitionCache,
    first_anchor: TraitMask,
) -> impl Iterator<Item = Template> + '_ {
    TemplateKind::FirstHeavy.templates(cache, first_anchor, TraitMask::EMPTY)
}

/// Templates for a trait pair inside the second category.
pub fn find_solutions_1_3(
    cache: &PartitionCache,
    second_anchor: TraitMask,
) -> impl Iterator<Item = Template> + '_ {
    TemplateKind::SecondHeavy.templates(cache, TraitMask::EMPTY, second_anchor)
}
