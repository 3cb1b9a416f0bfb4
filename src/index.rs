//! Card index: per-category code buckets and per-trait holder lists.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::config::DatasetConfig;
use crate::encoder::{Category, TraitEncoder, CATEGORY_COUNT};
use crate::mask::TraitMask;
use crate::tables::{CardId, Tables, TraitId};

/// Immutable lookup structure the solver intersects against.
#[derive(Debug, Clone, Default)]
pub struct CardIndex {
    /// category -> mask -> sorted card ids
    buckets: [BTreeMap<TraitMask, Vec<CardId>>; CATEGORY_COUNT as usize],
    /// trait -> sorted card ids holding it
    holders: HashMap<TraitId, Vec<CardId>>,
    /// card -> mask per category (empty where the card grants nothing)
    masks: BTreeMap<CardId, [TraitMask; CATEGORY_COUNT as usize]>,
}

impl CardIndex {
    pub fn build(tables: &Tables, encoder: &TraitEncoder, dataset: &DatasetConfig) -> Self {
        let eligible = eligible_cards(tables, dataset);
        let known: BTreeSet<CardId> = tables.cards.iter().map(|c| c.id).collect();

        let mut masks: BTreeMap<CardId, [TraitMask; CATEGORY_COUNT as usize]> = BTreeMap::new();
        let mut holders: HashMap<TraitId, BTreeSet<CardId>> = HashMap::new();
        let mut unknown_cards = BTreeSet::new();

        for row in tables.mappings() {
            if !eligible.contains(&row.card_id) {
                if !known.contains(&row.card_id) {
                    unknown_cards.insert(row.card_id);
                }
                continue;
            }
            let Some(slot) = encoder.lookup(row.trait_id) else {
                continue;
            };
            masks.entry(row.card_id).or_default()[slot.category.index()] |= slot.mask;
            holders.entry(row.trait_id).or_default().insert(row.card_id);
        }
        if !unknown_cards.is_empty() {
            warn!(
                count = unknown_cards.len(),
                first = ?unknown_cards.first(),
                "mapping rows name cards missing from the card table"
            );
        }

        let mut buckets: [BTreeMap<TraitMask, Vec<CardId>>; CATEGORY_COUNT as usize] =
            Default::default();
        for (&card, card_masks) in &masks {
            for (bucket, &mask) in buckets.iter_mut().zip(card_masks.iter()) {
                if !mask.is_empty() {
                    // `masks` iterates in id order, so buckets come out sorted.
                    bucket.entry(mask).or_default().push(card);
                }
            }
        }
        for (category, bucket) in Category::all().zip(buckets.iter()) {
            debug!(
                category = category.get(),
                codes = bucket.len(),
                cards = bucket.values().map(Vec::len).sum::<usize>(),
                "category indexed"
            );
        }

        Self {
            buckets,
            holders: holders
                .into_iter()
                .map(|(t, cards)| (t, cards.into_iter().collect()))
                .collect(),
            masks,
        }
    }

    /// Cards whose mask in `category` is exactly `mask`.
    pub fn cards_of(&self, category: Category, mask: TraitMask) -> &[CardId] {
        self.buckets[category.index()]
            .get(&mask)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cards granting `trait_id`, whatever else they grant.
    pub fn holders(&self, trait_id: TraitId) -> &[CardId] {
        self.holders
            .get(&trait_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[cfg(test)]
    fn mask_of(&self, card: CardId, category: Category) -> TraitMask {
        self.masks
            .get(&card)
            .map(|m| m[category.index()])
            .unwrap_or_default()
    }

    /// Code buckets of `category`, ordered by mask.
    #[cfg(test)]
    fn buckets(&self, category: Category) -> impl Iterator<Item = (TraitMask, &[CardId])> {
        self.buckets[category.index()]
            .iter()
            .map(|(&m, cards)| (m, cards.as_slice()))
    }

    /// Number of cards that grant at least one qualifying trait.
    pub fn card_count(&self) -> usize {
        self.masks.len()
    }
}

fn eligible_cards(tables: &Tables, dataset: &DatasetConfig) -> BTreeSet<CardId> {
    let overrides = dataset.rarity_override_map();
    tables
        .cards
        .iter()
        .filter(|c| {
            let rarity = overrides.get(&c.id).copied().unwrap_or(c.rarity);
            dataset.eligible_rarities.contains(&rarity)
        })
        .map(|c| c.id)
        .filter(|id| !dataset.excluded_cards.contains(id))
        .collect()
}

/// Intersection of two ascending id lists.
pub fn intersect_sorted(a: &[CardId], b: &[CardId]) -> Vec<CardId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}
