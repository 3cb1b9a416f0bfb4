//! Quad assembler: turns mask templates into concrete card quads.

use crate::encoder::Category;
use crate::index::{intersect_sorted, CardIndex};
use crate::partition::SLOTS;
use crate::tables::CardId;
use crate::template::Template;

/// Four card ids, ascending.
pub type Quad = [CardId; SLOTS];

/// Resolves templates of one category pair against the card index.
#[derive(Debug, Clone, Copy)]
pub struct QuadAssembler<'a> {
    index: &'a CardIndex,
    first: Category,
    second: Category,
}

impl<'a> QuadAssembler<'a> {
    pub fn new(index: &'a CardIndex, first: Category, second: Category) -> Self {
        Self {
            index,
            first,
            second,
        }
    }

    /// Candidate cards per slot, or `None` as soon as one slot has none.
    pub fn resolve(&self, template: &Template) -> Option<[Vec<CardId>; SLOTS]> {
        let mut slots: [Vec<CardId>; SLOTS] = Default::default();
        for (slot, &(first_mask, second_mask)) in slots.iter_mut().zip(template.iter()) {
            let a = self.index.cards_of(self.first, first_mask);
            if a.is_empty() {
                return None;
            }
            let b = self.index.cards_of(self.second, second_mask);
            *slot = intersect_sorted(a, b);
            if slot.is_empty() {
                return None;
            }
        }
        Some(slots)
    }

    /// Appends every quad `template` admits to `out`. Returns how many were added.
    pub fn assemble(&self, template: &Template, out: &mut Vec<Quad>) -> usize {
        match self.resolve(template) {
            Some(slots) => cross_product(&slots, out),
            None => 0,
        }
    }
}

/// Appends one sorted quad per combination of slot candidates.
pub fn cross_product(slots: &[Vec<CardId>; SLOTS], out: &mut Vec<Quad>) -> usize {
    let before = out.len();
    for &a in &slots[0] {
        for &b in &slots[1] {
            for &c in &slots[2] {
                for &d in &slots[3] {
                    let mut quad = [a, b, c, d];
                    quad.sort_unstable();
                    out.push(quad);
                }
            }
        }
    }
    out.len() - before
}
