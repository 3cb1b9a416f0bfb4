//! Quintet deduplication.
//!
//! The same five cards can be reached from several contexts: another category
//! pair, another trait pair, or another template. Only the first sighting of a
//! canonical five-card set survives, across the whole run.

use std::collections::HashSet;

use crate::assemble::Quad;
use crate::tables::CardId;

/// Five card ids, ascending.
pub type Quintet = [CardId; 5];

pub fn canonical_quintet(quad: &Quad, anchor: CardId) -> Quintet {
    let mut q = [quad[0], quad[1], quad[2], quad[3], anchor];
    q.sort_unstable();
    q
}

/// Every quintet emitted so far in a run. Owned by the single merge step.
#[derive(Debug, Default)]
pub struct QuintetLedger {
    seen: HashSet<Quintet>,
    absorbed: usize,
}

impl QuintetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors that form a new quintet with `quad`, in candidate order.
    /// Each admitted quintet is recorded.
    pub fn admit(&mut self, quad: &Quad, anchors: &[CardId]) -> Vec<CardId> {
        let mut fresh = Vec::new();
        for &anchor in anchors {
            if quad.contains(&anchor) {
                continue;
            }
            if self.seen.insert(canonical_quintet(quad, anchor)) {
                fresh.push(anchor);
            } else {
                self.absorbed += 1;
            }
        }
        fresh
    }

    #[cfg(test)]
    fn contains(&self, quintet: &Quintet) -> bool {
        self.seen.contains(quintet)
    }

    /// Distinct quintets admitted.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Duplicate sightings swallowed so far.
    pub fn absorbed(&self) -> usize {
        self.absorbed
    }
}
