//! Partition generator.
//!
//! A partition splits the bits an anchor leaves uncovered into four pairwise
//! disjoint masks of fixed sizes. Masks are stored 2-bit ones first, then the
//! 1-bit ones, each group ascending, so every unordered split appears exactly
//! once.
//!
//! | shape     | anchor bits | partitions |
//! |-----------|-------------|------------|
//! | `2,2,1,1` | 1           | 45         |
//! | `2,2,2,1` | 0           | 105        |
//! | `2,1,1,1` | 2           | 10         |

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, SolveError};
use crate::mask::{TraitMask, FULL_MASK, TRAIT_BITS};

/// Number of card slots a partition fills.
pub const SLOTS: usize = 4;

/// How many 2-bit masks a partition holds; the other slots hold 1-bit masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `2,2,1,1`, around a 1-bit anchor.
    TwoTwoOneOne,
    /// `2,2,2,1`, around an empty anchor.
    TwoTwoTwoOne,
    /// `2,1,1,1`, around a 2-bit anchor.
    TwoOneOneOne,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::TwoTwoOneOne, Shape::TwoTwoTwoOne, Shape::TwoOneOneOne];

    pub const fn pairs(self) -> usize {
        match self {
            Shape::TwoTwoOneOne => 2,
            Shape::TwoTwoTwoOne => 3,
            Shape::TwoOneOneOne => 1,
        }
    }

    pub const fn singles(self) -> usize {
        SLOTS - self.pairs()
    }

    /// Bits the anchor must carry for the shape to cover the universe.
    pub const fn anchor_bits(self) -> u32 {
        TRAIT_BITS - (2 * self.pairs() + self.singles()) as u32
    }

    /// Bit count of the mask in slot `slot`.
    pub const fn width(self, slot: usize) -> u32 {
        if slot < self.pairs() {
            2
        } else {
            1
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Shape::TwoTwoOneOne => "2,2,1,1",
            Shape::TwoTwoTwoOne => "2,2,2,1",
            Shape::TwoOneOneOne => "2,1,1,1",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Four disjoint masks that, with the anchor, cover all seven bits.
pub type Partition = [TraitMask; SLOTS];

/// Every 2-bit mask, in `(i, j)` lexicographic order of its bit positions.
fn pair_masks() -> Vec<TraitMask> {
    let n = TRAIT_BITS as u8;
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| TraitMask::bit(i) | TraitMask::bit(j)))
        .collect()
}

/// Enumerates every partition of `shape` around `anchor`.
pub fn generate(shape: Shape, anchor: TraitMask) -> Result<Vec<Partition>> {
    if anchor.count() != shape.anchor_bits() {
        return Err(SolveError::ShapeMismatch {
            anchor: anchor.bits(),
            bits: anchor.count(),
            shape: shape.name(),
            expected: shape.anchor_bits(),
        });
    }

    let free = anchor.complement();
    let candidates: Vec<TraitMask> = pair_masks()
        .into_iter()
        .filter(|p| !p.intersects(anchor))
        .collect();

    let mut out = Vec::new();
    let mut chosen = Vec::with_capacity(shape.pairs());
    choose_pairs(shape, &candidates, 0, free, &mut chosen, &mut out);
    Ok(out)
}

/// Picks `shape.pairs()` disjoint pair masks in increasing candidate order,
/// then fills the remaining slots with the leftover single bits.
fn choose_pairs(
    shape: Shape,
    candidates: &[TraitMask],
    from: usize,
    remaining: TraitMask,
    chosen: &mut Vec<TraitMask>,
    out: &mut Vec<Partition>,
) {
    if chosen.len() == shape.pairs() {
        if remaining.count() as usize != shape.singles() {
            return;
        }
        let mut partition = [TraitMask::EMPTY; SLOTS];
        partition[..chosen.len()].copy_from_slice(chosen);
        for (slot, position) in (chosen.len()..).zip(remaining.positions()) {
            partition[slot] = TraitMask::bit(position);
        }
        out.push(partition);
        return;
    }
    for (k, &pair) in candidates.iter().enumerate().skip(from) {
        if pair.bits() & remaining.bits() != pair.bits() {
            continue;
        }
        chosen.push(pair);
        let rest = TraitMask::from_bits(remaining.bits() & !pair.bits());
        choose_pairs(shape, candidates, k + 1, rest, chosen, out);
        chosen.pop();
    }
}

/// Checks the partition invariants: widths match the shape, masks are
/// pairwise disjoint, and together with the anchor they cover the universe.
pub fn is_valid(shape: Shape, anchor: TraitMask, partition: &Partition) -> bool {
    let mut seen = anchor;
    for (slot, &mask) in partition.iter().enumerate() {
        if mask.count() != shape.width(slot) || mask.intersects(seen) {
            return false;
        }
        seen |= mask;
    }
    seen == FULL_MASK
}

/// All partitions for every anchor the solver can ask for.
///
/// Anchors are tiny (one empty mask, seven 1-bit, twenty-one 2-bit), so the
/// whole table is built up front and shared read-only across workers.
#[derive(Debug, Clone)]
pub struct PartitionCache {
    table: HashMap<(Shape, TraitMask), Vec<Partition>>,
}

impl PartitionCache {
    pub fn new() -> Self {
        let mut table = HashMap::new();
        for shape in Shape::ALL {
            for bits in 0..=FULL_MASK.bits() {
                let anchor = TraitMask::from_bits(bits);
                if anchor.count() != shape.anchor_bits() {
                    continue;
                }
                if let Ok(partitions) = generate(shape, anchor) {
                    table.insert((shape, anchor), partitions);
                }
            }
        }
        Self { table }
    }

    /// Partitions of `shape` around `anchor`; empty when the anchor does not fit the shape.
    pub fn get(&self, shape: Shape, anchor: TraitMask) -> &[Partition] {
        self.table
            .get(&(shape, anchor))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for PartitionCache {
    fn default() -> Self {
        Self::new()
    }
}
