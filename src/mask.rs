//! Seven-bit trait masks.
//!
//! Every category owns at most seven traits, so the traits a card grants in
//! one category fit in the low seven bits of a byte. Bit `i` is set when the
//! card grants the trait encoded at position `i`.

use std::fmt;

/// Number of trait positions in a category.
pub const TRAIT_BITS: u32 = 7;

/// The full seven-bit universe (`0b111_1111`).
pub const FULL_MASK: TraitMask = TraitMask(0x7f);

/// A set of trait positions within one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraitMask(u8);

impl TraitMask {
    pub const EMPTY: TraitMask = TraitMask(0);

    /// Builds a mask from raw bits, dropping anything above bit 6.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7f)
    }

    /// Mask with only `position` set.
    pub const fn bit(position: u8) -> Self {
        Self::from_bits(1 << position)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: TraitMask) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: TraitMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Positions of the universe not present in `self`.
    pub const fn complement(self) -> Self {
        Self(!self.0 & FULL_MASK.0)
    }

    /// Set positions in ascending order.
    pub fn positions(self) -> impl Iterator<Item = u8> {
        (0..TRAIT_BITS as u8).filter(move |&p| self.0 & (1 << p) != 0)
    }
}

impl std::ops::BitOr for TraitMask {
    type Output = TraitMask;

    fn bitor(self, rhs: TraitMask) -> TraitMask {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TraitMask {
    fn bitor_assign(&mut self, rhs: TraitMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TraitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:07b}", self.0)
    }
}
