//! Solution records and the keys they are filed under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assemble::Quad;
use crate::encoder::Category;
use crate::tables::{CardId, TraitId};

/// Two distinct categories, `first < second`. Written `"1,2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryPair {
    pub first: Category,
    pub second: Category,
}

impl CategoryPair {
    pub fn new(first: Category, second: Category) -> Option<Self> {
        (first < second).then_some(Self { first, second })
    }

    /// The ten pairs, lexicographic.
    pub fn all() -> Vec<CategoryPair> {
        Category::all()
            .flat_map(|a| Category::all().filter_map(move |b| CategoryPair::new(a, b)))
            .collect()
    }
}

impl fmt::Display for CategoryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

impl FromStr for CategoryPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = split_pair(s)?;
        let cat = |n: u32| Category::new(n).ok_or_else(|| format!("no category {n}"));
        CategoryPair::new(cat(a)?, cat(b)?).ok_or_else(|| format!("unordered category pair `{s}`"))
    }
}

/// The two traits a puzzle is asked about. Written `"<id>,<id>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraitPair {
    pub first: TraitId,
    pub second: TraitId,
}

impl fmt::Display for TraitPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

impl FromStr for TraitPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, second) = split_pair(s)?;
        Ok(TraitPair { first, second })
    }
}

fn split_pair(s: &str) -> Result<(u32, u32), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `a,b`, got `{s}`"))?;
    let num = |x: &str| {
        x.trim()
            .parse::<u32>()
            .map_err(|e| format!("bad number `{x}`: {e}"))
    };
    Ok((num(a)?, num(b)?))
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(CategoryPair);
string_serde!(TraitPair);

/// One entry of the full solution index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub quad: Quad,
    /// Anchor cards that complete `quad` into a quintet not emitted earlier.
    pub anchors: Vec<CardId>,
    pub category_pair: CategoryPair,
    pub trait_pair: TraitPair,
}

impl SolutionRecord {
    pub fn public(&self) -> PublicRecord {
        PublicRecord {
            quad: self.quad,
            anchors: self.anchors.clone(),
            category_pair: self.category_pair,
        }
    }
}

/// The chunked form of a record, without the trait pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRecord {
    pub quad: Quad,
    pub anchors: Vec<CardId>,
    pub category_pair: CategoryPair,
}

/// Records in emission order; a record's key is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionIndex {
    pub records: Vec<SolutionRecord>,
}

impl SolutionIndex {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(key, record)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &SolutionRecord)> {
        (0u64..).zip(self.records.iter())
    }

    /// Total quintets, counting each surviving anchor of each record.
    pub fn quintet_count(&self) -> usize {
        self.records.iter().map(|r| r.anchors.len()).sum()
    }
}
