//! Run configuration.
//!
//! A run needs the four input tables, the dataset exceptions that decide which
//! cards take part, and the output policy. Configuration arrives either as a
//! TOML file or as JSON on the solver binary's stdin.
//!
//! ```
//! use shoot300k::config::{Chunking, SolveConfig};
//!
//! let config = SolveConfig::from_toml_str(r#"
//!     [inputs]
//!     cards = "data/character_card.csv"
//!     traits = "data/characteristics_normal.csv"
//!     base_mapping = "data/card_give_characteristic.csv"
//!     grow_mapping = "data/card_give_characteristic_grow_list.csv"
//!
//!     [output]
//!     dir = "solutions"
//!     chunking = "always"
//!     chunk_size = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.output.chunking, Chunking::Always);
//! assert_eq!(config.dataset.excluded_cards, vec![133, 134]);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tables::CardId;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything one solver run needs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolveConfig {
    pub inputs: InputPaths,

    #[serde(default)]
    pub dataset: DatasetConfig,

    pub output: OutputConfig,

    /// Worker threads for the context fan-out. `None` uses rayon's global pool.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl SolveConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SolveConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: SolveConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".into()));
        }
        if self.dataset.eligible_rarities.is_empty() {
            return Err(ConfigError::Invalid(
                "eligible_rarities must name at least one rarity".into(),
            ));
        }
        if self.dataset.qualifying_tier == 0 {
            return Err(ConfigError::Invalid("qualifying_tier must be positive".into()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be positive".into()));
        }
        Ok(())
    }
}

/// Paths of the four flat input tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputPaths {
    /// Card table: `id`, `rarity`.
    pub cards: PathBuf,
    /// Trait table: `id`, `color`, `rarity` (tier marker).
    pub traits: PathBuf,
    /// Traits granted when a card is acquired: `card_id`, `characteristic_id`.
    pub base_mapping: PathBuf,
    /// Traits unlocked by leveling: `card_id`, `characteristic_id`.
    pub grow_mapping: PathBuf,
}

/// Dataset exceptions. These describe quirks of one card pool, so they live
/// in versioned configuration instead of code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Tier marker of the traits the puzzle uses ("silver").
    pub qualifying_tier: u8,
    pub eligible_rarities: Vec<u8>,
    /// Cards dropped after the rarity filter.
    pub excluded_cards: Vec<CardId>,
    /// Rarity corrections applied before the rarity filter.
    pub rarity_overrides: Vec<RarityOverride>,
}

impl DatasetConfig {
    pub fn rarity_override_map(&self) -> BTreeMap<CardId, u8> {
        self.rarity_overrides
            .iter()
            .map(|o| (o.card, o.rarity))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RarityOverride {
    pub card: CardId,
    pub rarity: u8,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            qualifying_tier: 3,
            eligible_rarities: vec![3, 4],
            // SR 133 and 134 each grant a single silver trait.
            excluded_cards: vec![133, 134],
            rarity_overrides: Vec::new(),
        }
    }
}

/// When to split the index into chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chunking {
    Off,
    Always,
    /// Chunk only when the index holds more than `chunk_size` records.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub dir: PathBuf,

    #[serde(default = "default_full_index")]
    pub full_index: bool,

    #[serde(default)]
    pub chunking: Chunking,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// SQLite database that also receives every record.
    #[serde(default)]
    pub sqlite: Option<PathBuf>,
}

impl OutputConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            full_index: default_full_index(),
            chunking: Chunking::default(),
            chunk_size: default_chunk_size(),
            sqlite: None,
        }
    }

    /// Whether an index of `total_items` records is written in chunks.
    pub fn wants_chunks(&self, total_items: usize) -> bool {
        match self.chunking {
            Chunking::Off => false,
            Chunking::Always => true,
            Chunking::Auto => total_items > self.chunk_size,
        }
    }
}

fn default_full_index() -> bool {
    true
}

fn default_chunk_size() -> usize {
    10_000
}
