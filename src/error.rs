use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort a run. Empty intersections and duplicate quintets are
/// ordinary outcomes and never surface here.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{table} is missing required column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table} row {row}: invalid value `{value}` in column `{column}`")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("trait {trait_id} belongs to category {category}, expected 1..=5")]
    InvalidCategory { trait_id: u32, category: u32 },

    #[error("category {category} has {count} qualifying traits, at most 7 fit in a mask")]
    TooManyTraits { category: u8, count: usize },

    #[error("anchor {anchor:#09b} has {bits} bits, shape {shape} needs {expected}")]
    ShapeMismatch {
        anchor: u8,
        bits: u32,
        shape: &'static str,
        expected: u32,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("chunked index in {} is invalid: {reason}", dir.display())]
    InvalidChunks { dir: PathBuf, reason: String },

    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SolveError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| SolveError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, SolveError>;
