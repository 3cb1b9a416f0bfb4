//! Precomputes every five-card solution of the trait-coverage puzzle.
//!
//! A puzzle names two traits from two categories. Five cards solve it when one
//! of them (the anchor) holds both traits and the other four together cover
//! every trait of both categories exactly once. The crate enumerates all such
//! quads per puzzle, deduplicates five-card sets across puzzles, and writes
//! the result as a JSON index with optional chunking.
//!
//! ```no_run
//! use shoot300k::{run, SolveConfig};
//!
//! let config = SolveConfig::load("solver.toml")?;
//! let summary = run(&config, |_| {})?;
//! println!("{} records", summary.records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assemble;
pub mod config;
pub mod dedup;
pub mod encoder;
pub mod error;
pub mod index;
pub mod mask;
pub mod output;
pub mod partition;
pub mod record;
pub mod solver;
pub mod tables;
pub mod template;

use tracing::info;

pub use config::{Chunking, ConfigError, DatasetConfig, InputPaths, OutputConfig, SolveConfig};
pub use error::{Result, SolveError};
pub use mask::{TraitMask, FULL_MASK};
pub use output::{ChunkMetadata, WriteSummary};
pub use record::{CategoryPair, PublicRecord, SolutionIndex, SolutionRecord, TraitPair};
pub use solver::{Progress, Solver};
pub use tables::{CardId, Tables, TraitId};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub quintets: usize,
    pub output: WriteSummary,
}

impl RunSummary {
    pub fn chunks(&self) -> usize {
        self.output.chunks.as_ref().map_or(0, |m| m.total_chunks)
    }
}

/// Loads the tables and builds the solver. All input validation happens here.
pub fn prepare(config: &SolveConfig) -> Result<Solver> {
    config.validate()?;
    let tables = Tables::load(&config.inputs)?;
    info!(
        event = "tables_loaded",
        cards = tables.cards.len(),
        traits = tables.traits.len(),
        mappings = tables.base_mapping.len() + tables.grow_mapping.len()
    );
    Solver::build(&tables, &config.dataset)
}

/// Solves with `solver` on the configured pool and writes every output.
pub fn solve_and_write<F>(solver: &Solver, config: &SolveConfig, progress: F) -> Result<RunSummary>
where
    F: Fn(Progress) + Sync + Send,
{
    let index = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(|| solver.solve_with_progress(&progress)),
        None => solver.solve_with_progress(&progress),
    };
    let output = output::write_outputs(&index, &config.output)?;
    Ok(RunSummary {
        records: index.len(),
        quintets: index.quintet_count(),
        output,
    })
}

/// A complete run: load, solve, write.
pub fn run<F>(config: &SolveConfig, progress: F) -> Result<RunSummary>
where
    F: Fn(Progress) + Sync + Send,
{
    let solver = prepare(config)?;
    solve_and_write(&solver, config, progress)
}
