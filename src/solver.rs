//! Search driver.
//!
//! The search splits into independent contexts, one per (category pair, trait
//! pair). Contexts only read the card index and the partition cache, so they
//! run in parallel; their results are then merged in context order through
//! the quintet ledger, which keeps the output identical for any thread count.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::assemble::{Quad, QuadAssembler};
use crate::config::DatasetConfig;
use crate::dedup::QuintetLedger;
use crate::encoder::TraitEncoder;
use crate::error::Result;
use crate::index::{intersect_sorted, CardIndex};
use crate::mask::TraitMask;
use crate::partition::PartitionCache;
use crate::record::{CategoryPair, SolutionIndex, SolutionRecord, TraitPair};
use crate::tables::{CardId, Tables, TraitId};
use crate::template::TemplateKind;

/// One puzzle query: a category pair, a trait pair, and the anchor masks the
/// trait pair pins down in each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub pair: CategoryPair,
    pub kind: TemplateKind,
    pub traits: TraitPair,
    pub first_anchor: TraitMask,
    pub second_anchor: TraitMask,
}

/// What one context produced before global deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSolution {
    pub context: Context,
    /// Cards holding both traits of the pair, ascending.
    pub anchors: Vec<CardId>,
    pub quads: Vec<Quad>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Encoder, card index and partition cache, built once and read-only after.
#[derive(Debug, Clone)]
pub struct Solver {
    encoder: TraitEncoder,
    index: CardIndex,
    cache: PartitionCache,
}

impl Solver {
    pub fn new(encoder: TraitEncoder, index: CardIndex) -> Self {
        Self {
            encoder,
            index,
            cache: PartitionCache::new(),
        }
    }

    /// Encodes traits and indexes cards. Fails before any search on a bad trait table.
    pub fn build(tables: &Tables, dataset: &DatasetConfig) -> Result<Self> {
        let encoder = TraitEncoder::build(&tables.traits, dataset.qualifying_tier)?;
        let index = CardIndex::build(tables, &encoder, dataset);
        info!(
            event = "index_built",
            traits = encoder.len(),
            cards = index.card_count()
        );
        Ok(Self::new(encoder, index))
    }

    /// Every context, in output order: per category pair, cross trait pairs
    /// first, then pairs inside the first category, then inside the second.
    pub fn contexts(&self) -> Vec<Context> {
        let mut out = Vec::new();
        for pair in CategoryPair::all() {
            let first = self.encoder.traits(pair.first);
            let second = self.encoder.traits(pair.second);

            for (i, &a) in first.iter().enumerate() {
                for (j, &b) in second.iter().enumerate() {
                    out.push(Context {
                        pair,
                        kind: TemplateKind::Cross,
                        traits: TraitPair { first: a, second: b },
                        first_anchor: TraitMask::bit(i as u8),
                        second_anchor: TraitMask::bit(j as u8),
                    });
                }
            }
            for (t1, t2, anchor) in same_category_pairs(first) {
                out.push(Context {
                    pair,
                    kind: TemplateKind::FirstHeavy,
                    traits: TraitPair { first: t1, second: t2 },
                    first_anchor: anchor,
                    second_anchor: TraitMask::EMPTY,
                });
            }
            for (t1, t2, anchor) in same_category_pairs(second) {
                out.push(Context {
                    pair,
                    kind: TemplateKind::SecondHeavy,
                    traits: TraitPair { first: t1, second: t2 },
                    first_anchor: TraitMask::EMPTY,
                    second_anchor: anchor,
                });
            }
        }
        out
    }

    /// Cards holding both traits of the context's pair.
    pub fn anchor_candidates(&self, context: &Context) -> Vec<CardId> {
        intersect_sorted(
            self.index.holders(context.traits.first),
            self.index.holders(context.traits.second),
        )
    }

    /// Solves one context. `None` when no card holds both traits or no
    /// template resolves to cards.
    pub fn solve_context(&self, context: &Context) -> Option<ContextSolution> {
        let anchors = self.anchor_candidates(context);
        if anchors.is_empty() {
            return None;
        }

        let assembler = QuadAssembler::new(&self.index, context.pair.first, context.pair.second);
        let mut quads = Vec::new();
        let mut templates = 0usize;
        for template in
            context
                .kind
                .templates(&self.cache, context.first_anchor, context.second_anchor)
        {
            templates += 1;
            assembler.assemble(&template, &mut quads);
        }
        debug!(
            pair = %context.pair,
            traits = %context.traits,
            first_title = self.encoder.title(context.traits.first).unwrap_or("-"),
            second_title = self.encoder.title(context.traits.second).unwrap_or("-"),
            kind = context.kind.name(),
            templates,
            quads = quads.len(),
            anchors = anchors.len(),
            "context solved"
        );

        (!quads.is_empty()).then(|| ContextSolution {
            context: *context,
            anchors,
            quads,
        })
    }

    pub fn solve(&self) -> SolutionIndex {
        self.solve_with_progress(|_| {})
    }

    /// Solves all contexts in parallel, calling `progress` from worker
    /// threads as contexts finish, then merges sequentially.
    pub fn solve_with_progress<F>(&self, progress: F) -> SolutionIndex
    where
        F: Fn(Progress) + Sync,
    {
        let contexts = self.contexts();
        let total = contexts.len();
        let done = AtomicUsize::new(0);
        let start = Instant::now();
        info!(event = "solve_start", contexts = total);

        let solved: Vec<ContextSolution> = contexts
            .par_iter()
            .filter_map(|ctx| {
                let result = self.solve_context(ctx);
                let done = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress(Progress { done, total });
                result
            })
            .collect();

        let mut ledger = QuintetLedger::new();
        let index = merge(solved, &mut ledger);
        info!(
            event = "solve_end",
            records = index.len(),
            quintets = ledger.len(),
            duplicates = ledger.absorbed(),
            elapsed_ms = start.elapsed().as_millis() as u64
        );
        index
    }
}

/// Every pair of traits inside one category with its 2-bit anchor.
fn same_category_pairs(traits: &[TraitId]) -> Vec<(TraitId, TraitId, TraitMask)> {
    let mut out = Vec::new();
    for (i, &a) in traits.iter().enumerate() {
        for (j, &b) in traits.iter().enumerate().skip(i + 1) {
            out.push((a, b, TraitMask::bit(i as u8) | TraitMask::bit(j as u8)));
        }
    }
    out
}

/// Folds context results, in order, into the solution index. Quads whose
/// anchors all complete already-emitted quintets are dropped.
pub fn merge(solved: Vec<ContextSolution>, ledger: &mut QuintetLedger) -> SolutionIndex {
    let mut records = Vec::new();
    for solution in solved {
        for quad in &solution.quads {
            let anchors = ledger.admit(quad, &solution.anchors);
            if anchors.is_empty() {
                continue;
            }
            records.push(SolutionRecord {
                quad: *quad,
                anchors,
                category_pair: solution.context.pair,
                trait_pair: solution.context.traits,
            });
        }
    }
    SolutionIndex { records }
}
