//! Scaffold path search orchestration
//!
//! Provides the two entry points used by the scaffolding pipeline:
//! - Between-scaffold extension: many start extremities, each searched towards
//!   a shared end set, accepted paths pooled and ranked
//! - Within-scaffold closure: a single search between two extremities of the
//!   same scaffold
//!
//! The graph is only ever read. Start/end/visited bookkeeping is owned by the
//! caller and updated in place.

use crate::core::extremity::Extremity;
use crate::core::linkage_graph::LinkageGraph;
use crate::scaffolding::cancellation::CancellationToken;
use crate::scaffolding::path_search::{
    BoundedPathEnumerator, PathEnumeration, PathQuery, SearchLimits, UNBOUNDED_PATH_LENGTH,
};
use crate::scaffolding::scoring::{rank_by_score, AcceptancePolicy, ConnectivityScorer, ScoredPath};
use crate::utils::configuration::{PathSearchConfig, ScaffoldError};
use ahash::AHashSet;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Counters describing one orchestrator call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub start_nodes_tried: usize,
    /// Paths produced by the enumerator before scoring
    pub raw_paths: usize,
    pub accepted_paths: usize,
    /// Enumerations stopped by budget, node cap or cancellation
    pub truncated_searches: usize,
}

impl SearchSummary {
    fn absorb(&mut self, enumeration: &PathEnumeration, accepted: usize) {
        self.start_nodes_tried += 1;
        self.raw_paths += enumeration.paths.len();
        self.accepted_paths += accepted;
        if enumeration.is_truncated() {
            self.truncated_searches += 1;
        }
    }
}

/// Ranked records plus the counters of the call that produced them
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Ascending by score
    pub records: Vec<ScoredPath>,
    pub summary: SearchSummary,
}

pub struct ScaffoldPathSearcher<'g, G> {
    graph: &'g G,
    params: PathSearchConfig,
    cancellation: Option<CancellationToken>,
}

impl<'g, G: LinkageGraph> ScaffoldPathSearcher<'g, G> {
    pub fn new(graph: &'g G, params: PathSearchConfig) -> Self {
        Self {
            graph,
            params,
            cancellation: None,
        }
    }

    /// Abort the whole call once `token` is cancelled; results gathered so far are returned
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn params(&self) -> &PathSearchConfig {
        &self.params
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn enumerator(&self) -> BoundedPathEnumerator<'g, G> {
        let enumerator = BoundedPathEnumerator::new(self.graph);
        match &self.cancellation {
            Some(token) => enumerator.with_cancellation(token.clone()),
            None => enumerator,
        }
    }

    fn extension_budget(&self, end_size: usize) -> usize {
        if self.params.max_extensions > 0 {
            self.params.max_extensions
        } else {
            end_size
        }
    }

    /// Enumerate and score from one start node of a between-scaffold extension
    fn extend_from(
        &self,
        start: Extremity,
        end: &AHashSet<Extremity>,
        already_visited: &AHashSet<Extremity>,
    ) -> Result<(PathEnumeration, Vec<ScoredPath>), ScaffoldError> {
        let forbidden = PathQuery::forbidden_for(start, None);
        let query = PathQuery {
            start,
            end,
            forbidden: &forbidden,
            already_visited,
            limits: SearchLimits::new(self.params.path_threshold, UNBOUNDED_PATH_LENGTH),
        };
        let enumeration = self.enumerator().enumerate(&query);

        let policy = AcceptancePolicy::from(&self.params);
        let accepted: Vec<ScoredPath> = ConnectivityScorer::new(self.graph)
            .score_candidates(&enumeration.paths)?
            .into_iter()
            .filter(|record| policy.accepts(record))
            .collect();

        debug!(
            "start {}: {} steps, {} paths, {} accepted",
            start,
            enumeration.steps,
            enumeration.paths.len(),
            accepted.len()
        );
        if let Some(reason) = enumeration.stop_reason {
            warn!(
                "⚠️  Path search from {} stopped early ({}) after {} steps",
                start, reason, enumeration.steps
            );
        }

        Ok((enumeration, accepted))
    }

    /// Extend scaffolds by searching from each node of `iter_nodes` towards `end`.
    ///
    /// Start nodes are popped from the back of `iter_nodes`. Each start is
    /// removed from `end` before its search and added to `already_visited`
    /// after it, also when its search fails. At most `max_extensions` starts
    /// are tried, or the original size of `end` when `max_extensions` is 0.
    pub fn extend_between_scaffolds(
        &self,
        end: &mut AHashSet<Extremity>,
        iter_nodes: &mut Vec<Extremity>,
        already_visited: &mut AHashSet<Extremity>,
    ) -> Result<SearchOutcome, ScaffoldError> {
        let budget = self.extension_budget(end.len());
        let mut outcome = SearchOutcome::default();

        while outcome.summary.start_nodes_tried < budget {
            if self.is_cancelled() {
                warn!("⏹️  Between-scaffold extension cancelled");
                break;
            }
            let Some(start) = iter_nodes.pop() else {
                break;
            };

            end.remove(&start);
            let searched = self.extend_from(start, end, already_visited);
            already_visited.insert(start);
            let (enumeration, accepted) = searched?;

            outcome.summary.absorb(&enumeration, accepted.len());
            outcome.records.extend(accepted);
        }

        rank_by_score(&mut outcome.records);
        info!(
            "🔗 Between-scaffold extension: {} start nodes, {} raw paths, {} accepted",
            outcome.summary.start_nodes_tried,
            outcome.summary.raw_paths,
            outcome.summary.accepted_paths
        );
        Ok(outcome)
    }

    /// Close a gap inside one scaffold by searching from `start` to `end_node`.
    ///
    /// `start` and `end_node` are lifted out of `already_visited` for the
    /// duration of the search. Each is put back afterwards only if it was in
    /// `already_visited` before the call; an endpoint the caller had not
    /// marked stays unmarked. Fewer than two raw paths give an empty result.
    pub fn close_within_scaffold(
        &self,
        start: Extremity,
        end_node: Extremity,
        already_visited: &mut AHashSet<Extremity>,
        max_path_length: u64,
    ) -> Result<SearchOutcome, ScaffoldError> {
        let had_start = already_visited.remove(&start);
        let had_end = already_visited.remove(&end_node);

        let end: AHashSet<Extremity> = std::iter::once(end_node).collect();
        let forbidden = PathQuery::forbidden_for(start, Some(end_node));
        let query = PathQuery {
            start,
            end: &end,
            forbidden: &forbidden,
            already_visited,
            limits: SearchLimits::new(self.params.path_threshold, max_path_length),
        };
        let enumeration = self.enumerator().enumerate(&query);

        if had_start {
            already_visited.insert(start);
        }
        if had_end {
            already_visited.insert(end_node);
        }

        if let Some(reason) = enumeration.stop_reason {
            warn!(
                "⚠️  Closure search {} -> {} stopped early ({})",
                start, end_node, reason
            );
        }

        let mut outcome = SearchOutcome::default();
        // A lone candidate gives nothing to compare against
        if enumeration.paths.len() > 1 {
            outcome.records = ConnectivityScorer::new(self.graph).score_candidates(&enumeration.paths)?;
            rank_by_score(&mut outcome.records);
        }
        outcome.summary.absorb(&enumeration, outcome.records.len());

        debug!(
            "closure {} -> {}: {} raw paths, {} kept",
            start,
            end_node,
            enumeration.paths.len(),
            outcome.records.len()
        );
        Ok(outcome)
    }
}

impl<'g, G: LinkageGraph + Sync> ScaffoldPathSearcher<'g, G> {
    /// Parallel between-scaffold extension on a pool of `num_threads` workers.
    ///
    /// Start nodes are claimed in the order the sequential version pops them,
    /// against one shared budget. The start at claim index `k` searches with
    /// `already_visited` plus the `k` earlier starts and with `end` minus
    /// itself and those earlier starts, which is exactly the state the
    /// sequential loop would hand it. Records, summary and the caller's sets
    /// therefore come out identical to [`Self::extend_between_scaffolds`].
    ///
    /// On error every start claimed so far counts as tried.
    pub fn extend_between_scaffolds_parallel(
        &self,
        end: &mut AHashSet<Extremity>,
        iter_nodes: &mut Vec<Extremity>,
        already_visited: &mut AHashSet<Extremity>,
        num_threads: usize,
    ) -> Result<SearchOutcome, ScaffoldError> {
        let budget = self.extension_budget(end.len()).min(iter_nodes.len());
        let order: Vec<Extremity> = iter_nodes.iter().rev().take(budget).copied().collect();
        let workers = num_threads.max(1);

        let per_start = Mutex::new(Vec::with_capacity(order.len()));
        let summary = Mutex::new(SearchSummary::default());
        let next_start = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

        let initial_end: &AHashSet<Extremity> = end;
        let initial_visited: &AHashSet<Extremity> = already_visited;
        let result: Result<(), ScaffoldError> = pool.install(|| {
            (0..workers).into_par_iter().try_for_each(|_| -> Result<(), ScaffoldError> {
                loop {
                    if self.is_cancelled() || failed.load(Ordering::SeqCst) {
                        return Ok(());
                    }
                    let idx = next_start.fetch_add(1, Ordering::SeqCst);
                    let Some(&start) = order.get(idx) else {
                        return Ok(());
                    };

                    let (end_view, visited_view) =
                        claim_view(&order, idx, initial_end, initial_visited);
                    let (enumeration, accepted) = self
                        .extend_from(start, &end_view, &visited_view)
                        .inspect_err(|_| failed.store(true, Ordering::SeqCst))?;

                    summary.lock().absorb(&enumeration, accepted.len());
                    per_start.lock().push((idx, accepted));
                }
            })
        });

        let claimed = next_start.load(Ordering::SeqCst).min(order.len());
        for &start in &order[..claimed] {
            end.remove(&start);
            already_visited.insert(start);
        }
        iter_nodes.truncate(iter_nodes.len() - claimed);
        result?;

        // Concatenate in claim order, then the same stable sort as the sequential call
        let mut per_start = per_start.into_inner();
        per_start.sort_by_key(|(idx, _)| *idx);
        let mut records: Vec<ScoredPath> = per_start
            .into_iter()
            .flat_map(|(_, accepted)| accepted)
            .collect();
        rank_by_score(&mut records);
        let summary = summary.into_inner();

        info!(
            "🔗 Parallel between-scaffold extension ({} threads): {} start nodes, {} raw paths, {} accepted",
            workers,
            summary.start_nodes_tried,
            summary.raw_paths,
            summary.accepted_paths
        );
        Ok(SearchOutcome { records, summary })
    }
}

/// End set and visited set seen by the start at claim index `idx`
fn claim_view(
    order: &[Extremity],
    idx: usize,
    initial_end: &AHashSet<Extremity>,
    initial_visited: &AHashSet<Extremity>,
) -> (AHashSet<Extremity>, AHashSet<Extremity>) {
    let mut end = initial_end.clone();
    for start in &order[..=idx] {
        end.remove(start);
    }
    let mut visited = initial_visited.clone();
    visited.extend(order[..idx].iter().copied());
    (end, visited)
}
