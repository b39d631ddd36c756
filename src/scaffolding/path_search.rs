//! Bounded Path Enumeration
//! ========================
//!
//! Enumerates simple paths through the linkage graph from a start extremity to
//! any extremity of an end set. Paths alternate strictly between crossing a
//! contig (sibling step) and jumping to another contig (link step).
//!
//! The search is an explicit stack of frames rather than recursion. It is
//! bounded by a step budget, a path length ceiling and a hard node cap; hitting
//! the step budget or the node cap stops the whole enumeration and returns the
//! paths completed so far.

use crate::core::extremity::Extremity;
use crate::core::linkage_graph::LinkageGraph;
use crate::scaffolding::cancellation::CancellationToken;
use ahash::AHashSet;
use std::fmt;

/// Hard cap on path nodes, independent of caller limits
pub const MAX_PATH_NODES: usize = 100;

/// Path length ceiling meaning "no ceiling"
pub const UNBOUNDED_PATH_LENGTH: u64 = u64::MAX;

/// A completed path with its accumulated length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    pub path: Vec<Extremity>,
    pub path_len: u64,
}

/// Why an enumeration ended before exhausting the search space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// More than `path_threshold` frames would have been processed
    StepBudget,
    /// A frame carried a path longer than [`MAX_PATH_NODES`]
    PathCap,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::StepBudget => write!(f, "step budget exhausted"),
            StopReason::PathCap => write!(f, "path node cap reached"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
    Continue,
    StopAll(StopReason),
}

/// Limits applied to one enumeration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of frames processed
    pub path_threshold: usize,
    /// Paths whose length exceeds this are pruned
    pub max_path_length: u64,
}

impl SearchLimits {
    pub fn new(path_threshold: usize, max_path_length: u64) -> Self {
        Self {
            path_threshold,
            max_path_length,
        }
    }

    pub fn unbounded_length(path_threshold: usize) -> Self {
        Self::new(path_threshold, UNBOUNDED_PATH_LENGTH)
    }
}

/// Result of one enumeration call
#[derive(Debug, Clone, Default)]
pub struct PathEnumeration {
    pub paths: Vec<CandidatePath>,
    /// Frames processed
    pub steps: usize,
    /// `None` when the search space was exhausted
    pub stop_reason: Option<StopReason>,
}

impl PathEnumeration {
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.is_some()
    }
}

/// How much a node adds to the path length when it is appended
#[derive(Debug, Clone, Copy)]
enum LengthStep {
    Unit,
    Contig(u64),
}

impl LengthStep {
    fn amount(self) -> u64 {
        match self {
            LengthStep::Unit => 1,
            LengthStep::Contig(length) => length,
        }
    }
}

struct Frame {
    node: Extremity,
    path: Vec<Extremity>,
    path_len: u64,
    step: LengthStep,
}

/// Constraints of one enumeration call
pub struct PathQuery<'a> {
    pub start: Extremity,
    pub end: &'a AHashSet<Extremity>,
    pub forbidden: &'a AHashSet<Extremity>,
    pub already_visited: &'a AHashSet<Extremity>,
    pub limits: SearchLimits,
}

impl<'a> PathQuery<'a> {
    /// Extremities that may never be entered: the start's sibling, plus the
    /// sibling of `closing_end` when closing a gap inside one scaffold.
    pub fn forbidden_for(start: Extremity, closing_end: Option<Extremity>) -> AHashSet<Extremity> {
        let mut forbidden = AHashSet::with_capacity(2);
        forbidden.insert(start.sibling());
        if let Some(end) = closing_end {
            forbidden.insert(end.sibling());
        }
        forbidden
    }
}

/// Stack-driven enumerator of simple alternating paths
pub struct BoundedPathEnumerator<'g, G> {
    graph: &'g G,
    cancellation: Option<CancellationToken>,
}

impl<'g, G: LinkageGraph> BoundedPathEnumerator<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self {
            graph,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn enumerate(&self, query: &PathQuery<'_>) -> PathEnumeration {
        let mut outcome = PathEnumeration::default();
        let mut stack = vec![Frame {
            node: query.start,
            path: Vec::new(),
            path_len: 0,
            step: LengthStep::Unit,
        }];

        while let Some(frame) = stack.pop() {
            match self.step(query, frame, &mut stack, &mut outcome) {
                StepControl::Continue => {}
                StepControl::StopAll(reason) => {
                    outcome.stop_reason = Some(reason);
                    break;
                }
            }
        }

        outcome
    }

    fn step(
        &self,
        query: &PathQuery<'_>,
        frame: Frame,
        stack: &mut Vec<Frame>,
        outcome: &mut PathEnumeration,
    ) -> StepControl {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return StepControl::StopAll(StopReason::Cancelled);
        }
        if outcome.steps + 1 > query.limits.path_threshold {
            return StepControl::StopAll(StopReason::StepBudget);
        }
        if frame.path.len() > MAX_PATH_NODES {
            return StepControl::StopAll(StopReason::PathCap);
        }
        outcome.steps += 1;

        let Frame {
            node,
            mut path,
            path_len,
            step,
        } = frame;

        let prev_node = path.last().copied().unwrap_or(query.start);
        path.push(node);
        let path_len = path_len.saturating_add(step.amount());

        if path_len > query.limits.max_path_length {
            return StepControl::Continue;
        }
        if query.already_visited.contains(&node) || query.forbidden.contains(&node) {
            return StepControl::Continue;
        }
        if query.end.contains(&node) {
            outcome.paths.push(CandidatePath { path, path_len });
            return StepControl::Continue;
        }

        if !node.same_contig(prev_node) {
            // Landed on a new contig: the only way on is across it
            let sibling = node.sibling();
            if !query.forbidden.contains(&sibling) && !path.contains(&sibling) {
                stack.push(Frame {
                    node: sibling,
                    path,
                    path_len,
                    step: LengthStep::Unit,
                });
            }
            return StepControl::Continue;
        }

        for nbr in self.graph.neighbors(node) {
            if path.contains(&nbr) || query.forbidden.contains(&nbr) {
                continue;
            }
            let step = match self.graph.contig_length(nbr.contig) {
                Some(length) => LengthStep::Contig(length),
                None => LengthStep::Unit,
            };
            stack.push(Frame {
                node: nbr,
                path: path.clone(),
                path_len,
                step,
            });
        }

        StepControl::Continue
    }
}
