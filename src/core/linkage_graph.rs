//! Linkage graph over contig extremities
//! =====================================
//!
//! Undirected weighted graph whose nodes are contig extremities and whose edges
//! carry an aggregate link count (read-pair evidence). The search engine only
//! reads the graph through the [`LinkageGraph`] trait; [`AdjacencyLinkageGraph`]
//! is the sparse adjacency-map implementation used by the pipeline and tests.

use crate::core::extremity::{ContigId, Extremity};
use crate::utils::configuration::ScaffoldError;
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Read-only view of a linkage graph
pub trait LinkageGraph {
    /// All extremities directly linked to `node` (sibling included)
    fn neighbors(&self, node: Extremity) -> impl Iterator<Item = Extremity> + '_;

    /// Link count of the edge between two adjacent extremities
    fn weight(&self, a: Extremity, b: Extremity) -> Result<f64, ScaffoldError>;

    /// Stored length of a contig, `None` when unknown
    fn contig_length(&self, contig: ContigId) -> Option<u64>;
}

/// Adjacency-map linkage graph: extremity -> (extremity -> link count)
///
/// Inner maps are ordered so neighbour iteration is deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyLinkageGraph {
    adjacency: AHashMap<Extremity, BTreeMap<Extremity, f64>>,
    lengths: AHashMap<ContigId, u64>,
    edge_count: usize,
}

impl AdjacencyLinkageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contig: both extremities plus the zero-weight sibling edge.
    /// Re-registering keeps existing links and only updates the length.
    pub fn add_contig(&mut self, contig: impl Into<ContigId>, length: Option<u64>) {
        let contig = contig.into();
        self.ensure_contig(contig);
        if let Some(length) = length {
            self.lengths.insert(contig, length);
        }
    }

    pub fn set_contig_length(&mut self, contig: impl Into<ContigId>, length: u64) {
        self.lengths.insert(contig.into(), length);
    }

    /// Add linking evidence between two extremities.
    ///
    /// Counts accumulate onto the single edge of the pair. Both contigs are
    /// registered on the fly so the sibling-edge invariant always holds.
    pub fn add_link(
        &mut self,
        a: Extremity,
        b: Extremity,
        link_count: f64,
    ) -> Result<(), ScaffoldError> {
        if a == b {
            return Err(ScaffoldError::InvalidLink {
                from: a,
                to: b,
                reason: "self-links are not allowed".to_string(),
            });
        }
        if !link_count.is_finite() || link_count < 0.0 {
            return Err(ScaffoldError::InvalidLink {
                from: a,
                to: b,
                reason: format!("link count must be non-negative, got {link_count}"),
            });
        }

        self.ensure_contig(a.contig);
        self.ensure_contig(b.contig);
        self.bump(a, b, link_count);
        Ok(())
    }

    fn ensure_contig(&mut self, contig: ContigId) {
        let left = Extremity::left(contig);
        let right = Extremity::right(contig);
        if !self.has_edge(left, right) {
            self.bump(left, right, 0.0);
        }
    }

    fn bump(&mut self, a: Extremity, b: Extremity, link_count: f64) {
        let forward = self.adjacency.entry(a).or_default();
        let fresh = !forward.contains_key(&b);
        *forward.entry(b).or_insert(0.0) += link_count;
        *self.adjacency.entry(b).or_default().entry(a).or_insert(0.0) += link_count;
        if fresh {
            self.edge_count += 1;
        }
    }

    pub fn has_edge(&self, a: Extremity, b: Extremity) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|links| links.contains_key(&b))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contig_count(&self) -> usize {
        self.adjacency.len() / 2
    }

    /// Sum of all inter-contig link counts
    pub fn total_link_weight(&self) -> f64 {
        let doubled: f64 = self
            .adjacency
            .iter()
            .flat_map(|(node, links)| {
                links
                    .iter()
                    .filter(move |(nbr, _)| !nbr.same_contig(*node))
                    .map(|(_, w)| *w)
            })
            .sum();
        doubled / 2.0
    }
}

impl LinkageGraph for AdjacencyLinkageGraph {
    fn neighbors(&self, node: Extremity) -> impl Iterator<Item = Extremity> + '_ {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|links| links.keys().copied())
    }

    fn weight(&self, a: Extremity, b: Extremity) -> Result<f64, ScaffoldError> {
        self.adjacency
            .get(&a)
            .and_then(|links| links.get(&b))
            .copied()
            .ok_or(ScaffoldError::BrokenPath { from: a, to: b })
    }

    fn contig_length(&self, contig: ContigId) -> Option<u64> {
        self.lengths.get(&contig).copied()
    }
}
