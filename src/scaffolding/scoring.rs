//! Connectivity scoring of candidate scaffold paths
//!
//! A path alternates between exit extremities (where it leaves a contig) and
//! entry extremities (where it lands on the next contig). Link evidence that
//! joins an exit node to its path successor supports the path; every other
//! inter-contig link touching a path node contradicts it. The score is the
//! ratio of supporting to contradicting link weight.

use crate::core::extremity::{ContigId, Extremity};
use crate::core::linkage_graph::LinkageGraph;
use crate::scaffolding::path_search::CandidatePath;
use crate::utils::configuration::{PathSearchConfig, ScaffoldError};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Link weight accumulated around one contig
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkWeightBucket {
    pub good: f64,
    pub bad: f64,
}

/// Full result of scoring one path
#[derive(Debug, Clone, Default)]
pub struct ConnectivityReport {
    pub score: f64,
    pub good_link_weight: f64,
    pub bad_link_weight: f64,
    /// Per-contig bookkeeping of good and bad link weight
    pub buckets: AHashMap<ContigId, LinkWeightBucket>,
}

impl ConnectivityReport {
    pub fn bucket(&self, contig: ContigId) -> LinkWeightBucket {
        self.buckets.get(&contig).copied().unwrap_or_default()
    }
}

/// Scored path record, the unit of output of the search engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPath {
    pub score: f64,
    pub bad_link_weight: f64,
    pub path: Vec<Extremity>,
    pub path_len: u64,
}

impl ScoredPath {
    pub fn start(&self) -> Option<Extremity> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<Extremity> {
        self.path.last().copied()
    }

    pub fn node_count(&self) -> usize {
        self.path.len()
    }

    /// Start and end are directly linked with nothing in between
    pub fn is_direct(&self) -> bool {
        self.path.len() <= 2
    }

    /// Contigs in traversal order, each listed once
    pub fn contig_order(&self) -> Vec<ContigId> {
        let mut order: Vec<ContigId> = Vec::with_capacity(self.path.len() / 2 + 1);
        for node in &self.path {
            if order.last() != Some(&node.contig) {
                order.push(node.contig);
            }
        }
        order
    }
}

/// Keep/reject rule applied after scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptancePolicy {
    pub score_cutoff: f64,
    pub no_score: bool,
}

impl AcceptancePolicy {
    pub fn new(score_cutoff: f64, no_score: bool) -> Self {
        Self {
            score_cutoff,
            no_score,
        }
    }

    pub fn accepts(&self, record: &ScoredPath) -> bool {
        record.score >= self.score_cutoff && (self.no_score || record.path.len() > 2)
    }
}

impl From<&PathSearchConfig> for AcceptancePolicy {
    fn from(config: &PathSearchConfig) -> Self {
        Self::new(config.score_cutoff, config.no_score)
    }
}

/// Sort records ascending by score. Ties keep their relative order.
pub fn rank_by_score(records: &mut [ScoredPath]) {
    records.sort_by(|a, b| a.score.total_cmp(&b.score));
}

/// Unordered extremity pair
fn link_key(a: Extremity, b: Extremity) -> (Extremity, Extremity) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct ConnectivityScorer<'g, G> {
    graph: &'g G,
}

impl<'g, G: LinkageGraph> ConnectivityScorer<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    /// `(score, bad_link_weight)` of a path
    pub fn score_path(&self, path: &[Extremity]) -> Result<(f64, f64), ScaffoldError> {
        let report = self.report(path)?;
        Ok((report.score, report.bad_link_weight))
    }

    /// Score every candidate; an empty slice yields an empty vector
    pub fn score_candidates(
        &self,
        candidates: &[CandidatePath],
    ) -> Result<Vec<ScoredPath>, ScaffoldError> {
        candidates
            .iter()
            .map(|candidate| {
                let (score, bad_link_weight) = self.score_path(&candidate.path)?;
                Ok(ScoredPath {
                    score,
                    bad_link_weight,
                    path: candidate.path.clone(),
                    path_len: candidate.path_len,
                })
            })
            .collect()
    }

    /// Classify every inter-contig link touching the path as good or bad.
    ///
    /// Fails with [`ScaffoldError::BrokenPath`] when two consecutive path
    /// nodes are not linked in the graph.
    pub fn report(&self, path: &[Extremity]) -> Result<ConnectivityReport, ScaffoldError> {
        let mut report = ConnectivityReport::default();
        let Some(&first) = path.first() else {
            return Ok(report);
        };

        // Entry nodes, in path order; the front is the partner of the next exit node
        let mut partners: VecDeque<Extremity> = path.iter().skip(1).step_by(2).copied().collect();
        let mut good_links: AHashSet<(Extremity, Extremity)> = AHashSet::new();
        let mut bad_links: AHashSet<(Extremity, Extremity)> = AHashSet::new();

        let mut prev_node = first;
        for (idx, &node) in path.iter().enumerate() {
            if idx > 0 {
                self.graph.weight(prev_node, node)?;
            }

            if node.same_contig(prev_node) {
                // Exit node: only the pending partner is a supporting link
                let partner = partners.front().copied();
                for nbr in self.graph.neighbors(node) {
                    if nbr.same_contig(node) {
                        continue;
                    }
                    let link = link_key(node, nbr);
                    let weight = self.graph.weight(node, nbr)?;
                    let bucket = report.buckets.entry(node.contig).or_default();

                    if partner == Some(nbr) {
                        if good_links.insert(link) {
                            report.good_link_weight += weight;
                            bucket.good += weight;
                        }
                    } else if !good_links.contains(&link) && bad_links.insert(link) {
                        report.bad_link_weight += weight;
                        bucket.bad += weight;
                    }
                }
            } else {
                // Entry node: its partner slot is consumed
                if let Some(pos) = partners.iter().position(|p| *p == node) {
                    partners.remove(pos);
                }
                for nbr in self.graph.neighbors(node) {
                    if nbr.same_contig(node) {
                        continue;
                    }
                    let link = link_key(node, nbr);
                    let weight = self.graph.weight(node, nbr)?;
                    let bucket = report.buckets.entry(node.contig).or_default();

                    if good_links.contains(&link) {
                        bucket.good += weight;
                    } else if bad_links.insert(link) {
                        report.bad_link_weight += weight;
                        bucket.bad += weight;
                    }
                }
            }

            prev_node = node;
        }

        report.score = if report.bad_link_weight != 0.0 {
            report.good_link_weight / report.bad_link_weight
        } else {
            report.good_link_weight
        };

        Ok(report)
    }
}
