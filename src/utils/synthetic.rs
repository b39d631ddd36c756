//! Synthetic linkage graphs
//!
//! Generates a chained scaffold layout with known ground truth: contigs
//! `1..=n` in order, consecutive contigs joined `(i,R)-(i+1,L)`, plus random
//! stray links. Every `anchor_every`-th contig plays the part of a large
//! scaffold whose length is not stored; the rest are small contigs with a
//! stored length.

use crate::core::extremity::{ContigId, Extremity, Side};
use crate::core::linkage_graph::AdjacencyLinkageGraph;
use anyhow::{anyhow, Result};

#[derive(Debug, Clone)]
pub struct SyntheticGraphConfig {
    pub contigs: usize,
    /// Inclusive range of link counts on true adjacencies
    pub chain_links: (u64, u64),
    /// Expected stray links per contig
    pub noise: f64,
    /// Inclusive range of stray link counts
    pub noise_links: (u64, u64),
    pub contig_length: (u64, u64),
    pub anchor_every: usize,
    pub seed: u64,
}

impl Default for SyntheticGraphConfig {
    fn default() -> Self {
        Self {
            contigs: 20,
            chain_links: (5, 20),
            noise: 0.3,
            noise_links: (1, 3),
            contig_length: (200, 2_000),
            anchor_every: 5,
            seed: 42,
        }
    }
}

/// Generated graph plus its ground truth
#[derive(Debug, Clone)]
pub struct SyntheticScaffolding {
    pub graph: AdjacencyLinkageGraph,
    /// True contig order
    pub order: Vec<ContigId>,
    /// Contigs standing in for large scaffolds
    pub anchors: Vec<ContigId>,
}

impl SyntheticScaffolding {
    /// Both extremities of every anchor, in contig order
    pub fn anchor_extremities(&self) -> Vec<Extremity> {
        self.anchors
            .iter()
            .flat_map(|&contig| [Extremity::new(contig, Side::Left), Extremity::new(contig, Side::Right)])
            .collect()
    }

    pub fn is_anchor(&self, contig: ContigId) -> bool {
        self.anchors.contains(&contig)
    }
}

pub struct SyntheticGraphBuilder {
    config: SyntheticGraphConfig,
}

impl SyntheticGraphBuilder {
    pub fn new(config: SyntheticGraphConfig) -> Result<Self> {
        if config.contigs < 2 {
            return Err(anyhow!("Need at least 2 contigs, got {}", config.contigs));
        }
        if config.anchor_every == 0 {
            return Err(anyhow!("anchor_every must be at least 1"));
        }
        if config.chain_links.0 > config.chain_links.1
            || config.noise_links.0 > config.noise_links.1
            || config.contig_length.0 > config.contig_length.1
        {
            return Err(anyhow!("Ranges must be given as (min, max)"));
        }
        if !config.noise.is_finite() || config.noise < 0.0 {
            return Err(anyhow!("Noise must be non-negative, got {}", config.noise));
        }
        Ok(Self { config })
    }

    pub fn build(&self) -> Result<SyntheticScaffolding> {
        let config = &self.config;
        let mut rng = fastrand::Rng::with_seed(config.seed);
        let mut graph = AdjacencyLinkageGraph::new();

        let order: Vec<ContigId> = (1..=config.contigs as u64).map(ContigId).collect();
        let anchors: Vec<ContigId> = order
            .iter()
            .enumerate()
            .filter(|(idx, _)| idx % config.anchor_every == 0)
            .map(|(_, &contig)| contig)
            .collect();

        for (idx, &contig) in order.iter().enumerate() {
            let length = if idx % config.anchor_every == 0 {
                None
            } else {
                Some(rng.u64(config.contig_length.0..=config.contig_length.1))
            };
            graph.add_contig(contig, length);
        }

        for pair in order.windows(2) {
            let weight = rng.u64(config.chain_links.0..=config.chain_links.1) as f64;
            graph.add_link(Extremity::right(pair[0]), Extremity::left(pair[1]), weight)?;
        }

        let stray_links = (config.noise * config.contigs as f64).round() as usize;
        for _ in 0..stray_links {
            let a = random_extremity(&mut rng, config.contigs);
            let b = random_extremity(&mut rng, config.contigs);
            if a.same_contig(b) {
                continue;
            }
            let weight = rng.u64(config.noise_links.0..=config.noise_links.1) as f64;
            graph.add_link(a, b, weight)?;
        }

        Ok(SyntheticScaffolding {
            graph,
            order,
            anchors,
        })
    }
}

fn random_extremity(rng: &mut fastrand::Rng, contigs: usize) -> Extremity {
    let contig = rng.u64(1..=contigs as u64);
    let side = if rng.bool() { Side::Left } else { Side::Right };
    Extremity::new(contig, side)
}
