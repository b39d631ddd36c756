//! # ScaffoldForge - Linkage-Graph Path Search for Genome Scaffolding
//!
//! Searches the linkage graph of contig extremities for paths that extend
//! scaffolds into one another or close gaps inside a scaffold, and ranks the
//! candidates by how well the surrounding read-pair evidence supports them.

pub mod core;
pub mod scaffolding;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::core::{AdjacencyLinkageGraph, ContigId, Extremity, LinkageGraph, Side};
pub use crate::scaffolding::{
    CancellationToken, ConnectivityScorer, ScaffoldPathSearcher, ScoredPath, SearchOutcome,
};
pub use crate::utils::configuration::{PathSearchConfig, ScaffoldError};

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;
