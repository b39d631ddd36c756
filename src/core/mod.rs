pub mod extremity;
pub mod linkage_graph;

pub use extremity::{ContigId, Extremity, Side};
pub use linkage_graph::{AdjacencyLinkageGraph, LinkageGraph};
