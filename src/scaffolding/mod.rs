//! Scaffold-graph path search and connectivity scoring
//!
//! **Enumeration**: `path_search.rs` - bounded, stack-driven simple path search
//! **Scoring**: `scoring.rs` - good/bad link classification and acceptance
//! **Entry points**: `orchestrator.rs` - between-scaffold extension and within-scaffold closure

pub mod cancellation;
pub mod orchestrator;
pub mod path_search;
pub mod scoring;

pub use cancellation::CancellationToken;
pub use orchestrator::{ScaffoldPathSearcher, SearchOutcome, SearchSummary};
pub use path_search::{
    BoundedPathEnumerator, CandidatePath, PathEnumeration, PathQuery, SearchLimits, StepControl,
    StopReason, MAX_PATH_NODES, UNBOUNDED_PATH_LENGTH,
};
pub use scoring::{
    rank_by_score, AcceptancePolicy, ConnectivityReport, ConnectivityScorer, LinkWeightBucket,
    ScoredPath,
};
