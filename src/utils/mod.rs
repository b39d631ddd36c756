pub mod configuration;
pub mod synthetic;

pub use configuration::{ConfigurationManager, PathSearchConfig, ScaffoldError, ScaffoldingConfiguration};
pub use synthetic::{SyntheticGraphBuilder, SyntheticGraphConfig, SyntheticScaffolding};
