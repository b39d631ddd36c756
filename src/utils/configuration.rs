use crate::core::extremity::Extremity;
use anyhow::Result;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration for the scaffolding path search
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScaffoldingConfiguration {
    /// General settings
    pub general: GeneralConfig,
    /// Path search parameters
    pub search: PathSearchConfig,
    /// Performance and resource configuration
    pub performance: PerformanceConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub name: String,
    pub version: String,
    /// Enable debug mode
    pub debug_mode: bool,
}

/// Parameters consumed by the path search orchestrators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSearchConfig {
    /// Minimum acceptable connectivity score
    pub score_cutoff: f64,
    /// Accept on score alone, without requiring more than two path nodes
    pub no_score: bool,
    /// Maximum number of enumeration steps per start node
    pub path_threshold: usize,
    /// Maximum number of start nodes in between-scaffold mode (0 = unset)
    pub max_extensions: usize,
    /// Path length ceiling used for within-scaffold closure
    pub max_path_length: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads for parallel extension
    pub num_threads: usize,
    /// Run between-scaffold start nodes on a thread pool
    pub parallel_extension: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log output format (json, pretty, compact)
    pub format: String,
    /// Log file path (optional)
    pub file_path: Option<PathBuf>,
}

const LOG_FORMATS: [&str; 3] = ["json", "pretty", "compact"];

/// Error types for the scaffolding engine
#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("Broken path invariant: {from} and {to} are not linked in the graph")]
    BrokenPath { from: Extremity, to: Extremity },

    #[error("Invalid link {from} -> {to}: {reason}")]
    InvalidLink {
        from: Extremity,
        to: Extremity,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Input/Output error: {message}")]
    IOError { message: String },

    #[error("Thread pool error: {message}")]
    ThreadPoolError { message: String },

    #[error("Validation error: {field} is invalid: {reason}")]
    ValidationError { field: String, reason: String },
}

impl From<ConfigError> for ScaffoldError {
    fn from(err: ConfigError) -> Self {
        ScaffoldError::ConfigurationError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ScaffoldError {
    fn from(err: std::io::Error) -> Self {
        ScaffoldError::IOError {
            message: err.to_string(),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for ScaffoldError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ScaffoldError::ThreadPoolError {
            message: err.to_string(),
        }
    }
}

/// Configuration manager with validation and environment integration
pub struct ConfigurationManager {
    config: ScaffoldingConfiguration,
    config_path: Option<PathBuf>,
    environment_prefix: String,
}

impl ConfigurationManager {
    /// Load configuration from multiple sources
    pub fn new() -> Result<Self, ScaffoldError> {
        Self::load_from_default_locations()
    }

    /// Create configuration manager with pure defaults (no file dependencies)
    pub fn new_with_defaults() -> Result<Self, ScaffoldError> {
        let manager = Self {
            config: ScaffoldingConfiguration::default(),
            config_path: None,
            environment_prefix: "SCAFFOLD".to_string(),
        };

        manager.validate_configuration()?;
        Ok(manager)
    }

    /// Load configuration from specific file
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ScaffoldError> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = Self::load_config_from_file(&config_path)?;

        let manager = Self {
            config,
            config_path: Some(config_path),
            environment_prefix: "SCAFFOLD".to_string(),
        };

        manager.validate_configuration()?;
        Ok(manager)
    }

    fn load_from_default_locations() -> Result<Self, ScaffoldError> {
        let defaults = toml::to_string(&ScaffoldingConfiguration::default()).map_err(|e| {
            ScaffoldError::ConfigurationError {
                message: e.to_string(),
            }
        })?;

        let mut config_builder =
            Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        if let Ok(embedded_config) = std::fs::read_to_string("./config/default.toml") {
            config_builder =
                config_builder.add_source(File::from_str(&embedded_config, FileFormat::Toml));
        }

        if let Ok(system_config) = env::var("SCAFFOLD_SYSTEM_CONFIG") {
            config_builder =
                config_builder.add_source(File::with_name(&system_config).required(false));
        }

        if let Some(home_dir) = dirs::home_dir() {
            let user_config = home_dir
                .join(".config")
                .join("scaffold-forge")
                .join("config.toml");
            config_builder = config_builder.add_source(File::from(user_config).required(false));
        }

        config_builder = config_builder.add_source(File::with_name("scaffold").required(false));

        config_builder =
            config_builder.add_source(Environment::with_prefix("SCAFFOLD").separator("__"));

        let config: ScaffoldingConfiguration = match config_builder.build() {
            Ok(built) => match built.try_deserialize() {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to deserialize configuration: {}, using built-in defaults", e);
                    ScaffoldingConfiguration::default()
                }
            },
            Err(e) => {
                warn!("Failed to build configuration: {}, using built-in defaults", e);
                ScaffoldingConfiguration::default()
            }
        };

        let manager = Self {
            config,
            config_path: None,
            environment_prefix: "SCAFFOLD".to_string(),
        };

        manager.validate_configuration()?;
        Ok(manager)
    }

    fn load_config_from_file(path: &Path) -> Result<ScaffoldingConfiguration, ScaffoldError> {
        let config = Config::builder().add_source(File::from(path)).build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate configuration parameters
    pub fn validate_configuration(&self) -> Result<(), ScaffoldError> {
        let search = &self.config.search;

        if !search.score_cutoff.is_finite() || search.score_cutoff < 0.0 {
            return Err(ScaffoldError::ValidationError {
                field: "search.score_cutoff".to_string(),
                reason: "must be a finite, non-negative number".to_string(),
            });
        }

        if search.path_threshold == 0 {
            return Err(ScaffoldError::ValidationError {
                field: "search.path_threshold".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if search.max_path_length == 0 {
            return Err(ScaffoldError::ValidationError {
                field: "search.max_path_length".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.config.performance.num_threads == 0 {
            return Err(ScaffoldError::ValidationError {
                field: "performance.num_threads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if !LOG_FORMATS.contains(&self.config.logging.format.as_str()) {
            return Err(ScaffoldError::ValidationError {
                field: "logging.format".to_string(),
                reason: format!("must be one of {}", LOG_FORMATS.join(", ")),
            });
        }

        Ok(())
    }

    /// Install the global tracing subscriber described by the logging section.
    /// Does nothing when a subscriber is already set.
    pub fn setup_logging(&self) -> Result<(), ScaffoldError> {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if tracing::dispatcher::has_been_set() {
            return Ok(());
        }

        let level = &self.config.logging.level;
        let format = &self.config.logging.format;

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let registry = tracing_subscriber::registry().with(env_filter);

        // Writer selection is repeated per format because each fmt layer has its own type
        let file_writer = self.config.logging.file_path.as_ref().map(|file_path| {
            let appender = tracing_appender::rolling::daily(
                file_path.parent().unwrap_or(Path::new(".")),
                file_path
                    .file_name()
                    .unwrap_or(std::ffi::OsStr::new("scaffold-forge.log")),
            );
            tracing_appender::non_blocking(appender)
        });

        let installed = match (format.as_str(), file_writer) {
            ("json", Some((writer, guard))) => {
                std::mem::forget(guard);
                tracing::subscriber::set_global_default(
                    registry.with(fmt::layer().json().with_writer(writer)),
                )
            }
            ("json", None) => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().with_target(true).with_thread_ids(true)),
            ),
            ("compact", Some((writer, guard))) => {
                std::mem::forget(guard);
                tracing::subscriber::set_global_default(
                    registry.with(fmt::layer().compact().with_writer(writer)),
                )
            }
            ("compact", None) => {
                tracing::subscriber::set_global_default(registry.with(fmt::layer().compact()))
            }
            (_, Some((writer, guard))) => {
                std::mem::forget(guard);
                tracing::subscriber::set_global_default(
                    registry.with(fmt::layer().with_ansi(false).with_writer(writer)),
                )
            }
            (_, None) => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().without_time().with_target(false)),
            ),
        };

        if installed.is_err() {
            // Another thread won the race; keep its subscriber
            return Ok(());
        }

        info!("📝 Logging initialized with level: {}, format: {}", level, format);
        Ok(())
    }

    pub fn config(&self) -> &ScaffoldingConfiguration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScaffoldingConfiguration {
        &mut self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn environment_prefix(&self) -> &str {
        &self.environment_prefix
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: "scaffold-forge".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            debug_mode: false,
        }
    }
}

impl Default for PathSearchConfig {
    fn default() -> Self {
        Self {
            score_cutoff: 1.0,
            no_score: false,
            path_threshold: 100,
            max_extensions: 0,
            max_path_length: 10_000,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            parallel_extension: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}
