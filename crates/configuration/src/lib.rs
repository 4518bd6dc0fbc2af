use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AgentConfig, ApiConfig, Config, LedgerConfig, LoggingConfig, RankingConfig, SourceConfig,
    StorageConfig, Weights,
};

/// Loads the application configuration from the given TOML file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// layers `SENTQUANT_*` environment variables on top (e.g. `SENTQUANT_STORAGE__DATA_DIR`),
/// deserializes the result into our strongly-typed `Config` struct and validates it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("SENTQUANT")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(agents = config.agents.len(), path = %path.display(), "Configuration loaded.");
    Ok(config)
}
