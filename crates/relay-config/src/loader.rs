//! Configuration loader (defaults + file + env merge).

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use thiserror::Error;

use crate::schema::RelayConfig;

/// Prefix for environment overrides, e.g. `RELAY_CHAIN__MAX_DEPTH=8`.
pub const ENV_PREFIX: &str = "RELAY_";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The explicitly requested file does not exist.
    #[error("config file not found: {0}")]
    Missing(String),
    /// Failed to load or merge configuration.
    #[error("configuration error: {0}")]
    Load(String),
    /// The merged configuration is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Loads configuration by merging layers:
/// 1. Default values
/// 2. Config file (if given)
/// 3. Environment variables (`RELAY_` prefix, `__` separates sections)
///
/// # Errors
/// Returns `ConfigError` if the file is missing, a layer fails to parse,
/// or the result fails validation.
pub fn load_config(config_path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(RelayConfig::default()));

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ConfigError::Missing(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: RelayConfig = figment
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}
