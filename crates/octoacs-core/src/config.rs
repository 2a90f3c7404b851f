//! Reconciliation configuration.
//!
//! Loaded from an optional TOML file (`octoacs.toml` by default) with
//! environment overrides such as `OCTOACS__RECONCILE__DEFAULT_TOKEN_LIFETIME=15m`.

use std::path::PathBuf;
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::executor::{DEFAULT_TOKEN_LIFETIME_SECS, ReconcileSettings};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "octoacs.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "OCTOACS";

const VALID_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// A value was read but is out of range.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub reconcile: ReconcileSection,
    pub logging: LoggingConfig,
}

/// Executor tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSection {
    /// Token lifetime used when a relying party leaves it unset.
    #[serde(with = "humantime_serde")]
    pub default_token_lifetime: Duration,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            default_token_lifetime: Duration::from_secs(u64::from(DEFAULT_TOKEN_LIFETIME_SECS)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ReconcileConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lifetime = self.reconcile.default_token_lifetime.as_secs();
        if lifetime == 0 {
            return Err(ConfigError::Validation(
                "reconcile.default_token_lifetime must be at least one second".into(),
            ));
        }
        if u32::try_from(lifetime).is_err() {
            return Err(ConfigError::Validation(format!(
                "reconcile.default_token_lifetime must not exceed {} seconds",
                u32::MAX
            )));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {VALID_LOG_LEVELS:?}"
            )));
        }
        Ok(())
    }

    /// Returns the executor settings described by this configuration.
    ///
    /// Out-of-range lifetimes are clamped; call [`validate`](Self::validate)
    /// first to reject them instead.
    #[must_use]
    pub fn settings(&self) -> ReconcileSettings {
        let seconds = self.reconcile.default_token_lifetime.as_secs();
        ReconcileSettings {
            default_token_lifetime: u32::try_from(seconds).unwrap_or(u32::MAX).max(1),
        }
    }
}

/// Loads and validates configuration.
///
/// `path` names a TOML file read if it exists; without one, `octoacs.toml` in
/// the working directory is tried. Environment variables prefixed with
/// `OCTOACS__` override file values, using `__` between nested keys.
pub fn load_config(path: Option<&str>) -> Result<ReconcileConfig, ConfigError> {
    let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);

    let mut builder = Config::builder();
    if file.exists() {
        builder = builder.add_source(File::from(file));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let config: ReconcileConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    tracing::debug!(
        default_token_lifetime = config.reconcile.default_token_lifetime.as_secs(),
        level = %config.logging.level,
        "Configuration loaded"
    );
    Ok(config)
}
