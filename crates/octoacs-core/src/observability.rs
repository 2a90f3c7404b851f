//! Process-wide `tracing` subscriber whose level can change at runtime.
//!
//! Executor progress goes to a [`LogSink`](crate::LogSink); this subscriber
//! receives the diagnostic `tracing` events and whatever [`TracingSink`]
//! forwards.
//!
//! [`TracingSink`]: crate::TracingSink

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::{ConfigError, LoggingConfig};

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber at the `[logging]` level.
///
/// `RUST_LOG` wins over the configured level when set. Returns `false` if a
/// global subscriber was already installed, in which case it is left alone.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
    installed
}

/// Replaces the active filter with `level`, which may be any `EnvFilter`
/// directive. Returns `Ok(false)` when [`init_tracing`] has not installed a
/// subscriber.
pub fn set_log_level(level: &str) -> Result<bool, ConfigError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|err| ConfigError::Validation(format!("invalid log level '{level}': {err}")))?;
    let Some(handle) = FILTER_HANDLE.get() else {
        return Ok(false);
    };
    handle
        .reload(filter)
        .map_err(|err| ConfigError::Validation(format!("log filter reload failed: {err}")))?;
    tracing::debug!(level, "Log level changed");
    Ok(true)
}
