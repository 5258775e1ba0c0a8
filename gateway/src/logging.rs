//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies.

use crate::config::{Config, LogFormat};
use crate::error::{GatewayError, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
///
/// Fails if the level is not a valid filter directive or a subscriber is
/// already installed.
pub fn init(config: &Config) -> Result<()> {
    let env_filter = env_filter(&config.log_level)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| GatewayError::Config(format!("failed to initialize logging: {e}")))
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| GatewayError::Config(format!("invalid log level '{level}': {e}")))
}
