//! Tracing subscriber setup
//!
//! Events across the workspace use snake_case messages with structured
//! fields. This module installs the global subscriber that renders them:
//! human-readable by default, one JSON object per line when configured.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LoggingConfig::filter`].

use friendsync_domain::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::errors::{InfraError, InfraResult};

/// Install the global tracing subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed, which makes
/// repeated initialisation (tests, embedded hosts) harmless.
///
/// # Errors
/// Returns `InfraError::Logging` if the configured filter does not parse.
/// The filter is checked before installation, so a bad filter is reported
/// even when a subscriber already exists.
pub fn init_tracing(config: &LoggingConfig) -> InfraResult<bool> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(json = config.json, "tracing_initialized");
            Ok(true)
        }
        // A global subscriber is already installed.
        Err(e) => {
            tracing::debug!(error = %e, "tracing_already_initialized");
            Ok(false)
        }
    }
}

fn build_filter(config: &LoggingConfig) -> InfraResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| InfraError::Logging(format!("invalid log filter '{}': {e}", config.filter))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_filter_parses() {
        let config = LoggingConfig { filter: "friendsync_core=debug,info".into(), json: false };
        assert!(EnvFilter::try_new(&config.filter).is_ok());
    }

    /// Validates that initialisation is idempotent.
    #[test]
    fn test_second_init_is_noop() {
        let config = LoggingConfig::default();
        let _first = init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }
}
