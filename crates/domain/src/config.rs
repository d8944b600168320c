//! Configuration structures
//!
//! Every section has serde defaults, so a config file only needs the keys it
//! overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::errors::{DomainError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendSyncConfig {
    pub queue: QueueConfig,
    pub retry: RetrySettings,
    pub breaker: BreakerSettings,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

impl FriendSyncConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.queue.storage_key.trim().is_empty() {
            return Err(DomainError::Config("queue.storage_key must not be empty".to_string()));
        }
        if self.queue.max_retries == 0 {
            return Err(DomainError::Config("queue.max_retries must be at least 1".to_string()));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(DomainError::Config(format!(
                "retry.max_delay_ms ({}) must not be smaller than retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(DomainError::Config(
                "breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.breaker.cooldown_ms == 0 {
            return Err(DomainError::Config("breaker.cooldown_ms must be greater than 0".to_string()));
        }
        if self.network.poll_interval_ms == 0 {
            return Err(DomainError::Config(
                "network.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Offline queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Key the queue array is stored under
    pub storage_key: String,
    /// Failed drain attempts before an entry is dropped
    pub max_retries: u32,
    /// File backing the key-value store; in-memory when unset
    pub storage_path: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: OFFLINE_QUEUE_STORAGE_KEY.to_string(),
            max_retries: DEFAULT_QUEUE_MAX_RETRIES,
            storage_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
    /// Stop retrying errors the classifier marks as permanent
    pub skip_non_retryable: bool,
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            jitter_ms: DEFAULT_RETRY_JITTER_MS,
            skip_non_retryable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u64,
    pub cooldown_ms: u64,
}

impl BreakerSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_BREAKER_FAILURE_THRESHOLD,
            cooldown_ms: DEFAULT_BREAKER_COOLDOWN_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Poll interval for monitors without a change stream
    pub poll_interval_ms: u64,
}

impl NetworkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { poll_interval_ms: DEFAULT_NETWORK_POLL_INTERVAL_MS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: DEFAULT_LOG_FILTER.to_string(), json: false }
    }
}
