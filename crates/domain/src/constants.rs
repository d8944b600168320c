//! Application constants
//!
//! Centralized location for domain-level defaults used by the delivery
//! subsystem.

// Offline queue persistence
pub const OFFLINE_QUEUE_STORAGE_KEY: &str = "friends_offline_queue";
pub const DEFAULT_QUEUE_MAX_RETRIES: u32 = 3;

// Retry executor
pub const DEFAULT_RETRY_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_RETRY_JITTER_MS: u64 = 1_000;

// Circuit breaker
pub const DEFAULT_BREAKER_FAILURE_THRESHOLD: u64 = 5;
pub const DEFAULT_BREAKER_COOLDOWN_MS: u64 = 60_000;

// Connectivity polling for monitors that cannot push transitions
pub const DEFAULT_NETWORK_POLL_INTERVAL_MS: u64 = 5_000;

// Tentative rows created before the server assigns an id
pub const OPTIMISTIC_ID_PREFIX: &str = "optimistic-";

pub const DEFAULT_LOG_FILTER: &str = "info";
