//! Resilience patterns for fault tolerance
//!
//! - **Circuit Breaker**: counts consecutive failures of a guarded remote
//!   dependency and fails fast while the dependency is considered down
//! - **Retry Logic**: bounded exponential backoff with additive jitter and a
//!   pluggable retry policy
//!
//! Both are generic over the operation's error type and take their notion of
//! time from [`crate::time`], so tests drive them with a mock clock.

pub mod circuit_breaker;
pub mod retry;

// Re-export circuit breaker types
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerMetrics,
    CircuitState, ConfigError, ConfigResult, ResilienceError, ResilienceResult,
};
// Re-export retry types
pub use retry::{
    policies, with_retry, Jitter, RetryAttempt, RetryConfig, RetryConfigBuilder, RetryConfigError,
    RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
