//! Modular common utilities shared across FriendSync crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types, classification and conversions
//! - `observability`: tracing instrumentation (not included by default)
//! - `runtime`: async resilience primitives (time, circuit breaker, retry)
//! - `test-utils`: deterministic clocks for downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{
    with_retry, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitState, Jitter, ResilienceError, ResilienceResult, RetryAttempt,
    RetryConfig, RetryConfigBuilder, RetryConfigError, RetryDecision, RetryError, RetryExecutor, RetryOutcome,
    RetryPolicy, RetryResult,
};
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub use testing::MockClock;
#[cfg(feature = "runtime")]
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
