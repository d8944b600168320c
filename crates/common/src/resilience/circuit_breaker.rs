//! Consecutive-failure circuit breaker
//!
//! One breaker guards a family of remote operations. It runs every call
//! while `CLOSED`, rejects calls while `OPEN` and reports how much of the
//! cooldown is left, and lets a probe through once the cooldown has elapsed.
//!
//! ```text
//!            failures >= threshold
//!   CLOSED ─────────────────────────▶ OPEN
//!     ▲                                │ cooldown elapsed
//!     │ probe succeeds                 ▼
//!     └─────────────────────────── HALF_OPEN
//!                 probe fails: back to OPEN, cooldown restarts
//! ```
//!
//! `HALF_OPEN` does not serialize probes. Two calls that arrive right after
//! the cooldown both reach the wrapped operation, and whichever settles last
//! decides the resulting state.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::time::{Clock, SystemClock};

//==============================================================================
// Error Types
//==============================================================================

/// Simple configuration error for validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors produced by [`CircuitBreaker::execute`]
///
/// Generic over the wrapped operation's error `E` so the original failure is
/// preserved untouched.
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Circuit breaker is open, rejecting calls
    #[error("Circuit breaker is open, retry in {remaining:?}")]
    CircuitOpen { remaining: Duration },

    /// The underlying operation failed
    #[error("Operation failed: {source}")]
    OperationFailed {
        #[source]
        source: E,
    },
}

impl<E> ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Remaining cooldown when the call was rejected
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        match self {
            Self::CircuitOpen { remaining } => Some(*remaining),
            Self::OperationFailed { .. } => None,
        }
    }
}

/// Result type for resilience operations
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Cooldown elapsed, probe calls are allowed through
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u64,
    /// Time the circuit stays open after the last failure
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, cooldown: Duration::from_secs(60) }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.cooldown.is_zero() {
            return Err(ConfigError::Invalid {
                message: "cooldown must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn failure_threshold(mut self, threshold: u64) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Circuit breaker metrics for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub consecutive_failures: u64,
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub rejected_calls: u64,
    pub last_failure_time: Option<Instant>,
}

/// Generic circuit breaker implementation
///
/// Cloning yields a handle onto the same shared state.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    state: Arc<RwLock<CircuitState>>,
    consecutive_failures: Arc<AtomicU64>,
    total_calls: Arc<AtomicU64>,
    success_count: Arc<AtomicU64>,
    failure_count: Arc<AtomicU64>,
    rejected_calls: Arc<AtomicU64>,
    last_failure_time: Arc<RwLock<Option<Instant>>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.get_state())
            .field("consecutive_failures", &self.consecutive_failures())
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            consecutive_failures: Arc::clone(&self.consecutive_failures),
            total_calls: Arc::clone(&self.total_calls),
            success_count: Arc::clone(&self.success_count),
            failure_count: Arc::clone(&self.failure_count),
            rejected_calls: Arc::clone(&self.rejected_calls),
            last_failure_time: Arc::clone(&self.last_failure_time),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a new circuit breaker using the system clock
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a new circuit breaker with a custom clock
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(CircuitState::Closed)),
            consecutive_failures: Arc::new(AtomicU64::new(0)),
            total_calls: Arc::new(AtomicU64::new(0)),
            success_count: Arc::new(AtomicU64::new(0)),
            failure_count: Arc::new(AtomicU64::new(0)),
            rejected_calls: Arc::new(AtomicU64::new(0)),
            last_failure_time: Arc::new(RwLock::new(None)),
            clock: Arc::new(clock),
        })
    }

    /// Configuration this breaker was built with
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Decide whether a call may proceed.
    ///
    /// Returns the state the call runs under, or the remaining cooldown when
    /// the circuit is open. Moves `OPEN` to `HALF_OPEN` once the cooldown has
    /// elapsed.
    pub fn try_acquire(&self) -> Result<CircuitState, Duration> {
        let mut state = self.write_state();

        match *state {
            CircuitState::Closed => Ok(CircuitState::Closed),
            CircuitState::HalfOpen => Ok(CircuitState::HalfOpen),
            CircuitState::Open => {
                let elapsed = self
                    .last_failure()
                    .map(|failed_at| self.clock.now().saturating_duration_since(failed_at))
                    .unwrap_or(self.config.cooldown);

                if elapsed >= self.config.cooldown {
                    *state = CircuitState::HalfOpen;
                    info!(
                        consecutive_failures = self.consecutive_failures(),
                        "circuit_breaker_half_open"
                    );
                    Ok(CircuitState::HalfOpen)
                } else {
                    Err(self.config.cooldown - elapsed)
                }
            }
        }
    }

    /// Remaining cooldown if the circuit is currently open
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        if self.get_state() != CircuitState::Open {
            return None;
        }
        let elapsed = self
            .last_failure()
            .map(|failed_at| self.clock.now().saturating_duration_since(failed_at))
            .unwrap_or(self.config.cooldown);
        Some(self.config.cooldown.saturating_sub(elapsed))
    }

    /// Execute an operation with circuit breaker protection
    ///
    /// A rejected call never invokes `operation`.
    #[instrument(skip(self, operation), fields(state = %self.get_state()))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> ResilienceResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Err(remaining) = self.try_acquire() {
            self.rejected_calls.fetch_add(1, Ordering::Relaxed);
            debug!(remaining_ms = remaining.as_millis() as u64, "circuit_breaker_rejected_call");
            return Err(ResilienceError::CircuitOpen { remaining });
        }

        self.total_calls.fetch_add(1, Ordering::Relaxed);

        match operation().await {
            Ok(result) => {
                self.record_success();
                Ok(result)
            }
            Err(error) => {
                self.record_failure();
                debug!(error = %error, "circuit_breaker_observed_failure");
                Err(ResilienceError::OperationFailed { source: error })
            }
        }
    }

    /// Record a successful operation
    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);

        let mut state = self.write_state();
        self.consecutive_failures.store(0, Ordering::Release);

        if *state != CircuitState::Closed {
            let previous = *state;
            *state = CircuitState::Closed;
            info!(previous = %previous, "circuit_breaker_closed");
        }
    }

    /// Record a failed operation
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);

        let mut state = self.write_state();
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        self.set_last_failure(Some(self.clock.now()));

        match *state {
            CircuitState::Closed => {
                if failures >= self.config.failure_threshold {
                    *state = CircuitState::Open;
                    warn!(
                        consecutive_failures = failures,
                        cooldown_ms = self.config.cooldown.as_millis() as u64,
                        "circuit_breaker_opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                *state = CircuitState::Open;
                warn!(consecutive_failures = failures, "circuit_breaker_probe_failed");
            }
            CircuitState::Open => {}
        }
    }

    /// Get the current state of the circuit breaker
    pub fn get_state(&self) -> CircuitState {
        *self.read_state()
    }

    /// Consecutive failures since the last success or reset
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Get circuit breaker metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            state: self.get_state(),
            consecutive_failures: self.consecutive_failures(),
            total_calls: self.total_calls.load(Ordering::Acquire),
            success_count: self.success_count.load(Ordering::Acquire),
            failure_count: self.failure_count.load(Ordering::Acquire),
            rejected_calls: self.rejected_calls.load(Ordering::Acquire),
            last_failure_time: self.last_failure(),
        }
    }

    /// Reset the circuit breaker to closed state with zero failures
    pub fn reset(&self) {
        let mut state = self.write_state();
        *state = CircuitState::Closed;
        self.consecutive_failures.store(0, Ordering::Release);
        self.set_last_failure(None);
        info!("circuit_breaker_reset");
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CircuitState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker state lock poisoned");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CircuitState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker state lock poisoned");
            poisoned.into_inner()
        })
    }

    fn last_failure(&self) -> Option<Instant> {
        match self.last_failure_time.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_last_failure(&self, at: Option<Instant>) {
        match self.last_failure_time.write() {
            Ok(mut guard) => *guard = at,
            Err(poisoned) => *poisoned.into_inner() = at,
        }
    }
}
