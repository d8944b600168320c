//! Bounded exponential-backoff retry
//!
//! An operation is attempted once and then retried up to `max_retries` more
//! times. Between attempts the executor waits
//! `min(base_delay * 2^attempt + jitter, max_delay)` through an injectable
//! [`Sleeper`], so the schedule is non-blocking in production and instant in
//! tests. Attempts are strictly sequential and jitter is drawn per attempt.
//!
//! Whether a failure is retried at all is decided by a [`RetryPolicy`]. The
//! default, [`policies::AlwaysRetry`], retries every error up to the bound.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::ErrorClassification;
use crate::time::{Sleeper, TokioSleeper};

/// Errors that can occur during retry operations
///
/// Both variants carry the last error observed so callers can classify it.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// All retry attempts have been exhausted
    #[error("All retry attempts exhausted after {attempts} tries: {source}")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// The policy refused to retry the error
    #[error("Operation failed with non-retryable error after {attempts} tries: {source}")]
    NonRetryable {
        attempts: u32,
        #[source]
        source: E,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Number of attempts made, including the first
    pub fn attempts(&self) -> u32 {
        match self {
            Self::AttemptsExhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The last error returned by the operation
    pub fn last_error(&self) -> &E {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source, .. } => source,
        }
    }

    /// Consume the retry error and return the last operation error
    pub fn into_inner(self) -> E {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source, .. } => source,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Determine if the error should be retried and optionally provide a custom
    /// delay
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the default backoff delay
    Retry,
    /// Retry the operation with a custom delay, still capped at `max_delay`
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Additive jitter applied on top of the exponential delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Uniform random delay in `0..=max`
    Uniform { max: Duration },
}

impl Jitter {
    /// Draw a fresh jitter sample
    pub fn sample(&self) -> Duration {
        match self {
            Jitter::None => Duration::ZERO,
            Jitter::Uniform { max } => {
                let max_ms = max.as_millis() as u64;
                if max_ms == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
            }
        }
    }
}

/// Configuration error for retry settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid retry configuration: {message}")]
pub struct RetryConfigError {
    pub message: String,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every subsequent retry
    pub base_delay: Duration,
    /// Upper bound for any single delay, jitter included
    pub max_delay: Duration,
    /// Randomness added to each delay
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter: Jitter::Uniform { max: Duration::from_millis(1000) },
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if self.max_delay < self.base_delay {
            return Err(RetryConfigError {
                message: format!(
                    "max_delay ({:?}) must not be smaller than base_delay ({:?})",
                    self.max_delay, self.base_delay
                ),
            });
        }
        Ok(())
    }

    /// Delay before retry `attempt` without jitter: `min(base * 2^attempt, max)`
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exponential = 2u64
            .checked_pow(attempt)
            .and_then(|factor| base_ms.checked_mul(factor))
            .map(Duration::from_millis)
            .unwrap_or(self.max_delay);
        exponential.min(self.max_delay)
    }

    /// Delay before retry `attempt` with a fresh jitter sample, capped at `max`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay_for(attempt).saturating_add(self.jitter.sample()).min(self.max_delay)
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    pub fn jitter(mut self, max: Duration) -> Self {
        self.config.jitter = Jitter::Uniform { max };
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// A retry that was scheduled after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// Zero-based index of the attempt that failed
    pub attempt_index: u32,
    /// Delay waited before the next attempt
    pub delay: Duration,
}

/// Outcome of a retry execution including the schedule that was followed
#[derive(Debug)]
pub struct RetryOutcome<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    pub result: RetryResult<T, E>,
    pub attempts: Vec<RetryAttempt>,
}

impl<T, E> RetryOutcome<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    /// Sum of all delays waited
    pub fn total_delay(&self) -> Duration {
        self.attempts.iter().map(|a| a.delay).sum()
    }
}

/// The main retry executor
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
    sleeper: Arc<dyn Sleeper>,
}

impl<P> std::fmt::Debug for RetryExecutor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor that sleeps on the tokio timer
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self::with_sleeper(config, policy, Arc::new(TokioSleeper))
    }

    /// Create a retry executor with a custom sleeper
    pub fn with_sleeper(config: RetryConfig, policy: P, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, policy, sleeper }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: std::error::Error + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return the retry schedule
    #[instrument(skip(self, operation), fields(max_retries = self.config.max_retries))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: std::error::Error + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempts = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation_succeeded_after_retry");
                    }
                    return RetryOutcome { result: Ok(value), attempts };
                }
                Err(error) => error,
            };

            if attempt >= self.config.max_retries {
                warn!(attempts = attempt + 1, error = %error, "retry_attempts_exhausted");
                return RetryOutcome {
                    result: Err(RetryError::AttemptsExhausted {
                        attempts: attempt + 1,
                        source: error,
                    }),
                    attempts,
                };
            }

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(attempts = attempt + 1, error = %error, "retry_policy_stopped");
                    return RetryOutcome {
                        result: Err(RetryError::NonRetryable {
                            attempts: attempt + 1,
                            source: error,
                        }),
                        attempts,
                    };
                }
                RetryDecision::Retry => self.config.delay_for(attempt),
                RetryDecision::RetryAfter(custom) => custom.min(self.config.max_delay),
            };

            let scheduled = RetryAttempt { attempt_index: attempt, delay };
            warn!(
                attempt = scheduled.attempt_index + 1,
                delay_ms = scheduled.delay.as_millis() as u64,
                error = %error,
                "retrying_operation"
            );
            attempts.push(scheduled);

            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Retry `operation` with the given configuration, retrying every error
pub async fn with_retry<F, Fut, T, E>(operation: F, config: RetryConfig) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    RetryExecutor::new(config, policies::AlwaysRetry).execute(operation).await
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::*;

    /// Always retry policy - retries on any error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retry policy - never retries
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Predicate-based retry policy
    #[derive(Debug)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }

    /// Retries only errors that classify as retryable, honouring any
    /// `retry_after` hint they carry
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ClassifiedRetry;

    impl<E: ErrorClassification> RetryPolicy<E> for ClassifiedRetry {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if !error.is_retryable() {
                return RetryDecision::Stop;
            }
            match error.retry_after() {
                Some(delay) => RetryDecision::RetryAfter(delay),
                None => RetryDecision::Retry,
            }
        }
    }
}
