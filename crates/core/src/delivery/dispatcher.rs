//! Resilient dispatch of friend mutations
//!
//! Every operation goes through one shared circuit breaker wrapping the retry
//! executor, which wraps the remote call:
//!
//! ```text
//! breaker.execute(|| retry.execute(|| executor.<call>()))
//! ```
//!
//! The breaker therefore observes one outcome per dispatch, after retries.

use std::sync::Arc;

use async_trait::async_trait;
use friendsync_common::resilience::policies::{AlwaysRetry, ClassifiedRetry};
use friendsync_common::{
    CircuitBreaker, CircuitBreakerConfig, Clock, CommonError, Jitter, ResilienceError,
    RetryConfig, RetryDecision, RetryExecutor, RetryPolicy, Sleeper, SystemClock, TokioSleeper,
};
use friendsync_domain::{BreakerSettings, FriendOperation, RetrySettings};
use tracing::{debug, instrument};

use super::ports::{OperationDispatcher, OperationExecutor};
use crate::errors::{FriendsError, Result};

/// Which failures the retry executor retries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryMode {
    /// Retry every failure up to the bound
    #[default]
    Always,
    /// Stop on failures the classifier marks as permanent
    SkipNonRetryable,
}

impl RetryMode {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        if settings.skip_non_retryable {
            RetryMode::SkipNonRetryable
        } else {
            RetryMode::Always
        }
    }
}

impl RetryPolicy<FriendsError> for RetryMode {
    fn should_retry(&self, error: &FriendsError, attempt: u32) -> RetryDecision {
        match self {
            RetryMode::Always => AlwaysRetry.should_retry(error, attempt),
            RetryMode::SkipNonRetryable => ClassifiedRetry.should_retry(error, attempt),
        }
    }
}

/// Build the retry executor configuration from settings
pub fn retry_config(settings: &RetrySettings) -> Result<RetryConfig> {
    let jitter = if settings.jitter_ms == 0 {
        Jitter::None
    } else {
        Jitter::Uniform { max: settings.jitter() }
    };
    let config = RetryConfig {
        max_retries: settings.max_retries,
        base_delay: settings.base_delay(),
        max_delay: settings.max_delay(),
        jitter,
    };
    config.validate().map_err(|e| CommonError::config_field("retry", e.to_string()))?;
    Ok(config)
}

/// Build the circuit breaker configuration from settings
pub fn breaker_config(settings: &BreakerSettings) -> Result<CircuitBreakerConfig> {
    CircuitBreakerConfig::builder()
        .failure_threshold(settings.failure_threshold)
        .cooldown(settings.cooldown())
        .build()
        .map_err(|e| FriendsError::from(CommonError::config_field("breaker", e.to_string())))
}

/// Dispatcher wrapping an [`OperationExecutor`] in breaker and retry
pub struct MutationDispatcher {
    executor: Arc<dyn OperationExecutor>,
    breaker: CircuitBreaker<Arc<dyn Clock>>,
    retry: RetryExecutor<RetryMode>,
}

impl std::fmt::Debug for MutationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationDispatcher")
            .field("breaker", &self.breaker)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl MutationDispatcher {
    /// Create a dispatcher on the system clock and tokio timer
    pub fn new(
        executor: Arc<dyn OperationExecutor>,
        breaker: CircuitBreakerConfig,
        retry: RetryConfig,
        mode: RetryMode,
    ) -> Result<Self> {
        Self::with_time(executor, breaker, retry, mode, Arc::new(SystemClock), Arc::new(TokioSleeper))
    }

    /// Create a dispatcher with explicit time sources
    pub fn with_time(
        executor: Arc<dyn OperationExecutor>,
        breaker: CircuitBreakerConfig,
        retry: RetryConfig,
        mode: RetryMode,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let breaker = CircuitBreaker::with_clock(breaker, clock)
            .map_err(|e| CommonError::config_field("breaker", e.to_string()))?;
        let retry = RetryExecutor::with_sleeper(retry, mode, sleeper);
        Ok(Self { executor, breaker, retry })
    }

    /// Create a dispatcher from configuration sections
    pub fn from_settings(
        executor: Arc<dyn OperationExecutor>,
        retry: &RetrySettings,
        breaker: &BreakerSettings,
    ) -> Result<Self> {
        Self::new(executor, breaker_config(breaker)?, retry_config(retry)?, RetryMode::from_settings(retry))
    }

    /// The breaker shared by all dispatches
    pub fn breaker(&self) -> &CircuitBreaker<Arc<dyn Clock>> {
        &self.breaker
    }
}

#[async_trait]
impl OperationDispatcher for MutationDispatcher {
    #[instrument(skip(self, operation), fields(kind = %operation.kind()))]
    async fn dispatch(&self, operation: &FriendOperation) -> Result<()> {
        let executor = self.executor.as_ref();
        let outcome = self
            .breaker
            .execute(|| self.retry.execute(|| execute_operation(executor, operation)))
            .await;

        match outcome {
            Ok(()) => {
                debug!(target_id = operation.target_id(), "operation_dispatched");
                Ok(())
            }
            Err(ResilienceError::CircuitOpen { remaining }) => {
                debug!(remaining_ms = remaining.as_millis() as u64, "dispatch_rejected_by_breaker");
                Err(FriendsError::CircuitOpen { remaining })
            }
            Err(ResilienceError::OperationFailed { source }) => Err(source.into_inner()),
        }
    }
}

/// Route an operation to the matching executor call
pub async fn execute_operation(
    executor: &dyn OperationExecutor,
    operation: &FriendOperation,
) -> Result<()> {
    match operation {
        FriendOperation::SendRequest(p) => {
            executor.send_friend_request(&p.receiver_id, p.message.as_deref()).await
        }
        FriendOperation::Accept(p) => executor.accept_friend_request(&p.request_id).await,
        FriendOperation::Reject(p) => executor.reject_friend_request(&p.request_id).await,
        FriendOperation::CancelRequest(p) => executor.cancel_friend_request(&p.request_id).await,
        FriendOperation::Unfriend(p) => executor.unfriend(&p.friend_id).await,
        FriendOperation::Block(p) => executor.block_user(&p.user_id, p.reason.as_deref()).await,
        FriendOperation::Unblock(p) => executor.unblock_user(&p.user_id).await,
    }
}
