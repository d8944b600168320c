//! Integration tests for resilience module
//!
//! Tests the circuit breaker wrapping the retry executor the way mutation
//! delivery composes them, with one mock clock driving both the cooldown and
//! the backoff sleeps.

#![cfg(feature = "test-utils")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use friendsync_common::resilience::policies;
use friendsync_common::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, MockClock, ResilienceError, RetryConfig,
    RetryError, RetryExecutor,
};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
struct RemoteError {
    message: String,
}

fn remote(message: &str) -> RemoteError {
    RemoteError { message: message.to_string() }
}

fn retry_executor(clock: &MockClock) -> RetryExecutor<policies::AlwaysRetry> {
    let config = RetryConfig::builder().no_jitter().build().expect("valid retry config");
    RetryExecutor::with_sleeper(config, policies::AlwaysRetry, Arc::new(clock.clone()))
}

fn breaker(clock: &MockClock, threshold: u64) -> CircuitBreaker<MockClock> {
    let config = CircuitBreakerConfig::builder()
        .failure_threshold(threshold)
        .cooldown(Duration::from_secs(60))
        .build()
        .expect("valid breaker config");
    CircuitBreaker::with_clock(config, clock.clone()).expect("breaker")
}

/// Validates that the breaker observes only the final outcome of a retried
/// dispatch.
///
/// # Test Steps
/// 1. Wrap a retry executor (3 retries) in a breaker with threshold 2
/// 2. Run an operation that always fails
/// 3. Verify four underlying attempts produced one breaker failure
/// 4. Run it again and verify the breaker opens
#[tokio::test]
async fn test_breaker_counts_one_failure_per_retried_dispatch() {
    let clock = MockClock::new();
    let retry = retry_executor(&clock);
    let cb = breaker(&clock, 2);
    let calls = Arc::new(AtomicU32::new(0));

    for expected_state in [CircuitState::Closed, CircuitState::Open] {
        let counter = Arc::clone(&calls);
        let result = cb
            .execute(|| {
                retry.execute(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(remote("connection reset")) }
                })
            })
            .await;

        match result {
            Err(ResilienceError::OperationFailed { source }) => {
                assert!(matches!(source, RetryError::AttemptsExhausted { attempts: 4, .. }));
                assert_eq!(source.last_error().message, "connection reset");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(cb.get_state(), expected_state);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 8);
}

/// Validates the full open, cooldown and recovery cycle through retries.
///
/// # Test Steps
/// 1. Open the breaker with one failed dispatch
/// 2. Verify an immediate call is rejected without reaching the retry loop
/// 3. Advance the clock past the cooldown
/// 4. Verify the probe succeeds and the breaker closes
#[tokio::test]
async fn test_breaker_recovers_after_cooldown() {
    let clock = MockClock::new();
    let retry = retry_executor(&clock);
    let cb = breaker(&clock, 1);

    let _ = cb
        .execute(|| retry.execute(|| async { Err::<(), _>(remote("server error")) }))
        .await;
    assert_eq!(cb.get_state(), CircuitState::Open);

    // The retry sleeps ran on the same mock clock, so the cooldown clock
    // started after the last attempt.
    let sleeps: Duration = clock.recorded_sleeps().iter().sum();
    assert_eq!(sleeps, Duration::from_millis(7000));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let rejected = cb
        .execute(|| {
            retry.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, RemoteError>(()) }
            })
        })
        .await;
    assert!(matches!(rejected, Err(ResilienceError::CircuitOpen { remaining }) if remaining == Duration::from_secs(60)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    clock.advance(Duration::from_secs(60));
    let recovered =
        cb.execute(|| retry.execute(|| async { Ok::<_, RemoteError>("accepted") })).await;

    assert_eq!(recovered.expect("probe should pass"), "accepted");
    assert_eq!(cb.get_state(), CircuitState::Closed);
    assert_eq!(cb.metrics().consecutive_failures, 0);
    assert_eq!(cb.metrics().rejected_calls, 1);
}

/// Validates the free `with_retry` helper against a transient failure.
#[tokio::test]
async fn test_with_retry_recovers_from_transient_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let config = RetryConfig::builder()
        .base_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
        .no_jitter()
        .build()
        .expect("valid retry config");

    let result = friendsync_common::with_retry(
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(remote("fetch failed"))
                } else {
                    Ok(n)
                }
            }
        },
        config,
    )
    .await;

    assert_eq!(result.expect("second attempt succeeds"), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
