//! Controllable time for deterministic tests
//!
//! [`MockClock`] implements both [`Clock`] and [`Sleeper`]. Sleeping on it
//! advances the clock instantly and records the requested duration, so a
//! retry schedule and a breaker cooldown can share one fake timeline.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;

use crate::time::{Clock, Sleeper};

/// Mock clock for deterministic testing
///
/// Clones share the same timeline and the same sleep log.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    base_system_time: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    /// Create a new mock clock anchored at the current real time
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            base_system_time: SystemTime::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Advance the mock clock by milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed = duration;
        }
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO)
    }

    /// Durations passed to [`Sleeper::sleep`], in call order
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}

#[async_trait]
impl Sleeper for MockClock {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates `MockClock::advance` behavior.
    ///
    /// Assertions:
    /// - `now()` moves forward by exactly the advanced duration.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
    }

    /// Validates that clones share the same timeline.
    #[test]
    fn test_mock_clock_clone_shares_time() {
        let clock1 = MockClock::new();
        clock1.advance(Duration::from_secs(10));

        let clock2 = clock1.clone();
        clock2.advance_millis(5_000);

        assert_eq!(clock1.elapsed(), Duration::from_secs(15));
        assert_eq!(clock2.elapsed(), Duration::from_secs(15));
    }

    /// Validates that sleeping advances time and is recorded.
    ///
    /// Assertions:
    /// - Each sleep is logged in order.
    /// - Elapsed time equals the sum of sleeps.
    #[tokio::test]
    async fn test_mock_clock_sleep_records_and_advances() {
        let clock = MockClock::new();

        clock.sleep(Duration::from_millis(1200)).await;
        clock.sleep(Duration::from_millis(2400)).await;

        assert_eq!(
            clock.recorded_sleeps(),
            vec![Duration::from_millis(1200), Duration::from_millis(2400)]
        );
        assert_eq!(clock.elapsed(), Duration::from_millis(3600));
    }
}
