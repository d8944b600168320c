//! Time sources and suspension primitives
//!
//! Everything that reads the clock or waits goes through these traits so
//! that tests can substitute [`MockClock`](crate::testing::MockClock) and run
//! cooldowns and backoff schedules without real delays.

mod clock;
mod sleep;

pub use clock::{Clock, SystemClock};
pub use sleep::{Sleeper, TokioSleeper};
