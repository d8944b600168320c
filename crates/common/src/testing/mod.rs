//! Testing utilities and helpers
//!
//! - **[`time`]**: a controllable clock that doubles as a recording sleeper
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use friendsync_common::testing::MockClock;
//! use friendsync_common::Clock;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod time;

pub use time::MockClock;
