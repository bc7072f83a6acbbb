//! Injectable clock, so the Indexing Decision Service's backoff math and
//! the consistency reconciler's 24h cooldown are testable without sleeping
//! real time (spec §8, Scenario E/F).

use crate::error::Result;

/// Source of the current time, in Unix milliseconds.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock is before the Unix epoch.
    fn now_millis(&self) -> Result<i64>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Result<i64> {
        crate::utils::time::epoch_millis()
    }
}
