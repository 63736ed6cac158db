//! Monotonic time primitives for the control loop.
//!
//! The loop reads the clock exactly once per tick and threads the
//! resulting [`Timestamp`] through every component, so every timer
//! comparison inside one tick agrees on "now".

use core::ops::Add;
use core::time::Duration;

/// Milliseconds since boot, monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`.  Saturates to zero if `earlier` is
    /// in the future (a clock that never goes backwards makes this moot).
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(ms))
    }
}

/// "Armed since" stopwatch.  `None` means disarmed, so a stale start
/// instant can never be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilityTimer(Option<Timestamp>);

impl StabilityTimer {
    pub const fn disarmed() -> Self {
        Self(None)
    }

    /// Arm the timer if it is not already running.  An armed timer keeps
    /// its original start instant.
    pub fn arm(&mut self, now: Timestamp) {
        if self.0.is_none() {
            self.0 = Some(now);
        }
    }

    pub fn disarm(&mut self) {
        self.0 = None;
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }

    pub fn armed_since(&self) -> Option<Timestamp> {
        self.0
    }

    /// True once the timer has been armed continuously for `hold`.
    pub fn has_elapsed(&self, now: Timestamp, hold: Duration) -> bool {
        self.0.is_some_and(|since| now.duration_since(since) >= hold)
    }

    /// Time left before `hold` is reached, or `None` when disarmed.
    pub fn remaining(&self, now: Timestamp, hold: Duration) -> Option<Duration> {
        self.0
            .map(|since| hold.saturating_sub(now.duration_since(since)))
    }
}
