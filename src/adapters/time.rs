//! Monotonic clock adapter.
//!
//! - **`espidf`** — wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic since boot).
//! - **host** — uses `std::time::Instant` for tests and simulation.

use crate::app::ports::ClockPort;
use crate::clock::Timestamp;

/// Milliseconds since boot.
pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl ClockPort for MonotonicClock {
    #[cfg(feature = "espidf")]
    fn now(&self) -> Timestamp {
        // SAFETY: read-only query of the system timer.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        Timestamp::from_millis(us.max(0) as u64 / 1_000)
    }

    #[cfg(not(feature = "espidf"))]
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.start.elapsed().as_millis() as u64)
    }
}
