//! Timer set and per-tick context threaded through every phase handler.
//!
//! [`TickContext`] is the "blackboard" a phase handler reads from and
//! writes to: the smoothed exhaust temperature, the tick's single `now`,
//! the configuration (read-only), and the three phase timers.

use core::time::Duration;

use serde::Serialize;

use crate::clock::{StabilityTimer, Timestamp};
use crate::config::BurnConfig;

/// Continuous in-band time required for Ramp → Hold.
pub const HOLD_STABILITY: Duration = Duration::from_secs(5);
/// Continuous below-band time required for Hold → Ramp.
pub const RAMP_STABILITY: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Phase timers
// ---------------------------------------------------------------------------

/// The three independent "armed since" stopwatches owned by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimers {
    /// Armed in Ramp while exhaust sits in the hold band.
    pub hold: StabilityTimer,
    /// Armed in Hold while exhaust is far below setpoint.
    pub ramp_fallback: StabilityTimer,
    /// Armed whenever exhaust is below the flue-low threshold.
    pub coal_bed: StabilityTimer,
}

impl PhaseTimers {
    /// Disarm the Ramp/Hold stability timers, leaving coal-bed entry alone.
    pub fn clear_stability(&mut self) {
        self.hold.disarm();
        self.ramp_fallback.disarm();
    }

    pub fn clear_all(&mut self) {
        self.clear_stability();
        self.coal_bed.disarm();
    }

    pub fn any_armed(&self) -> bool {
        self.hold.is_armed() || self.ramp_fallback.is_armed() || self.coal_bed.is_armed()
    }
}

// ---------------------------------------------------------------------------
// Timer reporting
// ---------------------------------------------------------------------------

/// Which countdown a display should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerKind {
    Boost,
    HoldStability,
    RampFallback,
    CoalBedEntry,
}

/// A running countdown and the time left on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveTimer {
    pub kind: TimerKind,
    pub remaining_ms: u64,
}

impl ActiveTimer {
    pub fn new(kind: TimerKind, remaining: Duration) -> Self {
        Self {
            kind,
            remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Everything a phase handler may look at during one tick.
pub struct TickContext<'a> {
    /// Smoothed exhaust temperature; `None` before the first valid sample.
    pub smoothed_f: Option<f32>,
    /// The tick's timestamp, read once by the loop owner.
    pub now: Timestamp,
    pub config: &'a BurnConfig,
    pub timers: &'a mut PhaseTimers,
}

impl TickContext<'_> {
    /// Lower edge of the hold band: `setpoint − deadband`.
    pub fn hold_band_low_f(&self) -> f32 {
        f32::from(self.config.setpoint_f) - f32::from(self.config.deadband_f)
    }

    /// Hold → Ramp threshold: `setpoint − 2·deadband`.
    pub fn fallback_low_f(&self) -> f32 {
        f32::from(self.config.setpoint_f) - 2.0 * f32::from(self.config.deadband_f)
    }

    /// True when a temperature is known and it is at or above `threshold`.
    pub fn temp_at_or_above(&self, threshold: f32) -> bool {
        self.smoothed_f.is_some_and(|t| t >= threshold)
    }

    /// True when a temperature is known and it is strictly above `threshold`.
    pub fn temp_above(&self, threshold: f32) -> bool {
        self.smoothed_f.is_some_and(|t| t > threshold)
    }

    /// True when a temperature is known and it is strictly below `threshold`.
    pub fn temp_below(&self, threshold: f32) -> bool {
        self.smoothed_f.is_some_and(|t| t < threshold)
    }
}
