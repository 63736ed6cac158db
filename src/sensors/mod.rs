//! Exhaust sensor conditioning.
//!
//! The [`SensorConditioner`] sits between the raw thermocouple and the
//! burn-phase controller.  It rate-limits hardware transactions, throws
//! away samples it cannot trust, and feeds an exponential filter.
//!
//! ```text
//!  ThermocouplePort ──▶ acquire() ──▶ cached raw ──▶ smooth() ──▶ PhaseController
//!                        │ 500 ms cadence
//!                        │ fault bit / implausible / spike → keep previous
//! ```
//!
//! Rejection is soft: a bad sample never reaches the caller as an error,
//! the previously accepted value is simply served again.  Prolonged loss
//! of data is visible to the safety supervisor through
//! [`SensorConditioner::last_valid_at`].

pub mod max31855;

use core::time::Duration;

use log::{debug, warn};

use crate::app::ports::ThermocouplePort;
use crate::clock::Timestamp;
use crate::error::SensorError;

/// Minimum time between two hardware transactions.
pub const ACQUIRE_INTERVAL: Duration = Duration::from_millis(500);
/// Readings below this are discarded as implausible (°F).
pub const MIN_PLAUSIBLE_F: f32 = -100.0;
/// Readings above this are discarded as implausible (°F).
pub const MAX_PLAUSIBLE_F: f32 = 2000.0;
/// Largest accepted jump between consecutive acquisitions (°F).
pub const SPIKE_LIMIT_F: f32 = 150.0;
/// Weight of the previous smoothed value in the exponential filter.
pub const SMOOTHING_ALPHA: f32 = 0.88;

/// One thermocouple transaction as reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Decoded temperature (°F).  Meaningless when `fault` is set.
    pub temp_f: f32,
    /// Chip-level fault bit (open / shorted junction).
    pub fault: bool,
}

/// Per-cause rejection counters, exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub bus: u32,
    pub fault: u32,
    pub out_of_range: u32,
    pub spike: u32,
}

impl RejectionCounts {
    fn record(&mut self, cause: SensorError) {
        let slot = match cause {
            SensorError::BusFailed => &mut self.bus,
            SensorError::FaultBit => &mut self.fault,
            SensorError::OutOfRange => &mut self.out_of_range,
            SensorError::Spike => &mut self.spike,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Cadence-limited, fault-tolerant exhaust temperature source.
pub struct SensorConditioner {
    alpha: f32,
    last_acquire: Option<Timestamp>,
    /// Most recent accepted raw reading.
    cached_f: Option<f32>,
    /// Filter state; `None` until the first accepted sample.
    smoothed_f: Option<f32>,
    last_valid_at: Option<Timestamp>,
    /// Reading thrown away as a spike on the previous acquisition.
    spike_candidate: Option<f32>,
    rejections: RejectionCounts,
}

impl Default for SensorConditioner {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorConditioner {
    pub fn new() -> Self {
        Self::with_alpha(SMOOTHING_ALPHA)
    }

    /// Build a conditioner with a filter weight tuned for another loop rate.
    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            last_acquire: None,
            cached_f: None,
            smoothed_f: None,
            last_valid_at: None,
            spike_candidate: None,
            rejections: RejectionCounts::default(),
        }
    }

    /// Return the cached raw exhaust temperature, refreshing it from the
    /// hardware if a full [`ACQUIRE_INTERVAL`] has passed since the last
    /// transaction.  `None` until a sample has ever been accepted.
    pub fn acquire(&mut self, now: Timestamp, port: &mut impl ThermocouplePort) -> Option<f32> {
        let due = self
            .last_acquire
            .is_none_or(|last| now.duration_since(last) >= ACQUIRE_INTERVAL);
        if !due {
            return self.cached_f;
        }
        self.last_acquire = Some(now);

        let outcome = port.read_raw().and_then(|raw| self.screen(raw));
        match outcome {
            Ok(temp_f) => {
                self.cached_f = Some(temp_f);
                self.last_valid_at = Some(now);
            }
            Err(cause) => {
                if cause != SensorError::Spike {
                    self.spike_candidate = None;
                }
                self.rejections.record(cause);
                match cause {
                    SensorError::Spike => debug!(
                        "exhaust sample rejected ({cause}), holding {:?}",
                        self.cached_f
                    ),
                    _ => warn!("exhaust sample rejected ({cause})"),
                }
            }
        }
        self.cached_f
    }

    /// First-order exponential filter over the cached raw value.
    ///
    /// An absent raw value leaves the filter untouched; the first present
    /// value seeds it directly so there is no ramp-in transient.
    pub fn smooth(&mut self, raw_f: Option<f32>) -> Option<f32> {
        let Some(raw_f) = raw_f else {
            return self.smoothed_f;
        };
        let next = match self.smoothed_f {
            None => raw_f,
            Some(prev) => prev * self.alpha + raw_f * (1.0 - self.alpha),
        };
        self.smoothed_f = Some(next);
        self.smoothed_f
    }

    /// Most recent accepted raw reading.
    pub fn cached_f(&self) -> Option<f32> {
        self.cached_f
    }

    /// Current filter output.
    pub fn smoothed_f(&self) -> Option<f32> {
        self.smoothed_f
    }

    /// When the last sample was accepted.
    pub fn last_valid_at(&self) -> Option<Timestamp> {
        self.last_valid_at
    }

    pub fn rejections(&self) -> RejectionCounts {
        self.rejections
    }

    // ── Internal ──────────────────────────────────────────────

    /// Decide whether a raw transaction can be trusted.
    ///
    /// A jump beyond [`SPIKE_LIMIT_F`] is rejected once and remembered.
    /// The next acquisition is accepted if it lands within the limit of
    /// that rejected reading, so a real step change registers one
    /// interval late; otherwise it becomes the new candidate.
    fn screen(&mut self, raw: RawSample) -> Result<f32, SensorError> {
        if raw.fault {
            return Err(SensorError::FaultBit);
        }
        if !raw.temp_f.is_finite() || !(MIN_PLAUSIBLE_F..=MAX_PLAUSIBLE_F).contains(&raw.temp_f) {
            return Err(SensorError::OutOfRange);
        }
        let confirms = |reference: f32| (raw.temp_f - reference).abs() <= SPIKE_LIMIT_F;
        let accepted = match (self.cached_f, self.spike_candidate) {
            (None, _) => true,
            (Some(prev), candidate) => confirms(prev) || candidate.is_some_and(confirms),
        };
        if !accepted {
            self.spike_candidate = Some(raw.temp_f);
            return Err(SensorError::Spike);
        }
        self.spike_candidate = None;
        Ok(raw.temp_f)
    }
}
