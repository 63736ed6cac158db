//! Safety supervisor.
//!
//! The supervisor runs **every tick before the phase controller** and
//! maintains a fault bitmask.  It is the external fault signal the
//! controller's Safety latch listens to.
//!
//! ## Fault lifecycle
//!
//! 1. A condition raises a fault (e.g. no valid exhaust sample for 10 s).
//! 2. The supervisor sets the corresponding bit.
//! 3. The service latches the controller into Safety: fan 0, damper closed.
//! 4. Each tick the supervisor re-evaluates and clears bits whose
//!    condition has gone away.
//! 5. The latch itself stays until the operator sends `ClearSafety`,
//!    which is refused while any bit is still set.
//!
//! Several faults can be active at once; the controller cannot leave
//! Safety until *every* fault is resolved.

use core::time::Duration;

use log::{error, info};

use crate::clock::Timestamp;
use crate::config::BurnConfig;
use crate::error::SafetyFault;

/// Inputs the supervisor needs for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyInputs {
    pub now: Timestamp,
    /// Smoothed exhaust temperature, if any sample was ever accepted.
    pub smoothed_f: Option<f32>,
    /// When the conditioner last accepted a sample.
    pub last_valid_at: Option<Timestamp>,
}

/// Safety supervisor.
pub struct SafetySupervisor {
    /// Latched fault bitmask.
    faults: u8,
    /// Reference point for staleness before the first valid sample.
    started_at: Timestamp,
}

impl SafetySupervisor {
    pub fn new(started_at: Timestamp) -> Self {
        Self {
            faults: 0,
            started_at,
        }
    }

    /// Evaluate all safety conditions for this tick.
    /// Returns the updated fault bitmask.
    pub fn evaluate(&mut self, inputs: &SafetyInputs, config: &BurnConfig) -> u8 {
        // ── Sensor staleness ──────────────────────────────────────
        let stale_after = Duration::from_secs(u64::from(config.sensor_stale_timeout_secs));
        let reference = inputs.last_valid_at.unwrap_or(self.started_at);
        self.eval_fault(
            SafetyFault::SensorStale,
            inputs.now.duration_since(reference) > stale_after,
        );

        // ── Exhaust over-temperature ──────────────────────────────
        self.eval_fault(
            SafetyFault::OverTemperature,
            inputs
                .smoothed_f
                .is_some_and(|t| t > f32::from(config.exhaust_limit_f)),
        );

        self.faults
    }

    /// Operator emergency stop: set or release the e-stop bit.
    pub fn set_estop(&mut self, engaged: bool) {
        self.eval_fault(SafetyFault::EStop, engaged);
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SAFETY FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(now_s: u64, temp: Option<f32>, valid_s: Option<u64>) -> SafetyInputs {
        SafetyInputs {
            now: Timestamp::from_secs(now_s),
            smoothed_f: temp,
            last_valid_at: valid_s.map(Timestamp::from_secs),
        }
    }

    #[test]
    fn fresh_sensor_is_healthy() {
        let mut s = SafetySupervisor::new(Timestamp::ZERO);
        let c = BurnConfig::default();
        assert_eq!(s.evaluate(&inputs(5, Some(400.0), Some(5)), &c), 0);
    }

    #[test]
    fn no_sample_since_startup_goes_stale() {
        let mut s = SafetySupervisor::new(Timestamp::ZERO);
        let c = BurnConfig::default();
        assert_eq!(s.evaluate(&inputs(10, None, None), &c), 0);
        s.evaluate(&inputs(11, None, None), &c);
        assert!(s.has_fault(SafetyFault::SensorStale));
    }

    #[test]
    fn stale_fault_clears_when_samples_return() {
        let mut s = SafetySupervisor::new(Timestamp::ZERO);
        let c = BurnConfig::default();
        s.evaluate(&inputs(20, Some(300.0), Some(5)), &c);
        assert!(s.has_fault(SafetyFault::SensorStale));
        s.evaluate(&inputs(21, Some(300.0), Some(21)), &c);
        assert!(!s.has_faults());
    }

    #[test]
    fn over_temperature_trips_above_limit() {
        let mut s = SafetySupervisor::new(Timestamp::ZERO);
        let c = BurnConfig::default();
        s.evaluate(&inputs(1, Some(1000.0), Some(1)), &c);
        assert!(!s.has_faults());
        s.evaluate(&inputs(2, Some(1000.5), Some(2)), &c);
        assert_eq!(s.faults(), SafetyFault::OverTemperature.mask());
    }

    #[test]
    fn estop_is_independent_of_sensor_faults() {
        let mut s = SafetySupervisor::new(Timestamp::ZERO);
        let c = BurnConfig::default();
        s.set_estop(true);
        assert_eq!(s.evaluate(&inputs(1, Some(300.0), Some(1)), &c), SafetyFault::EStop.mask());
        s.set_estop(false);
        assert!(!s.has_faults());
    }
}
