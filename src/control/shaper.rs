//! Fan output shaping.
//!
//! Demand from the phase controller is smoothed, clamped, then passed
//! through one of two mutually exclusive policies:
//!
//! ```text
//!  demand ──▶ (3·last + demand) / 4 ──▶ min(clamp_max) ──┬─▶ Clamp:      max(clamp_min)
//!                                                        └─▶ Hysteresis: on above min+10,
//!                                                                        off below min
//! ```
//!
//! Shaping memory is wiped whenever the phase changes into Boost, Idle or
//! Safety, so stale state from one phase never leaks into the next.

use crate::config::{BurnConfig, FanMode};
use crate::fsm::Phase;

/// Gap (percentage points) between the hysteresis off and on thresholds.
pub const HYSTERESIS_GAP: u8 = 10;

/// Fan shaping state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorShaper {
    /// Smoothed value before clamping, carried into the next tick.
    last_applied: u8,
    fan_on: bool,
    previous_phase: Phase,
}

impl Default for ActuatorShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorShaper {
    pub fn new() -> Self {
        Self {
            last_applied: 0,
            fan_on: false,
            previous_phase: Phase::Ramp,
        }
    }

    /// Turn a fan demand into the percentage written to the fan.
    pub fn apply(&mut self, demand: u8, phase: Phase, config: &BurnConfig) -> u8 {
        if phase != self.previous_phase {
            if phase.resets_shaping() {
                self.reset();
            }
            self.previous_phase = phase;
        }

        match phase {
            Phase::Safety => {
                self.reset();
                0
            }
            Phase::Boost => {
                self.last_applied = 100;
                self.fan_on = true;
                100
            }
            _ => self.shape(demand.min(100), config),
        }
    }

    pub fn is_fan_on(&self) -> bool {
        self.fan_on
    }

    pub fn last_applied(&self) -> u8 {
        self.last_applied
    }

    pub fn reset(&mut self) {
        self.last_applied = 0;
        self.fan_on = false;
    }

    // ── Internal ──────────────────────────────────────────────

    fn shape(&mut self, demand: u8, config: &BurnConfig) -> u8 {
        let smoothed = ((u16::from(self.last_applied) * 3 + u16::from(demand)) / 4) as u8;
        self.last_applied = smoothed;

        let fan = smoothed.min(config.clamp_max_percent);
        let min = config.clamp_min_percent;

        match config.fan_mode {
            FanMode::Clamp => fan.max(min),
            FanMode::Hysteresis => {
                if !self.fan_on && fan > min.saturating_add(HYSTERESIS_GAP) {
                    self.fan_on = true;
                } else if self.fan_on && fan < min {
                    self.fan_on = false;
                }
                if self.fan_on { fan } else { 0 }
            }
        }
    }
}
