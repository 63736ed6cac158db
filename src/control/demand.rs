//! Fan demand strategies.
//!
//! [`DemandCurve`] is the single entry point the phase controller calls
//! once per tick.  Phase overrides are applied here for every strategy:
//!
//! | Phase                  | PhaseCurve      | Pid / Adaptive   |
//! |------------------------|-----------------|------------------|
//! | Boost                  | 100             | 100              |
//! | Ramp                   | 100             | strategy output  |
//! | Hold                   | [`hold_curve`]  | strategy output  |
//! | CoalBed, Idle, Safety  | 0               | 0                |

use log::info;

use crate::clock::Timestamp;
use crate::config::{BurnConfig, BurnLogic};
use crate::fsm::Phase;

use super::pid::{MIN_DT_SECS, ProfiledPid};

/// Error (°F) at or below which Hold asks for the minimum fan.
pub const HOLD_MIN_ERROR_F: f32 = 5.0;
/// Error (°F) where the Hold curve switches to its steep zone.
pub const HOLD_STEEP_ERROR_F: f32 = 25.0;
/// Error (°F) above which the steep zone is no longer capped.
pub const HOLD_CAP_ERROR_F: f32 = 40.0;
/// Cap applied to the lower two zones of the Hold curve (%).
pub const HOLD_CAP_PERCENT: f32 = 80.0;
/// Proportional gain of the adaptive strategy.
pub const ADAPTIVE_GAIN: f32 = 0.8;

/// Three-zone Hold curve on `error = setpoint − exhaust`.
///
/// ```text
///  demand
///   100 ┤                              ╱
///    80 ┤                      ┌──────┘
///    50 ┤             ╱───────╱
///   min ┼────────────╱
///       └────────────┴─────────┴──────┴──── error
///                    5         25     40
/// ```
pub fn hold_curve(error_f: f32, clamp_min: u8, clamp_max: u8) -> u8 {
    let lo = f32::from(clamp_min);
    let value = if error_f <= HOLD_MIN_ERROR_F {
        lo
    } else if error_f <= HOLD_STEEP_ERROR_F {
        (lo + (error_f - HOLD_MIN_ERROR_F) * 2.0)
            .min(HOLD_CAP_PERCENT)
            .min(f32::from(clamp_max))
            .max(lo)
    } else {
        let steep = 50.0 + (error_f - HOLD_STEEP_ERROR_F) * 2.0;
        let steep = if error_f <= HOLD_CAP_ERROR_F {
            steep.min(HOLD_CAP_PERCENT)
        } else {
            steep
        };
        steep.min(100.0).max(lo)
    };
    value as u8
}

/// Phase-based demand: the canonical, memoryless strategy.
///
/// `error_f` is `setpoint − exhaust`, or `None` before the first sample.
pub fn compute_demand(phase: Phase, error_f: Option<f32>, config: &BurnConfig) -> u8 {
    match phase {
        Phase::Boost | Phase::Ramp => 100,
        Phase::Hold => error_f.map_or(config.clamp_min_percent, |e| {
            hold_curve(e, config.clamp_min_percent, config.clamp_max_percent)
        }),
        Phase::CoalBed | Phase::Idle | Phase::Safety => 0,
    }
}

/// Proportional term plus a correction on the exhaust slope.
#[derive(Debug, Default)]
pub struct AdaptiveSlope {
    last: Option<(Timestamp, f32)>,
}

impl AdaptiveSlope {
    pub fn compute(&mut self, temp_f: f32, now: Timestamp, config: &BurnConfig) -> u8 {
        let rate = self.last.map_or(0.0, |(at, prev)| {
            let dt = now.duration_since(at).as_secs_f32().max(MIN_DT_SECS);
            (temp_f - prev) / dt
        });
        self.last = Some((now, temp_f));

        let error = f32::from(config.setpoint_f) - temp_f;
        (error * ADAPTIVE_GAIN + config.adaptive_slope * rate)
            .clamp(0.0, 100.0)
            .round() as u8
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Interchangeable demand strategy, selected by [`BurnConfig::burn_logic`].
pub enum DemandCurve {
    PhaseCurve,
    Pid(ProfiledPid),
    Adaptive(AdaptiveSlope),
}

impl Default for DemandCurve {
    fn default() -> Self {
        Self::PhaseCurve
    }
}

impl DemandCurve {
    pub fn for_logic(logic: BurnLogic) -> Self {
        match logic {
            BurnLogic::PhaseCurve => Self::PhaseCurve,
            BurnLogic::Pid => Self::Pid(ProfiledPid::new()),
            BurnLogic::Adaptive => Self::Adaptive(AdaptiveSlope::default()),
        }
    }

    pub fn logic(&self) -> BurnLogic {
        match self {
            Self::PhaseCurve => BurnLogic::PhaseCurve,
            Self::Pid(_) => BurnLogic::Pid,
            Self::Adaptive(_) => BurnLogic::Adaptive,
        }
    }

    /// Fan demand (0–100 %) for this tick.  Follows a strategy change in
    /// `config` with fresh strategy memory.
    pub fn compute(
        &mut self,
        phase: Phase,
        smoothed_f: Option<f32>,
        now: Timestamp,
        config: &BurnConfig,
    ) -> u8 {
        if self.logic() != config.burn_logic {
            info!("DEMAND: strategy {:?} -> {:?}", self.logic(), config.burn_logic);
            *self = Self::for_logic(config.burn_logic);
        }

        let error_f = smoothed_f.map(|t| f32::from(config.setpoint_f) - t);
        if !matches!(phase, Phase::Ramp | Phase::Hold) {
            return compute_demand(phase, error_f, config);
        }
        match (self, smoothed_f) {
            (Self::Pid(pid), Some(t)) => pid.compute(t, now, config),
            (Self::Adaptive(a), Some(t)) => a.compute(t, now, config),
            _ => compute_demand(phase, error_f, config),
        }
    }

    /// Drop accumulated strategy memory.
    pub fn reset(&mut self) {
        match self {
            Self::PhaseCurve => {}
            Self::Pid(pid) => pid.reset(),
            Self::Adaptive(a) => a.reset(),
        }
    }
}
