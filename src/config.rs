//! Burn configuration parameters
//!
//! All operator-tunable parameters for the boiler controller.  The control
//! core reads a [`BurnConfig`] by reference on every tick and never writes
//! it; persistence and validation belong to the [`ConfigPort`] adapter.
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Fan shaping policy applied after smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanMode {
    /// Fan never turns off: output is held at or above `clamp_min_percent`.
    Clamp,
    /// Fan may stop fully, gated by separate on/off thresholds.
    Hysteresis,
}

/// Which demand strategy drives the fan in Ramp/Hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnLogic {
    /// Phase-based demand curve (Ramp full, Hold three-zone curve).
    PhaseCurve,
    /// Three-profile PID on exhaust error.
    Pid,
    /// Proportional term plus exhaust-slope correction.
    Adaptive,
}

/// One set of PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// PID gain profiles, picked by the sign and size of the exhaust error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidProfiles {
    /// Exhaust well above setpoint (error < -10 °F).
    pub below: PidGains,
    /// Within ±10 °F of setpoint.
    pub normal: PidGains,
    /// Exhaust well below setpoint (error > 10 °F).
    pub above: PidGains,
}

impl Default for PidProfiles {
    fn default() -> Self {
        Self {
            below: PidGains { kp: 1.0, ki: 0.02, kd: 0.5 },
            normal: PidGains { kp: 2.0, ki: 0.05, kd: 1.0 },
            above: PidGains { kp: 3.0, ki: 0.1, kd: 1.5 },
        }
    }
}

/// Core burn configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnConfig {
    // --- Combustion targets ---
    /// Exhaust setpoint (°F)
    pub setpoint_f: i16,
    /// Tolerance band around the setpoint for Ramp/Hold decisions (°F)
    pub deadband_f: i16,

    // --- Fan shaping ---
    /// Minimum running fan output (0-100%)
    pub clamp_min_percent: u8,
    /// Maximum fan output outside Boost (0-100%)
    pub clamp_max_percent: u8,
    /// Clamp (always on) or hysteresis (may stop) policy
    pub fan_mode: FanMode,

    // --- Boost ---
    /// Boost duration (seconds)
    pub boost_time_secs: u16,

    // --- Coal-bed saver ---
    /// Sustained low-exhaust time before entering CoalBed (minutes)
    pub coal_bed_timer_minutes: u16,
    /// Exhaust below this arms the coal-bed entry timer (°F)
    pub flue_low_f: i16,
    /// Recovery threshold, kept at least 10 °F above `flue_low_f` (°F).
    /// Stored and validated only; no control rule reads it. CoalBed exits
    /// on `setpoint_f - deadband_f`.
    pub flue_recovery_f: i16,

    // --- Demand strategy ---
    pub burn_logic: BurnLogic,
    pub pid: PidProfiles,
    /// Gain on the exhaust dT/dt term for [`BurnLogic::Adaptive`]
    pub adaptive_slope: f32,

    // --- Safety supervisor ---
    /// Latch Safety when no valid sample arrives for this long (seconds)
    pub sensor_stale_timeout_secs: u16,
    /// Latch Safety when smoothed exhaust exceeds this (°F)
    pub exhaust_limit_f: i16,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

/// Ceiling for both flue thresholds (°F).
const FLUE_MAX_F: i16 = 900;
/// Minimum spacing between `flue_low_f` and `flue_recovery_f` (°F).
const FLUE_MIN_GAP_F: i16 = 10;

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            setpoint_f: 350,
            deadband_f: 25,

            clamp_min_percent: 10,
            clamp_max_percent: 100,
            fan_mode: FanMode::Hysteresis,

            boost_time_secs: 30,

            coal_bed_timer_minutes: 30,
            flue_low_f: 250,
            flue_recovery_f: 300,

            burn_logic: BurnLogic::PhaseCurve,
            pid: PidProfiles::default(),
            adaptive_slope: 0.5,

            sensor_stale_timeout_secs: 10,
            exhaust_limit_f: 1000,

            control_loop_interval_ms: 100, // 10 Hz
        }
    }
}

impl BurnConfig {
    /// Reject out-of-range or inconsistent values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=900).contains(&self.setpoint_f) {
            return Err(ConfigError::ValidationFailed("setpoint_f must be 100–900"));
        }
        if !(0..=200).contains(&self.deadband_f) {
            return Err(ConfigError::ValidationFailed("deadband_f must be 0–200"));
        }
        if self.clamp_min_percent > 100 || self.clamp_max_percent > 100 {
            return Err(ConfigError::ValidationFailed("fan clamps must be 0–100"));
        }
        if self.clamp_min_percent > self.clamp_max_percent {
            return Err(ConfigError::ValidationFailed(
                "clamp_min_percent must be <= clamp_max_percent",
            ));
        }
        if self.boost_time_secs > 1800 {
            return Err(ConfigError::ValidationFailed("boost_time_secs must be 0–1800"));
        }
        if self.coal_bed_timer_minutes > 720 {
            return Err(ConfigError::ValidationFailed(
                "coal_bed_timer_minutes must be 0–720",
            ));
        }
        if !(0..=FLUE_MAX_F).contains(&self.flue_low_f)
            || !(0..=FLUE_MAX_F).contains(&self.flue_recovery_f)
        {
            return Err(ConfigError::ValidationFailed("flue thresholds must be 0–900"));
        }
        if self.flue_recovery_f < self.flue_low_f + FLUE_MIN_GAP_F {
            return Err(ConfigError::ValidationFailed(
                "flue_recovery_f must be >= flue_low_f + 10",
            ));
        }
        if !self.adaptive_slope.is_finite() {
            return Err(ConfigError::ValidationFailed("adaptive_slope must be finite"));
        }
        if self.sensor_stale_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_stale_timeout_secs must be > 0",
            ));
        }
        if !(100..=2000).contains(&self.exhaust_limit_f) {
            return Err(ConfigError::ValidationFailed("exhaust_limit_f must be 100–2000"));
        }
        if !(10..=5000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 10–5000",
            ));
        }
        Ok(())
    }

    /// Repair a configuration read back from storage: every out-of-range
    /// field falls back to its default, `clamp_min_percent` is lowered to
    /// `clamp_max_percent`, and a recovery threshold too close to the low
    /// threshold is moved to `flue_low_f + 50` (capped at the 900 °F
    /// ceiling, lowering `flue_low_f` if there is no room for the gap).
    /// The result always passes [`validate`](Self::validate).
    pub fn repaired(mut self) -> Self {
        let d = Self::default();

        if !(100..=900).contains(&self.setpoint_f) {
            self.setpoint_f = d.setpoint_f;
        }
        if self.boost_time_secs > 1800 {
            self.boost_time_secs = d.boost_time_secs;
        }
        if !(0..=200).contains(&self.deadband_f) {
            self.deadband_f = d.deadband_f;
        }
        if self.clamp_min_percent > 100 {
            self.clamp_min_percent = d.clamp_min_percent;
        }
        if self.clamp_max_percent > 100 {
            self.clamp_max_percent = d.clamp_max_percent;
        }
        if self.clamp_min_percent > self.clamp_max_percent {
            self.clamp_min_percent = self.clamp_max_percent;
        }
        if self.coal_bed_timer_minutes > 720 {
            self.coal_bed_timer_minutes = d.coal_bed_timer_minutes;
        }
        if !(0..=FLUE_MAX_F).contains(&self.flue_low_f) {
            self.flue_low_f = d.flue_low_f;
        }
        self.flue_low_f = self.flue_low_f.min(FLUE_MAX_F - FLUE_MIN_GAP_F);
        if !(0..=FLUE_MAX_F).contains(&self.flue_recovery_f)
            || self.flue_recovery_f < self.flue_low_f + FLUE_MIN_GAP_F
        {
            self.flue_recovery_f = (self.flue_low_f + 50).min(FLUE_MAX_F);
        }
        if !self.adaptive_slope.is_finite() {
            self.adaptive_slope = d.adaptive_slope;
        }
        if self.sensor_stale_timeout_secs == 0 {
            self.sensor_stale_timeout_secs = d.sensor_stale_timeout_secs;
        }
        if !(100..=2000).contains(&self.exhaust_limit_f) {
            self.exhaust_limit_f = d.exhaust_limit_f;
        }
        if !(10..=5000).contains(&self.control_loop_interval_ms) {
            self.control_loop_interval_ms = d.control_loop_interval_ms;
        }
        self
    }
}
