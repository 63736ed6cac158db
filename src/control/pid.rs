//! PID controller for exhaust temperature
//!
//! Proportional-integral-derivative loop on `setpoint − exhaust`, with
//! three gain profiles picked by the size and sign of the error.

use crate::clock::Timestamp;
use crate::config::{BurnConfig, PidGains, PidProfiles};

/// Error magnitude (°F) beyond which the below/above profiles take over.
pub const PROFILE_BAND_F: f32 = 10.0;
/// Smallest time step used for the I and D terms (seconds).
pub const MIN_DT_SECS: f32 = 0.001;
/// Output range: fan percent.
const OUTPUT_MIN: f32 = 0.0;
const OUTPUT_MAX: f32 = 100.0;

/// PID controller
pub struct PidController {
    gains: PidGains,
    setpoint: f32,
    integral: f32,
    prev_error: Option<f32>,
}

impl PidController {
    pub fn new(gains: PidGains, setpoint: f32) -> Self {
        Self {
            gains,
            setpoint,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Update setpoint
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Swap gains without disturbing the accumulated state
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Compute PID output given current measurement
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;
        let dt = dt.max(MIN_DT_SECS);

        // Proportional
        let p = self.gains.kp * error;

        // Integral (with anti-windup)
        self.integral += error * dt;
        let i = self.gains.ki * self.integral;

        // Derivative; zero on the first sample
        let derivative = self.prev_error.map_or(0.0, |prev| (error - prev) / dt);
        let d = self.gains.kd * derivative;

        self.prev_error = Some(error);

        // Clamp output
        let output = (p + i + d).clamp(OUTPUT_MIN, OUTPUT_MAX);

        // Anti-windup: if output is saturated, stop integrating
        if output >= OUTPUT_MAX || output <= OUTPUT_MIN {
            self.integral -= error * dt;
        }

        output
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

/// Pick the gain profile for an error of `setpoint − exhaust`.
pub fn select_profile(profiles: &PidProfiles, error: f32) -> PidGains {
    if error < -PROFILE_BAND_F {
        profiles.below
    } else if error > PROFILE_BAND_F {
        profiles.above
    } else {
        profiles.normal
    }
}

/// [`PidController`] driven from wall-clock timestamps and the live
/// [`BurnConfig`], re-selecting the gain profile on every evaluation.
pub struct ProfiledPid {
    pid: PidController,
    last_at: Option<Timestamp>,
}

impl Default for ProfiledPid {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfiledPid {
    pub fn new() -> Self {
        Self {
            pid: PidController::new(PidProfiles::default().normal, 0.0),
            last_at: None,
        }
    }

    /// Fan demand (0–100 %) for the current exhaust temperature.
    pub fn compute(&mut self, temp_f: f32, now: Timestamp, config: &BurnConfig) -> u8 {
        let setpoint = f32::from(config.setpoint_f);
        let error = setpoint - temp_f;
        let dt = self
            .last_at
            .map_or(MIN_DT_SECS, |last| now.duration_since(last).as_secs_f32());
        self.last_at = Some(now);

        self.pid.set_target(setpoint);
        self.pid.set_gains(select_profile(&config.pid, error));
        self.pid.compute(temp_f, dt).round() as u8
    }

    pub fn reset(&mut self) {
        self.pid.reset();
        self.last_at = None;
    }
}
