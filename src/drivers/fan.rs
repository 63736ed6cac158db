//! Combustion fan driver.
//!
//! Variable-speed control via a PWM channel.  Duty is given in percent
//! (0–100) and scaled onto the channel's own resolution, so the same
//! driver works for an 8-bit LEDC timer and a 10-bit one.
//!
//! The driver is a dumb actuator: shaping and the Safety override live
//! upstream in the control core.

use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::error::ActuatorError;

pub struct FanDriver<P> {
    pwm: P,
    percent: u8,
}

impl<P: SetDutyCycle> FanDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, percent: 0 }
    }

    /// Set fan speed.  Values above 100 are clamped.
    pub fn set_percent(&mut self, percent: u8) -> Result<(), ActuatorError> {
        let percent = percent.min(100);
        self.pwm
            .set_duty_cycle_percent(percent)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        if percent != self.percent {
            debug!("FAN: {}% -> {}%", self.percent, percent);
        }
        self.percent = percent;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.set_percent(0)
    }

    /// Last percentage successfully written.
    pub fn current_percent(&self) -> u8 {
        self.percent
    }
}
