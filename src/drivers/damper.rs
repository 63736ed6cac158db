//! Flue damper relay.
//!
//! The relay board is active-low: driving the pin LOW energises the coil
//! and opens the damper.  A de-energised relay (pin HIGH or floating)
//! leaves the damper closed.

use embedded_hal::digital::OutputPin;
use log::info;

use crate::error::ActuatorError;

pub struct DamperRelay<P> {
    pin: P,
    open: Option<bool>,
}

impl<P: OutputPin> DamperRelay<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, open: None }
    }

    pub fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        let res = if open {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        if self.open != Some(open) {
            info!("DAMPER: {}", if open { "open" } else { "closed" });
        }
        self.open = Some(open);
        Ok(())
    }

    /// `None` until the first successful write.
    pub fn is_open(&self) -> Option<bool> {
        self.open
    }
}
