//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the thermocouple and both actuator drivers, exposing them through
//! [`ThermocouplePort`] and [`ActuatorPort`].  This is the only module in
//! the system that touches actual hardware.  The drivers are generic over
//! `embedded-hal` traits, so the same adapter runs against ESP-IDF
//! peripherals on target and against fakes on the host.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal::spi::SpiDevice;

use crate::app::ports::{ActuatorPort, ThermocouplePort};
use crate::drivers::damper::DamperRelay;
use crate::drivers::fan::FanDriver;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::RawSample;
use crate::sensors::max31855::Max31855;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<S, F, D> {
    thermocouple: Max31855<S>,
    fan: FanDriver<F>,
    damper: DamperRelay<D>,
}

impl<S, F, D> HardwareAdapter<S, F, D>
where
    S: SpiDevice,
    F: SetDutyCycle,
    D: OutputPin,
{
    pub fn new(thermocouple: Max31855<S>, fan: FanDriver<F>, damper: DamperRelay<D>) -> Self {
        Self {
            thermocouple,
            fan,
            damper,
        }
    }

    /// Fan off and damper closed, regardless of controller state.
    pub fn all_off(&mut self) -> Result<(), ActuatorError> {
        self.fan.stop()?;
        self.damper.set_open(false)
    }

    pub fn fan_percent(&self) -> u8 {
        self.fan.current_percent()
    }

    pub fn damper_open(&self) -> Option<bool> {
        self.damper.is_open()
    }
}

// ── ThermocouplePort implementation ───────────────────────────

impl<S, F, D> ThermocouplePort for HardwareAdapter<S, F, D>
where
    S: SpiDevice,
    F: SetDutyCycle,
    D: OutputPin,
{
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        self.thermocouple.read_raw()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<S, F, D> ActuatorPort for HardwareAdapter<S, F, D>
where
    S: SpiDevice,
    F: SetDutyCycle,
    D: OutputPin,
{
    fn set_fan_pwm(&mut self, percent: u8) -> Result<(), ActuatorError> {
        self.fan.set_percent(percent)
    }

    fn set_damper(&mut self, open: bool) -> Result<(), ActuatorError> {
        self.damper.set_open(open)
    }
}
