//! MAX31855 K-type thermocouple amplifier.
//!
//! Read-only SPI device: one 32-bit big-endian frame per transaction.
//!
//! ```text
//!  31            18 17 16 15            4  3  2  1  0
//! ┌────────────────┬──┬──┬───────────────┬──┬──┬──┬──┐
//! │ TC temp (14b)  │ r│ F│ cold junction │ r│SV│SG│OC│
//! └────────────────┴──┴──┴───────────────┴──┴──┴──┴──┘
//! ```
//!
//! The thermocouple field is two's complement in 0.25 °C steps.  The
//! chip sets `F` when any of the OC/SG/SV bits is set.

use embedded_hal::spi::SpiDevice;
use log::trace;

use crate::app::ports::ThermocouplePort;
use crate::error::SensorError;

use super::RawSample;

/// Any of the open/short fault flags.
const FAULT_BIT: u32 = 0x0001_0000;
const TC_SHIFT: u32 = 18;
const TC_MASK: u32 = 0x3FFF;
const TC_SIGN: u16 = 0x2000;
const DEG_C_PER_LSB: f32 = 0.25;

/// Decode one frame into a Fahrenheit sample.
pub fn decode(frame: u32) -> RawSample {
    if frame & FAULT_BIT != 0 {
        return RawSample {
            temp_f: f32::NAN,
            fault: true,
        };
    }

    let mut counts = ((frame >> TC_SHIFT) & TC_MASK) as u16;
    if counts & TC_SIGN != 0 {
        counts |= 0xC000;
    }
    let temp_c = f32::from(counts as i16) * DEG_C_PER_LSB;
    RawSample {
        temp_f: celsius_to_fahrenheit(temp_c),
        fault: false,
    }
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

/// Thermocouple behind an `embedded-hal` SPI device (chip select is
/// handled by the device).
pub struct Max31855<S> {
    spi: S,
}

impl<S: SpiDevice> Max31855<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    /// Clock out one raw frame.
    pub fn read_frame(&mut self) -> Result<u32, SensorError> {
        let mut buf = [0u8; 4];
        self.spi
            .read(&mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        let frame = u32::from_be_bytes(buf);
        trace!("MAX31855 frame 0x{frame:08X}");
        Ok(frame)
    }

    pub fn release(self) -> S {
        self.spi
    }
}

impl<S: SpiDevice> ThermocouplePort for Max31855<S> {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        self.read_frame().map(decode)
    }
}
