//! Unified error types for the boiler controller firmware.
//!
//! The control core itself is total and never fails; these types cover
//! the edges (sensor transactions, actuator writes, configuration).
//! All variants are `Copy` so they can be passed through the service
//! and logged without allocation.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation at the hardware/storage edge funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermocouple could not be read or returned unusable data.
    Sensor(SensorError),
    /// A fan or damper write failed.
    Actuator(ActuatorError),
    /// A safety condition latched the controller.
    Safety(SafetyFault),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction itself failed.
    BusFailed,
    /// The chip reported its fault bit (open or shorted thermocouple).
    FaultBit,
    /// Decoded temperature is outside the physically plausible range.
    OutOfRange,
    /// Jump from the previous accepted sample exceeds the spike limit.
    Spike,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "bus transaction failed"),
            Self::FaultBit => write!(f, "thermocouple fault bit set"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Spike => write!(f, "single-sample spike"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// Relay GPIO write failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Conditions that latch the controller into Safety.  Accumulated in a
/// bitfield by the safety supervisor so that several can be active at
/// once and cleared individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// No accepted exhaust sample for longer than the stale timeout.
    SensorStale = 0b0000_0001,
    /// Smoothed exhaust above the configured hard limit.
    OverTemperature = 0b0000_0010,
    /// Operator emergency stop.
    EStop = 0b0000_0100,
}

impl SafetyFault {
    pub const ALL: [SafetyFault; 3] = [Self::SensorStale, Self::OverTemperature, Self::EStop];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorStale => write!(f, "exhaust sensor stale"),
            Self::OverTemperature => write!(f, "exhaust over temperature"),
            Self::EStop => write!(f, "operator emergency stop"),
        }
    }
}

impl From<SafetyFault> for Error {
    fn from(e: SafetyFault) -> Self {
        Self::Safety(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
