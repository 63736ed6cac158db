//! Port traits — the hexagonal boundary between the burn controller and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BurnService (domain)
//! ```
//!
//! Driven adapters (thermocouple, fan/damper, event sinks, config storage)
//! implement these traits.  The [`BurnService`](super::service::BurnService)
//! consumes them via generics, so the control core never touches hardware
//! directly.
//!
//! - **ConfigPort** implementations MUST validate before persisting and
//!   MUST hand back only repaired, validated configuration on load.
//! - Actuator writes are idempotent; the service rewrites both outputs on
//!   every tick, so a failed write is logged and retried implicitly.

use crate::clock::Timestamp;
use crate::config::BurnConfig;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::RawSample;

// ───────────────────────────────────────────────────────────────
// Thermocouple port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Logical read contract of the exhaust thermocouple.
///
/// One call is one bounded, synchronous bus transaction.  `Err` covers
/// a failed transaction; a chip-level fault is reported in-band through
/// [`RawSample::fault`].
pub trait ThermocouplePort {
    fn read_raw(&mut self) -> Result<RawSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the fan and damper.
pub trait ActuatorPort {
    /// Set combustion fan speed (0–100 %).
    fn set_fan_pwm(&mut self, percent: u8) -> Result<(), ActuatorError>;

    /// Open or close the air damper relay.
    fn set_damper(&mut self, open: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Read once per tick by the loop owner.
pub trait ClockPort {
    fn now(&self) -> Timestamp;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, LCD,
/// telemetry).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the burn configuration.
///
/// Out-of-range values are rejected with [`ConfigError::ValidationFailed`]
/// on save, never silently clamped.  On load, a stored blob is passed
/// through [`BurnConfig::repaired`] so the core only ever observes a
/// consistent configuration.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`BurnConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<BurnConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &BurnConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
