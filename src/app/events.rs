//! Outbound application events.
//!
//! The [`BurnService`](super::service::BurnService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, refresh a display,
//! forward as telemetry.

use serde::Serialize;

use crate::error::ActuatorError;
use crate::fsm::Phase;
use crate::fsm::context::ActiveTimer;

use super::ports::ConfigError;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial phase).
    Started(Phase),

    /// The controller moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// One or more safety faults were raised (bitmask).
    FaultDetected(u8),

    /// All safety faults have gone away.  The latch may still be set.
    FaultCleared,

    /// An operator command was not carried out.
    CommandRejected {
        command: &'static str,
        reason: &'static str,
    },

    /// A fan or damper write failed; retried on the next tick.
    ActuatorFailed(ActuatorError),

    /// Configuration written to storage.
    ConfigSaved,

    /// Configuration could not be written.
    ConfigSaveFailed(ConfigError),

    /// Periodic snapshot.
    Telemetry(ControllerSnapshot),
}

/// Read-only view of the controller, published once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub phase: Phase,
    /// `None` until the first valid exhaust sample.
    pub smoothed_temp_f: Option<f32>,
    pub fan_percent: u8,
    pub damper_open: bool,
    pub active_timer: Option<ActiveTimer>,
    /// Safety supervisor bitmask (see `SafetyFault::mask`).
    pub fault_flags: u8,
}

impl ControllerSnapshot {
    /// Snapshot of a controller that has not ticked yet: everything off.
    pub fn initial(phase: Phase) -> Self {
        Self {
            phase,
            smoothed_temp_f: None,
            fan_percent: 0,
            damper_open: false,
            active_timer: None,
            fault_flags: 0,
        }
    }
}
