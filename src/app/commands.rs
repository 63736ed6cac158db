//! Inbound operator commands.
//!
//! These represent actions requested by the outside world (keypad menu,
//! display, serial console) that the
//! [`BurnService`](super::service::BurnService) interprets and acts upon
//! between control ticks.

use crate::config::BurnConfig;

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    /// Run the fan flat out for a while.  `None` uses the configured
    /// boost duration.  Refused while Safety is latched.
    RequestBoost { duration_secs: Option<u16> },

    /// Park the burner: fan demand 0, damper closed.
    RequestIdle,

    /// Leave Idle or CoalBed and ramp up again.
    Resume,

    /// Re-initialise as at power-up (timers cleared, start-up boost).
    Restart,

    /// Operator emergency stop.
    LatchSafety,

    /// Release the Safety latch.  Refused while any fault is active.
    ClearSafety,

    /// Swap in a new configuration (validated before it is applied).
    UpdateConfig(BurnConfig),

    /// Persist the current configuration without waiting for the debounce.
    SaveConfig,
}

impl OperatorCommand {
    /// Short name for logs and rejection events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestBoost { .. } => "RequestBoost",
            Self::RequestIdle => "RequestIdle",
            Self::Resume => "Resume",
            Self::Restart => "Restart",
            Self::LatchSafety => "LatchSafety",
            Self::ClearSafety => "ClearSafety",
            Self::UpdateConfig(_) => "UpdateConfig",
            Self::SaveConfig => "SaveConfig",
        }
    }
}
