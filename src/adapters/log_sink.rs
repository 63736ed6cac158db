//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production).  Telemetry snapshots are
//! rendered as one JSON object per line so a serial capture can be
//! parsed offline.  A display or MQTT adapter would implement the same
//! trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {json}"),
                Err(e) => warn!("TELEM | encode failed: {e}"),
            },
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::FaultDetected(flags) => {
                error!("FAULT | detected, flags=0b{:08b}", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::Started(phase) => {
                info!("START | initial_phase={:?}", phase);
            }
            AppEvent::CommandRejected { command, reason } => {
                warn!("CMD | {command} rejected: {reason}");
            }
            AppEvent::ActuatorFailed(e) => {
                warn!("ACTUATOR | {e}");
            }
            AppEvent::ConfigSaved => {
                info!("CONFIG | saved");
            }
            AppEvent::ConfigSaveFailed(e) => {
                warn!("CONFIG | save failed: {e}");
            }
        }
    }
}
