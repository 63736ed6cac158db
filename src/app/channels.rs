//! Inter-task plumbing around the control loop.
//!
//! Uses `embassy-sync` primitives so a keypad/UI task and the control
//! loop can share state without heap allocation.
//!
//! ```text
//! ┌──────────────┐ OperatorCommand ┌──────────────┐
//! │  UI / keypad │───────────────▶│ Control loop │
//! │    task      │◀───────────────│   (sync)     │
//! └──────────────┘   SNAPSHOT     └──────────────┘
//! ```
//!
//! The control loop is the only writer of [`SNAPSHOT`] and the only
//! reader of [`COMMANDS`].

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::Vec;
use log::warn;

use super::commands::OperatorCommand;
use super::events::ControllerSnapshot;

/// Channel depth for operator commands.
pub const COMMAND_DEPTH: usize = 8;

/// Inbound command channel: UI task → control loop.
pub static COMMANDS: Channel<CriticalSectionRawMutex, OperatorCommand, COMMAND_DEPTH> =
    Channel::new();

/// Latest published snapshot: control loop → readers.
pub static SNAPSHOT: Mutex<CriticalSectionRawMutex, Cell<Option<ControllerSnapshot>>> =
    Mutex::new(Cell::new(None));

/// Queue a command for the next control tick.  Returns `false` (and drops
/// the command) when the queue is full.
pub fn submit(cmd: OperatorCommand) -> bool {
    match COMMANDS.try_send(cmd) {
        Ok(()) => true,
        Err(TrySendError::Full(cmd)) => {
            warn!("command queue full, dropping {}", cmd.name());
            false
        }
    }
}

/// Take every queued command, oldest first.
pub fn drain_pending() -> Vec<OperatorCommand, COMMAND_DEPTH> {
    let mut out = Vec::new();
    while let Ok(cmd) = COMMANDS.try_receive() {
        if out.push(cmd).is_err() {
            break;
        }
    }
    out
}

/// Replace the published snapshot.
pub fn publish(snapshot: ControllerSnapshot) {
    SNAPSHOT.lock(|cell| cell.set(Some(snapshot)));
}

/// Most recently published snapshot, if the loop has ticked.
pub fn latest() -> Option<ControllerSnapshot> {
    SNAPSHOT.lock(Cell::get)
}
