//! Application service — the hexagonal core.
//!
//! [`BurnService`] owns the sensor conditioner, the phase controller, the
//! fan shaper and the safety supervisor, and runs them as one pipeline per
//! tick.  All I/O flows through port traits injected at call sites, so the
//! whole service is testable with mock adapters.
//!
//! ```text
//!  ThermocouplePort ──▶ ┌──────────────────────────────────────┐ ──▶ EventSink
//!                       │             BurnService              │
//!      ActuatorPort ◀── │ Conditioner · Safety · Phase · Shaper│
//!                       └──────────────────────────────────────┘
//! ```

use core::time::Duration;

use log::{info, warn};

use crate::clock::Timestamp;
use crate::config::BurnConfig;
use crate::control::shaper::ActuatorShaper;
use crate::fsm::{Phase, PhaseController};
use crate::safety::{SafetyInputs, SafetySupervisor};
use crate::sensors::SensorConditioner;

use super::commands::OperatorCommand;
use super::events::{AppEvent, ControllerSnapshot};
use super::ports::{ActuatorPort, ConfigPort, EventSink, ThermocouplePort};

/// Quiet period after the last config change before it is auto-saved.
pub const CONFIG_SAVE_DEBOUNCE: Duration = Duration::from_secs(5);
/// Interval between telemetry events.
pub const TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);

// ───────────────────────────────────────────────────────────────
// BurnService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct BurnService {
    config: BurnConfig,
    conditioner: SensorConditioner,
    controller: PhaseController,
    shaper: ActuatorShaper,
    safety: SafetySupervisor,
    snapshot: ControllerSnapshot,
    tick_count: u64,
    config_dirty_since: Option<Timestamp>,
    save_requested: bool,
    last_telemetry: Option<Timestamp>,
}

impl BurnService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the controller; call [`start`](Self::start) next.
    pub fn new(config: BurnConfig) -> Self {
        let controller = PhaseController::new();
        let snapshot = ControllerSnapshot::initial(controller.phase());
        Self {
            config,
            conditioner: SensorConditioner::new(),
            controller,
            shaper: ActuatorShaper::new(),
            safety: SafetySupervisor::new(Timestamp::ZERO),
            snapshot,
            tick_count: 0,
            config_dirty_since: None,
            save_requested: false,
            last_telemetry: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm the start-up boost and begin supervising from `now`.
    pub fn start(&mut self, now: Timestamp, sink: &mut impl EventSink) {
        self.safety = SafetySupervisor::new(now);
        self.controller.start(now);
        self.snapshot.phase = self.controller.phase();
        sink.emit(&AppEvent::Started(self.controller.phase()));
        info!("BurnService started in {:?}", self.controller.phase());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle:
    /// sensor → safety → phase controller → shaper → actuators.
    ///
    /// `now` is read once by the caller and used for every comparison in
    /// the tick.  The `hw` parameter satisfies **both**
    /// [`ThermocouplePort`] and [`ActuatorPort`], which avoids a double
    /// mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now: Timestamp,
        hw: &mut (impl ThermocouplePort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> ControllerSnapshot {
        self.tick_count += 1;
        let prev_phase = self.controller.phase();
        let prev_faults = self.safety.faults();

        // 1. Sensor conditioning
        let raw = self.conditioner.acquire(now, hw);
        let smoothed = self.conditioner.smooth(raw);

        // 2. Safety evaluation
        let faults = self.safety.evaluate(
            &SafetyInputs {
                now,
                smoothed_f: smoothed,
                last_valid_at: self.conditioner.last_valid_at(),
            },
            &self.config,
        );
        if faults != 0 && !self.controller.is_safety_latched() {
            warn!("Safety fault! flags=0b{:08b}", faults);
            self.controller.latch_safety();
        }
        if faults != 0 && faults != prev_faults {
            sink.emit(&AppEvent::FaultDetected(faults));
        } else if faults == 0 && prev_faults != 0 {
            sink.emit(&AppEvent::FaultCleared);
        }

        // 3. Phase controller (pure state logic)
        let out = self.controller.step(smoothed, now, &self.config);

        // 4. Fan shaping
        let fan = self.shaper.apply(out.demand, out.phase, &self.config);

        // 5. Actuators via ActuatorPort
        if let Err(e) = hw.set_fan_pwm(fan) {
            warn!("fan write failed: {e}");
            sink.emit(&AppEvent::ActuatorFailed(e));
        }
        if let Err(e) = hw.set_damper(out.damper_open) {
            warn!("damper write failed: {e}");
            sink.emit(&AppEvent::ActuatorFailed(e));
        }

        // 6. Emit phase change if the controller moved
        if out.phase != prev_phase {
            sink.emit(&AppEvent::PhaseChanged {
                from: prev_phase,
                to: out.phase,
            });
        }

        self.snapshot = ControllerSnapshot {
            phase: out.phase,
            smoothed_temp_f: smoothed,
            fan_percent: fan,
            damper_open: out.damper_open,
            active_timer: self.controller.active_timer(now, &self.config),
            fault_flags: faults,
        };

        // 7. Periodic telemetry
        let due = self
            .last_telemetry
            .is_none_or(|last| now.duration_since(last) >= TELEMETRY_INTERVAL);
        if due {
            self.last_telemetry = Some(now);
            sink.emit(&AppEvent::Telemetry(self.snapshot));
        }

        self.snapshot
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command between ticks.
    /// Returns `true` if the command was carried out.
    pub fn handle_command(
        &mut self,
        cmd: OperatorCommand,
        now: Timestamp,
        sink: &mut impl EventSink,
    ) -> bool {
        let name = cmd.name();
        let prev_phase = self.controller.phase();

        let outcome: Result<(), &'static str> = match cmd {
            OperatorCommand::RequestBoost { duration_secs } => {
                let duration = duration_secs.map(|s| Duration::from_secs(u64::from(s)));
                if self.controller.request_boost(now, duration) {
                    Ok(())
                } else {
                    Err("safety latched")
                }
            }
            OperatorCommand::RequestIdle => {
                if self.controller.request_idle() {
                    Ok(())
                } else {
                    Err("safety latched")
                }
            }
            OperatorCommand::Resume => {
                if self.controller.resume() {
                    Ok(())
                } else {
                    Err("not idle or in coal-bed")
                }
            }
            OperatorCommand::Restart => {
                if self.controller.restart(now) {
                    self.shaper.reset();
                    Ok(())
                } else {
                    Err("safety latched")
                }
            }
            OperatorCommand::LatchSafety => {
                self.safety.set_estop(true);
                self.controller.latch_safety();
                sink.emit(&AppEvent::FaultDetected(self.safety.faults()));
                Ok(())
            }
            OperatorCommand::ClearSafety => self.clear_safety(),
            OperatorCommand::UpdateConfig(new_config) => match new_config.validate() {
                Ok(()) => {
                    self.config = new_config;
                    self.mark_config_dirty(now);
                    info!("Configuration updated at runtime");
                    Ok(())
                }
                Err(e) => {
                    warn!("Configuration rejected: {e}");
                    Err("invalid configuration")
                }
            },
            OperatorCommand::SaveConfig => {
                self.mark_config_dirty(now);
                self.save_requested = true;
                info!("Explicit config save requested (will flush on next auto-save check)");
                Ok(())
            }
        };

        let new_phase = self.controller.phase();
        if new_phase != prev_phase {
            sink.emit(&AppEvent::PhaseChanged {
                from: prev_phase,
                to: new_phase,
            });
        }

        match outcome {
            Ok(()) => {
                info!("command {name} accepted");
                true
            }
            Err(reason) => {
                warn!("command {name} rejected: {reason}");
                sink.emit(&AppEvent::CommandRejected {
                    command: name,
                    reason,
                });
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot published by the most recent tick.
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot
    }

    /// Current burn phase.
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.safety.faults()
    }

    /// The live configuration.
    pub fn config(&self) -> &BurnConfig {
        &self.config
    }

    pub fn conditioner(&self) -> &SensorConditioner {
        &self.conditioner
    }

    pub fn controller(&self) -> &PhaseController {
        &self.controller
    }

    // ── Internal ──────────────────────────────────────────────

    fn clear_safety(&mut self) -> Result<(), &'static str> {
        if !self.controller.is_safety_latched() {
            return Err("safety not latched");
        }
        self.safety.set_estop(false);
        if self.safety.has_faults() {
            return Err("faults still active");
        }
        self.controller.clear_safety();
        Ok(())
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.
    fn mark_config_dirty(&mut self, now: Timestamp) {
        self.config_dirty_since = Some(now);
    }

    /// Save the config once it has been unchanged for
    /// [`CONFIG_SAVE_DEBOUNCE`], or at once after `SaveConfig`.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(
        &mut self,
        now: Timestamp,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(since) = self.config_dirty_since else {
            return false;
        };
        if !self.save_requested && now.duration_since(since) < CONFIG_SAVE_DEBOUNCE {
            return false;
        }
        self.save(storage, sink)
    }

    /// Force-save if dirty (call before a controlled shutdown).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort, sink: &mut impl EventSink) {
        if self.config_dirty_since.is_some() {
            self.save(storage, sink);
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty_since.is_some()
    }

    fn save(&mut self, storage: &impl ConfigPort, sink: &mut impl EventSink) -> bool {
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty_since = None;
                self.save_requested = false;
                info!("Config saved");
                sink.emit(&AppEvent::ConfigSaved);
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                sink.emit(&AppEvent::ConfigSaveFailed(e));
                false
            }
        }
    }
}
