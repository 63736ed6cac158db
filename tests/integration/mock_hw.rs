//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  The thermocouple
//! side serves a settable temperature and can simulate bus and chip
//! faults.

use std::cell::{Cell, RefCell};

use boilerctl::app::events::{AppEvent, ControllerSnapshot};
use boilerctl::app::ports::{ActuatorPort, ConfigError, ConfigPort, EventSink, ThermocouplePort};
use boilerctl::app::service::BurnService;
use boilerctl::clock::Timestamp;
use boilerctl::config::BurnConfig;
use boilerctl::error::{ActuatorError, SensorError};
use boilerctl::sensors::RawSample;

/// Control loop period used by every scenario.
pub const TICK_MS: u64 = 100;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Fan(u8),
    Damper(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temp_f: f32,
    /// Chip reports its fault bit.
    pub tc_fault: bool,
    /// SPI transaction fails outright.
    pub bus_down: bool,
    pub fail_fan: bool,
    pub reads: u32,
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn at(temp_f: f32) -> Self {
        Self {
            temp_f,
            tc_fault: false,
            bus_down: false,
            fail_fan: false,
            reads: 0,
            calls: Vec::new(),
        }
    }

    pub fn last_fan(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Fan(p) => Some(*p),
            ActuatorCall::Damper(_) => None,
        })
    }

    pub fn last_damper(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Damper(open) => Some(*open),
            ActuatorCall::Fan(_) => None,
        })
    }
}

impl ThermocouplePort for MockHardware {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        self.reads += 1;
        if self.bus_down {
            return Err(SensorError::BusFailed);
        }
        Ok(RawSample {
            temp_f: self.temp_f,
            fault: self.tc_fault,
        })
    }
}

impl ActuatorPort for MockHardware {
    fn set_fan_pwm(&mut self, percent: u8) -> Result<(), ActuatorError> {
        if self.fail_fan {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.calls.push(ActuatorCall::Fan(percent));
        Ok(())
    }

    fn set_damper(&mut self, open: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Damper(open));
        Ok(())
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    pub stored: RefCell<Option<BurnConfig>>,
    pub saves: Cell<u32>,
    pub fail: bool,
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<BurnConfig, ConfigError> {
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &BurnConfig) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::IoError);
        }
        self.saves.set(self.saves.get() + 1);
        *self.stored.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── Recording event sink ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Driving helpers ───────────────────────────────────────────

pub fn ms(t: u64) -> Timestamp {
    Timestamp::from_millis(t)
}

/// Tick every [`TICK_MS`] over `[from, to)` and return the last snapshot.
pub fn run(
    app: &mut BurnService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    from: u64,
    to: u64,
) -> ControllerSnapshot {
    let mut snap = app.snapshot();
    let mut t = from;
    while t < to {
        snap = app.tick(ms(t), hw, sink);
        t += TICK_MS;
    }
    snap
}

/// A started service on default configuration.
pub fn started(config: BurnConfig) -> (BurnService, RecordingSink) {
    let mut app = BurnService::new(config);
    let mut sink = RecordingSink::default();
    app.start(ms(0), &mut sink);
    (app, sink)
}
