//! Burn-phase state machine.
//!
//! A function-pointer phase table plus a precedence layer in front of it:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ step(smoothed, now, config)                                   │
//! │   1. Safety latch     → Safety, demand 0, damper closed       │
//! │   2. Boost window     → Boost, demand 100 (falls through when │
//! │                          the window has elapsed)              │
//! │   3. Coal-bed entry   → CoalBed after N min below flue-low    │
//! │   4. PhaseTable[current].on_update  → Option<next phase>      │
//! │   5. DemandCurve::compute(phase, temp)                        │
//! │   6. damper = phase not in {Idle, Safety}                     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rule reads the same `now` and the same `&BurnConfig`, and no rule
//! can fail.  Transitions run `on_exit` for the phase being left and
//! `on_enter` for the next one; both only touch the [`PhaseTimers`].

pub mod context;
pub mod states;

use core::time::Duration;

use log::{error, info, warn};
use serde::Serialize;

use crate::clock::Timestamp;
use crate::config::BurnConfig;
use crate::control::demand::DemandCurve;
use context::{ActiveTimer, HOLD_STABILITY, PhaseTimers, RAMP_STABILITY, TickContext, TimerKind};

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Burn phases.  Must stay in sync with [`states::build_phase_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Phase {
    Ramp = 0,
    Hold = 1,
    Idle = 2,
    CoalBed = 3,
    Boost = 4,
    Safety = 5,
}

impl Phase {
    /// Total number of phases, used to size the table array.
    pub const COUNT: usize = 6;

    pub const ALL: [Phase; Phase::COUNT] = [
        Self::Ramp,
        Self::Hold,
        Self::Idle,
        Self::CoalBed,
        Self::Boost,
        Self::Safety,
    ];

    /// Convert a table index back to `Phase`.  Out-of-range falls back to
    /// `Safety`.
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_else(|| {
            debug_assert!(false, "invalid phase index: {idx}");
            Self::Safety
        })
    }

    /// Damper position is a pure function of phase.
    pub fn damper_open(self) -> bool {
        !matches!(self, Self::Idle | Self::Safety)
    }

    /// Phases whose entry wipes the fan shaper's memory.
    pub fn resets_shaping(self) -> bool {
        matches!(self, Self::Boost | Self::Idle | Self::Safety)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Runs once on each transition.
pub type PhaseActionFn = fn(&mut PhaseTimers);

/// Per-tick transition rule.  Returns `Some(next)` to move.
pub type PhaseUpdateFn = fn(&mut TickContext<'_>) -> Option<Phase>;

/// One row of the phase table.
pub struct PhaseDescriptor {
    pub id: Phase,
    pub name: &'static str,
    pub on_enter: Option<PhaseActionFn>,
    pub on_exit: Option<PhaseActionFn>,
    pub on_update: PhaseUpdateFn,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of one controller step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOutput {
    pub phase: Phase,
    /// Fan demand before shaping (0–100 %).
    pub demand: u8,
    pub damper_open: bool,
}

/// A running boost window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoostWindow {
    started: Timestamp,
    /// Per-request override; `None` uses `boost_time_secs`.
    duration: Option<Duration>,
}

impl BoostWindow {
    fn duration(&self, config: &BurnConfig) -> Duration {
        self.duration
            .unwrap_or_else(|| Duration::from_secs(u64::from(config.boost_time_secs)))
    }
}

// ---------------------------------------------------------------------------
// PhaseController
// ---------------------------------------------------------------------------

/// Owns the current phase, the phase timers, the boost window, the safety
/// latch and the demand strategy.
pub struct PhaseController {
    table: [PhaseDescriptor; Phase::COUNT],
    current: usize,
    timers: PhaseTimers,
    boost: Option<BoostWindow>,
    safety_latched: bool,
    demand: DemandCurve,
    transitions: u32,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    /// A controller resting in Ramp.  Call [`start`](Self::start) to run
    /// the start-up boost.
    pub fn new() -> Self {
        Self {
            table: states::build_phase_table(),
            current: Phase::Ramp as usize,
            timers: PhaseTimers::default(),
            boost: None,
            safety_latched: false,
            demand: DemandCurve::default(),
            transitions: 0,
        }
    }

    /// Initialise: every burn starts with a boost.
    pub fn start(&mut self, now: Timestamp) {
        info!("PHASE: controller starting with boost");
        self.boost = Some(BoostWindow {
            started: now,
            duration: None,
        });
        self.set_phase(Phase::Boost);
    }

    // ── Per-tick evaluation ───────────────────────────────────

    /// Advance the state machine by one tick.
    pub fn step(
        &mut self,
        smoothed_f: Option<f32>,
        now: Timestamp,
        config: &BurnConfig,
    ) -> PhaseOutput {
        // 1. Safety dominates everything.
        if self.safety_latched {
            self.set_phase(Phase::Safety);
            self.timers.clear_all();
            return self.output(smoothed_f, now, config);
        }

        // 2. Boost window.
        if let Some(boost) = self.boost {
            if now.duration_since(boost.started) < boost.duration(config) {
                self.set_phase(Phase::Boost);
                return self.output(smoothed_f, now, config);
            }
            info!("BOOST: window elapsed");
            self.boost = None;
            self.set_phase(Phase::Ramp);
        }

        // 3. Coal-bed entry, from any phase that got this far.
        self.evaluate_coal_bed(smoothed_f, now, config);

        // 4. Phase-specific rule.
        let update = self.table[self.current].on_update;
        let next = {
            let mut ctx = TickContext {
                smoothed_f,
                now,
                config,
                timers: &mut self.timers,
            };
            update(&mut ctx)
        };
        if let Some(next) = next {
            self.set_phase(next);
        }

        self.output(smoothed_f, now, config)
    }

    // ── Operator requests ─────────────────────────────────────

    /// Start (or restart) a boost window.  Refused while Safety is latched.
    pub fn request_boost(&mut self, now: Timestamp, duration: Option<Duration>) -> bool {
        if self.safety_latched {
            warn!("PHASE: boost refused, safety latched");
            return false;
        }
        self.boost = Some(BoostWindow { started: now, duration });
        self.timers.coal_bed.disarm();
        self.set_phase(Phase::Boost);
        true
    }

    /// Park the controller in Idle.  Refused while Safety is latched.
    pub fn request_idle(&mut self) -> bool {
        if self.safety_latched {
            warn!("PHASE: idle refused, safety latched");
            return false;
        }
        self.boost = None;
        self.set_phase(Phase::Idle);
        true
    }

    /// Return from Idle or CoalBed to Ramp.
    pub fn resume(&mut self) -> bool {
        if !matches!(self.phase(), Phase::Idle | Phase::CoalBed) {
            return false;
        }
        self.timers.clear_all();
        self.set_phase(Phase::Ramp);
        true
    }

    /// Re-initialise as at power-up: timers cleared, boost re-armed.
    /// Refused while Safety is latched.
    pub fn restart(&mut self, now: Timestamp) -> bool {
        if self.safety_latched {
            warn!("PHASE: restart refused, safety latched");
            return false;
        }
        self.timers.clear_all();
        self.demand.reset();
        self.start(now);
        true
    }

    /// External fault signal: latch Safety.
    pub fn latch_safety(&mut self) {
        if !self.safety_latched {
            error!("PHASE: safety latched");
        }
        self.safety_latched = true;
        self.boost = None;
        self.set_phase(Phase::Safety);
    }

    /// Release the Safety latch and resume in Ramp.
    pub fn clear_safety(&mut self) -> bool {
        if !self.safety_latched {
            return false;
        }
        info!("PHASE: safety cleared, resuming in Ramp");
        self.safety_latched = false;
        self.set_phase(Phase::Ramp);
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        Phase::from_index(self.current)
    }

    pub fn timers(&self) -> &PhaseTimers {
        &self.timers
    }

    pub fn is_safety_latched(&self) -> bool {
        self.safety_latched
    }

    pub fn is_boosting(&self) -> bool {
        self.boost.is_some()
    }

    /// Number of phase transitions since construction.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// The countdown most relevant to the current phase, if any.
    pub fn active_timer(&self, now: Timestamp, config: &BurnConfig) -> Option<ActiveTimer> {
        let phase_timer = match self.phase() {
            Phase::Boost => self.boost.map(|b| {
                let left = b.duration(config).saturating_sub(now.duration_since(b.started));
                ActiveTimer::new(TimerKind::Boost, left)
            }),
            Phase::Ramp => self
                .timers
                .hold
                .remaining(now, HOLD_STABILITY)
                .map(|left| ActiveTimer::new(TimerKind::HoldStability, left)),
            Phase::Hold => self
                .timers
                .ramp_fallback
                .remaining(now, RAMP_STABILITY)
                .map(|left| ActiveTimer::new(TimerKind::RampFallback, left)),
            _ => None,
        };
        phase_timer.or_else(|| {
            self.timers
                .coal_bed
                .remaining(now, coal_bed_hold(config))
                .map(|left| ActiveTimer::new(TimerKind::CoalBedEntry, left))
        })
    }

    // ── Internal ──────────────────────────────────────────────

    fn evaluate_coal_bed(&mut self, smoothed_f: Option<f32>, now: Timestamp, config: &BurnConfig) {
        let low = smoothed_f.is_some_and(|t| t < f32::from(config.flue_low_f));
        if !low {
            self.timers.coal_bed.disarm();
            return;
        }
        self.timers.coal_bed.arm(now);
        if self.timers.coal_bed.has_elapsed(now, coal_bed_hold(config)) {
            if self.phase() != Phase::CoalBed {
                info!(
                    "COALBED: exhaust below {}\u{00b0}F for {} min",
                    config.flue_low_f, config.coal_bed_timer_minutes
                );
            }
            self.set_phase(Phase::CoalBed);
            self.timers.clear_stability();
        }
    }

    fn output(&mut self, smoothed_f: Option<f32>, now: Timestamp, config: &BurnConfig) -> PhaseOutput {
        let phase = self.phase();
        PhaseOutput {
            phase,
            demand: self.demand.compute(phase, smoothed_f, now, config),
            damper_open: phase.damper_open(),
        }
    }

    fn set_phase(&mut self, next: Phase) {
        let next_idx = next as usize;
        if next_idx == self.current {
            return;
        }

        info!(
            "PHASE: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(&mut self.timers);
        }
        self.current = next_idx;
        self.transitions = self.transitions.wrapping_add(1);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(&mut self.timers);
        }
        if !matches!(next, Phase::Ramp | Phase::Hold) {
            self.demand.reset();
        }
    }
}

fn coal_bed_hold(config: &BurnConfig) -> Duration {
    Duration::from_secs(u64::from(config.coal_bed_timer_minutes) * 60)
}
