//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.  Only the phase-specific rules live here; Safety,
//! Boost and coal-bed entry outrank them and are applied by
//! [`PhaseController::step`](super::PhaseController::step) before the
//! table is consulted.
//!
//! ```text
//!            [in band ≥ 5 s]
//!   RAMP ────────────────────▶ HOLD
//!    ▲  ◀──────────────────────  │
//!    │     [far below ≥ 3 s]     │
//!    │                           │
//!    └──[above band, at once]── COALBED ◀──[below flue-low for N min]── any but BOOST/SAFETY
//!
//!  BOOST ──[duration elapsed]──▶ RAMP        IDLE, SAFETY: operator exit only
//! ```

use log::info;

use super::context::{HOLD_STABILITY, PhaseTimers, RAMP_STABILITY, TickContext};
use super::{Phase, PhaseDescriptor};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static phase table, indexed by `Phase as usize`.
pub fn build_phase_table() -> [PhaseDescriptor; Phase::COUNT] {
    [
        PhaseDescriptor {
            id: Phase::Ramp,
            name: "Ramp",
            on_enter: None,
            on_exit: Some(ramp_exit),
            on_update: ramp_update,
        },
        PhaseDescriptor {
            id: Phase::Hold,
            name: "Hold",
            on_enter: None,
            on_exit: Some(hold_exit),
            on_update: hold_update,
        },
        PhaseDescriptor {
            id: Phase::Idle,
            name: "Idle",
            on_enter: Some(clear_all_timers),
            on_exit: None,
            on_update: no_transition,
        },
        PhaseDescriptor {
            id: Phase::CoalBed,
            name: "CoalBed",
            on_enter: Some(coal_bed_enter),
            on_exit: None,
            on_update: coal_bed_update,
        },
        PhaseDescriptor {
            id: Phase::Boost,
            name: "Boost",
            on_enter: Some(clear_all_timers),
            on_exit: None,
            on_update: no_transition,
        },
        PhaseDescriptor {
            id: Phase::Safety,
            name: "Safety",
            on_enter: Some(clear_all_timers),
            on_exit: None,
            on_update: no_transition,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared actions
// ═══════════════════════════════════════════════════════════════════════════

fn clear_all_timers(timers: &mut PhaseTimers) {
    timers.clear_all();
}

fn no_transition(_ctx: &mut TickContext<'_>) -> Option<Phase> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RAMP: full fan until exhaust settles in the hold band
// ═══════════════════════════════════════════════════════════════════════════

fn ramp_exit(timers: &mut PhaseTimers) {
    timers.hold.disarm();
}

fn ramp_update(ctx: &mut TickContext<'_>) -> Option<Phase> {
    if !ctx.temp_at_or_above(ctx.hold_band_low_f()) {
        ctx.timers.hold.disarm();
        return None;
    }

    ctx.timers.hold.arm(ctx.now);
    if ctx.timers.hold.has_elapsed(ctx.now, HOLD_STABILITY) {
        info!(
            "RAMP: exhaust {:.0}\u{00b0}F in band for {}s, holding",
            ctx.smoothed_f.unwrap_or_default(),
            HOLD_STABILITY.as_secs()
        );
        return Some(Phase::Hold);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HOLD: modulate on the hold curve
// ═══════════════════════════════════════════════════════════════════════════

fn hold_exit(timers: &mut PhaseTimers) {
    timers.clear_stability();
}

fn hold_update(ctx: &mut TickContext<'_>) -> Option<Phase> {
    if !ctx.temp_below(ctx.fallback_low_f()) {
        ctx.timers.ramp_fallback.disarm();
        return None;
    }

    ctx.timers.ramp_fallback.arm(ctx.now);
    if ctx.timers.ramp_fallback.has_elapsed(ctx.now, RAMP_STABILITY) {
        info!(
            "HOLD: exhaust {:.0}\u{00b0}F below {:.0}\u{00b0}F for {}s, ramping",
            ctx.smoothed_f.unwrap_or_default(),
            ctx.fallback_low_f(),
            RAMP_STABILITY.as_secs()
        );
        return Some(Phase::Ramp);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COALBED: fan off, wait for the fire to come back
// ═══════════════════════════════════════════════════════════════════════════

fn coal_bed_enter(timers: &mut PhaseTimers) {
    timers.clear_stability();
}

fn coal_bed_update(ctx: &mut TickContext<'_>) -> Option<Phase> {
    if ctx.temp_above(ctx.hold_band_low_f()) {
        info!(
            "COALBED: exhaust recovered to {:.0}\u{00b0}F, ramping",
            ctx.smoothed_f.unwrap_or_default()
        );
        return Some(Phase::Ramp);
    }
    None
}
