//! Integration tests for the sensor → safety → phase → shaper → actuator
//! pipeline, driven tick by tick through `BurnService`.

use crate::mock_hw::{ActuatorCall, MockHardware, ms, run, started};

use boilerctl::app::commands::OperatorCommand;
use boilerctl::app::events::AppEvent;
use boilerctl::config::BurnConfig;
use boilerctl::error::{ActuatorError, SafetyFault};
use boilerctl::fsm::Phase;
use boilerctl::fsm::context::TimerKind;

// ── Start-up boost ────────────────────────────────────────────

#[test]
fn startup_boost_runs_full_fan_until_expiry() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(200.0);

    let snap = run(&mut app, &mut hw, &mut sink, 0, 30_000);
    assert_eq!(snap.phase, Phase::Boost);
    assert_eq!(snap.fan_percent, 100);
    assert!(snap.damper_open);

    let snap = app.tick(ms(29_950), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Boost);
    let t = snap.active_timer.unwrap();
    assert_eq!(t.kind, TimerKind::Boost);
    assert_eq!(t.remaining_ms, 50);

    let snap = app.tick(ms(30_100), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Ramp);
    assert_eq!(snap.fan_percent, 100);
    assert!(sink.events.contains(&AppEvent::PhaseChanged {
        from: Phase::Boost,
        to: Phase::Ramp,
    }));
}

// ── Ramp → Hold → Ramp ────────────────────────────────────────

#[test]
fn ramp_reaches_hold_and_fan_settles_at_clamp_min() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(370.0);

    let snap = run(&mut app, &mut hw, &mut sink, 0, 32_100);
    assert_eq!(snap.phase, Phase::Ramp);
    let t = snap.active_timer.unwrap();
    assert_eq!(t.kind, TimerKind::HoldStability);
    assert_eq!(t.remaining_ms, 3_000);

    let snap = run(&mut app, &mut hw, &mut sink, 32_100, 35_000);
    assert_eq!(snap.phase, Phase::Ramp);
    let snap = app.tick(ms(35_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Hold);

    let snap = run(&mut app, &mut hw, &mut sink, 35_100, 95_000);
    assert_eq!(snap.phase, Phase::Hold);
    assert_eq!(snap.fan_percent, 10);
    assert_eq!(hw.last_fan(), Some(10));
    assert_eq!(hw.last_damper(), Some(true));
}

#[test]
fn hold_fan_follows_the_error_curve() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(370.0);
    run(&mut app, &mut hw, &mut sink, 0, 35_100);
    assert_eq!(app.phase(), Phase::Hold);

    // 30 °F below setpoint: steep zone, demand 60.
    hw.temp_f = 320.0;
    let snap = run(&mut app, &mut hw, &mut sink, 35_100, 95_000);
    assert_eq!(snap.phase, Phase::Hold);
    assert!(
        (55..=60).contains(&snap.fan_percent),
        "fan should approach 60, got {}",
        snap.fan_percent
    );
}

#[test]
fn hold_falls_back_to_ramp_when_exhaust_drops() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(370.0);
    run(&mut app, &mut hw, &mut sink, 0, 35_100);
    assert_eq!(app.phase(), Phase::Hold);

    hw.temp_f = 280.0;
    let snap = run(&mut app, &mut hw, &mut sink, 35_100, 36_000);
    assert_eq!(snap.phase, Phase::Hold);
    let snap = run(&mut app, &mut hw, &mut sink, 36_000, 45_000);
    assert_eq!(snap.phase, Phase::Ramp);
}

// ── Sensor conditioning ───────────────────────────────────────

#[test]
fn spike_is_rejected_once_then_accepted() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    run(&mut app, &mut hw, &mut sink, 0, 2_000);
    assert_eq!(hw.reads, 4);

    hw.temp_f = 500.0;
    run(&mut app, &mut hw, &mut sink, 2_000, 2_500);
    assert_eq!(app.conditioner().cached_f(), Some(300.0));
    assert_eq!(app.conditioner().rejections().spike, 1);

    app.tick(ms(2_500), &mut hw, &mut sink);
    assert_eq!(app.conditioner().cached_f(), Some(500.0));
    assert_eq!(app.conditioner().rejections().spike, 1);
}

#[test]
fn fault_bit_samples_are_ignored() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    run(&mut app, &mut hw, &mut sink, 0, 1_000);

    hw.tc_fault = true;
    hw.temp_f = f32::NAN;
    let snap = run(&mut app, &mut hw, &mut sink, 1_000, 5_000);
    assert_eq!(app.conditioner().cached_f(), Some(300.0));
    assert!(snap.smoothed_temp_f.is_some_and(|t| (t - 300.0).abs() < 0.01));
    assert_eq!(snap.fault_flags, 0);
    assert!(app.conditioner().rejections().fault >= 7);
}

// ── Safety ────────────────────────────────────────────────────

#[test]
fn stale_sensor_latches_safety_until_operator_clears() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    hw.bus_down = true;

    let snap = run(&mut app, &mut hw, &mut sink, 0, 10_100);
    assert_eq!(snap.phase, Phase::Boost);
    assert_eq!(snap.smoothed_temp_f, None);

    let snap = app.tick(ms(10_100), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Safety);
    assert_eq!(snap.fan_percent, 0);
    assert!(!snap.damper_open);
    assert_eq!(snap.fault_flags, SafetyFault::SensorStale.mask());
    assert!(sink.events.contains(&AppEvent::FaultDetected(SafetyFault::SensorStale.mask())));

    assert!(!app.handle_command(OperatorCommand::ClearSafety, ms(10_200), &mut sink));

    hw.bus_down = false;
    let snap = run(&mut app, &mut hw, &mut sink, 10_200, 20_000);
    assert_eq!(snap.fault_flags, 0);
    assert_eq!(snap.phase, Phase::Safety, "latch outlives the fault");
    assert!(sink.events.contains(&AppEvent::FaultCleared));
    assert!(hw.calls[hw.calls.len() - 2..]
        .iter()
        .all(|c| matches!(c, ActuatorCall::Fan(0) | ActuatorCall::Damper(false))));

    assert!(app.handle_command(OperatorCommand::ClearSafety, ms(20_000), &mut sink));
    let snap = app.tick(ms(20_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Ramp);
    assert!(snap.damper_open);
    assert_eq!(snap.fan_percent, 25);
}

#[test]
fn over_temperature_latches_safety() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    run(&mut app, &mut hw, &mut sink, 0, 1_000);

    hw.temp_f = 1_100.0;
    let snap = run(&mut app, &mut hw, &mut sink, 1_000, 6_000);
    assert_eq!(snap.phase, Phase::Safety);
    assert_ne!(snap.fault_flags & SafetyFault::OverTemperature.mask(), 0);
    assert_eq!(hw.last_fan(), Some(0));
    assert_eq!(hw.last_damper(), Some(false));
}

#[test]
fn safety_output_holds_for_every_tick() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(370.0);
    run(&mut app, &mut hw, &mut sink, 0, 40_000);

    assert!(app.handle_command(OperatorCommand::LatchSafety, ms(40_000), &mut sink));
    hw.calls.clear();
    run(&mut app, &mut hw, &mut sink, 40_000, 50_000);
    assert!(!hw.calls.is_empty());
    assert!(hw
        .calls
        .iter()
        .all(|c| matches!(c, ActuatorCall::Fan(0) | ActuatorCall::Damper(false))));
}

// ── Coal-bed saver ────────────────────────────────────────────

#[test]
fn low_exhaust_enters_coal_bed_and_recovers() {
    let config = BurnConfig {
        coal_bed_timer_minutes: 1,
        ..BurnConfig::default()
    };
    let (mut app, mut sink) = started(config);
    let mut hw = MockHardware::at(200.0);

    let snap = run(&mut app, &mut hw, &mut sink, 0, 60_100);
    assert_eq!(snap.phase, Phase::Ramp);
    let t = snap.active_timer.unwrap();
    assert_eq!(t.kind, TimerKind::CoalBedEntry);
    assert_eq!(t.remaining_ms, 30_000);

    run(&mut app, &mut hw, &mut sink, 60_100, 90_000);
    assert_eq!(app.phase(), Phase::Ramp);
    let snap = app.tick(ms(90_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::CoalBed);
    assert!(snap.damper_open);

    let snap = run(&mut app, &mut hw, &mut sink, 90_100, 120_000);
    assert_eq!(snap.phase, Phase::CoalBed);
    assert_eq!(snap.fan_percent, 0);

    hw.temp_f = 330.0;
    let snap = run(&mut app, &mut hw, &mut sink, 120_000, 135_000);
    assert_eq!(snap.phase, Phase::Ramp);
}

// ── Actuator faults ───────────────────────────────────────────

#[test]
fn fan_write_failure_is_reported_and_loop_continues() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    hw.fail_fan = true;

    let snap = run(&mut app, &mut hw, &mut sink, 0, 1_000);
    assert_eq!(snap.phase, Phase::Boost);
    assert_eq!(
        sink.count(|e| *e == AppEvent::ActuatorFailed(ActuatorError::PwmWriteFailed)),
        10
    );
    assert_eq!(hw.last_damper(), Some(true));
    assert_eq!(app.tick_count(), 10);

    hw.fail_fan = false;
    app.tick(ms(1_000), &mut hw, &mut sink);
    assert_eq!(hw.last_fan(), Some(100));
}
