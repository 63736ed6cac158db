//! Integration tests for operator commands handled between ticks.

use crate::mock_hw::{MockHardware, ms, run, started};

use boilerctl::app::channels;
use boilerctl::app::commands::OperatorCommand;
use boilerctl::app::events::AppEvent;
use boilerctl::config::{BurnConfig, FanMode};
use boilerctl::error::SafetyFault;
use boilerctl::fsm::Phase;

#[test]
fn idle_stops_fan_and_closes_damper_until_resume() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    run(&mut app, &mut hw, &mut sink, 0, 31_000);
    assert_eq!(app.phase(), Phase::Ramp);

    assert!(app.handle_command(OperatorCommand::RequestIdle, ms(31_000), &mut sink));
    assert!(sink.events.contains(&AppEvent::PhaseChanged {
        from: Phase::Ramp,
        to: Phase::Idle,
    }));
    let snap = run(&mut app, &mut hw, &mut sink, 31_000, 40_000);
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.fan_percent, 0);
    assert!(!snap.damper_open);

    assert!(app.handle_command(OperatorCommand::Resume, ms(40_000), &mut sink));
    let snap = app.tick(ms(40_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Ramp);
    assert!(snap.damper_open);
}

#[test]
fn resume_is_refused_outside_idle_and_coal_bed() {
    let (mut app, mut sink) = started(BurnConfig::default());
    assert!(!app.handle_command(OperatorCommand::Resume, ms(0), &mut sink));
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::CommandRejected { command: "Resume", .. })
    ));
    assert_eq!(app.phase(), Phase::Boost);
}

#[test]
fn boost_duration_override_applies_to_that_boost_only() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    run(&mut app, &mut hw, &mut sink, 0, 31_000);

    let cmd = OperatorCommand::RequestBoost {
        duration_secs: Some(5),
    };
    assert!(app.handle_command(cmd, ms(31_000), &mut sink));
    let snap = run(&mut app, &mut hw, &mut sink, 31_000, 36_000);
    assert_eq!(snap.phase, Phase::Boost);
    assert_eq!(snap.fan_percent, 100);
    let snap = app.tick(ms(36_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Ramp);

    let cmd = OperatorCommand::RequestBoost { duration_secs: None };
    assert!(app.handle_command(cmd, ms(40_000), &mut sink));
    let snap = run(&mut app, &mut hw, &mut sink, 40_000, 50_000);
    assert_eq!(snap.phase, Phase::Boost);
    assert_eq!(snap.active_timer.unwrap().remaining_ms, 20_100);
}

#[test]
fn estop_refuses_boost_and_releases_on_clear() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    run(&mut app, &mut hw, &mut sink, 0, 1_000);

    assert!(app.handle_command(OperatorCommand::LatchSafety, ms(1_000), &mut sink));
    assert_eq!(app.fault_flags(), SafetyFault::EStop.mask());
    let snap = app.tick(ms(1_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Safety);
    assert_eq!(snap.fan_percent, 0);
    assert!(!snap.damper_open);

    let boost = OperatorCommand::RequestBoost { duration_secs: None };
    assert!(!app.handle_command(boost, ms(1_100), &mut sink));
    assert!(!app.handle_command(OperatorCommand::RequestIdle, ms(1_100), &mut sink));
    assert!(!app.handle_command(OperatorCommand::Restart, ms(1_100), &mut sink));
    assert_eq!(app.phase(), Phase::Safety);

    assert!(app.handle_command(OperatorCommand::ClearSafety, ms(1_200), &mut sink));
    assert_eq!(app.fault_flags(), 0);
    let snap = app.tick(ms(1_200), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Ramp);
}

#[test]
fn restart_rearms_the_startup_boost() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(370.0);
    run(&mut app, &mut hw, &mut sink, 0, 60_000);
    assert_eq!(app.phase(), Phase::Hold);

    assert!(app.handle_command(OperatorCommand::Restart, ms(60_000), &mut sink));
    let snap = app.tick(ms(60_000), &mut hw, &mut sink);
    assert_eq!(snap.phase, Phase::Boost);
    assert_eq!(snap.fan_percent, 100);
}

#[test]
fn config_update_takes_effect_on_next_tick() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);
    app.handle_command(OperatorCommand::RequestIdle, ms(0), &mut sink);
    let snap = run(&mut app, &mut hw, &mut sink, 0, 1_000);
    assert_eq!(snap.fan_percent, 0);

    let clamp = BurnConfig {
        fan_mode: FanMode::Clamp,
        clamp_min_percent: 20,
        ..BurnConfig::default()
    };
    assert!(app.handle_command(OperatorCommand::UpdateConfig(clamp.clone()), ms(1_000), &mut sink));
    assert_eq!(app.config(), &clamp);
    let snap = app.tick(ms(1_000), &mut hw, &mut sink);
    assert_eq!(snap.fan_percent, 20);
}

// The only test in this binary that touches the static channel.
#[test]
fn commands_arrive_through_the_static_channel() {
    let (mut app, mut sink) = started(BurnConfig::default());
    let mut hw = MockHardware::at(300.0);

    assert!(channels::submit(OperatorCommand::RequestIdle));
    for cmd in channels::drain_pending() {
        app.handle_command(cmd, ms(0), &mut sink);
    }
    let snap = app.tick(ms(0), &mut hw, &mut sink);
    channels::publish(snap);

    assert_eq!(app.phase(), Phase::Idle);
    assert_eq!(channels::latest().map(|s| s.phase), Some(Phase::Idle));
    assert!(channels::drain_pending().is_empty());
}
