//! Integration tests for the config dirty-flag and auto-save policy.

use crate::mock_hw::{MockNvs, RecordingSink, ms};

use boilerctl::adapters::nvs::NvsAdapter;
use boilerctl::app::commands::OperatorCommand;
use boilerctl::app::events::AppEvent;
use boilerctl::app::ports::{ConfigError, ConfigPort};
use boilerctl::app::service::BurnService;
use boilerctl::config::{BurnConfig, BurnLogic};

fn tuned() -> BurnConfig {
    BurnConfig {
        setpoint_f: 400,
        burn_logic: BurnLogic::Pid,
        ..BurnConfig::default()
    }
}

#[test]
fn update_autosaves_after_quiet_period() {
    let mut app = BurnService::new(BurnConfig::default());
    let mut sink = RecordingSink::default();
    let nvs = MockNvs::default();

    assert!(app.handle_command(OperatorCommand::UpdateConfig(tuned()), ms(1_000), &mut sink));
    assert!(app.is_config_dirty());

    assert!(!app.auto_save_if_needed(ms(5_999), &nvs, &mut sink));
    assert_eq!(nvs.saves.get(), 0);

    assert!(app.auto_save_if_needed(ms(6_000), &nvs, &mut sink));
    assert_eq!(nvs.saves.get(), 1);
    assert_eq!(nvs.load(), Ok(tuned()));
    assert!(!app.is_config_dirty());
    assert!(sink.events.contains(&AppEvent::ConfigSaved));

    assert!(!app.auto_save_if_needed(ms(20_000), &nvs, &mut sink));
    assert_eq!(nvs.saves.get(), 1);
}

#[test]
fn save_command_flushes_without_waiting() {
    let mut app = BurnService::new(BurnConfig::default());
    let mut sink = RecordingSink::default();
    let nvs = MockNvs::default();

    app.handle_command(OperatorCommand::UpdateConfig(tuned()), ms(1_000), &mut sink);
    app.handle_command(OperatorCommand::SaveConfig, ms(1_100), &mut sink);
    assert!(app.auto_save_if_needed(ms(1_100), &nvs, &mut sink));
    assert_eq!(nvs.load(), Ok(tuned()));
}

#[test]
fn failed_save_stays_dirty_and_retries() {
    let mut app = BurnService::new(BurnConfig::default());
    let mut sink = RecordingSink::default();
    let broken = MockNvs {
        fail: true,
        ..MockNvs::default()
    };

    app.handle_command(OperatorCommand::UpdateConfig(tuned()), ms(0), &mut sink);
    assert!(!app.auto_save_if_needed(ms(5_000), &broken, &mut sink));
    assert!(app.is_config_dirty());
    assert!(sink.events.contains(&AppEvent::ConfigSaveFailed(ConfigError::IoError)));

    let nvs = MockNvs::default();
    assert!(app.auto_save_if_needed(ms(5_100), &nvs, &mut sink));
    assert!(!app.is_config_dirty());
}

#[test]
fn invalid_update_is_rejected_and_not_saved() {
    let mut app = BurnService::new(BurnConfig::default());
    let mut sink = RecordingSink::default();
    let bad = BurnConfig {
        flue_low_f: 300,
        flue_recovery_f: 305,
        ..BurnConfig::default()
    };

    assert!(!app.handle_command(OperatorCommand::UpdateConfig(bad), ms(0), &mut sink));
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::CommandRejected { command: "UpdateConfig", .. })
    ));
    assert!(!app.is_config_dirty());
    assert_eq!(app.config(), &BurnConfig::default());
}

#[test]
fn force_save_writes_through_the_nvs_adapter() {
    let mut app = BurnService::new(BurnConfig::default());
    let mut sink = RecordingSink::default();
    let nvs = NvsAdapter::new().unwrap();

    app.handle_command(OperatorCommand::UpdateConfig(tuned()), ms(0), &mut sink);
    app.force_save_if_dirty(&nvs, &mut sink);
    assert!(!app.is_config_dirty());

    let reloaded = nvs.load().unwrap();
    assert_eq!(reloaded, tuned());
    let fresh = BurnService::new(reloaded);
    assert_eq!(fresh.config().setpoint_f, 400);
}
