//! Boiler controller firmware — main entry point.
//!
//! Hexagonal architecture with a fixed-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter  Monotonic   │
//! │  (Thermocouple+Actuator)(EventSink)    (Config)    Clock       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              BurnService (pure logic)                  │    │
//! │  │  Conditioner · Safety · PhaseController · Shaper       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  app::channels (operator commands in, snapshots out)           │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use boilerctl::adapters::hardware::HardwareAdapter;
use boilerctl::adapters::log_sink::LogEventSink;
use boilerctl::adapters::nvs::NvsAdapter;
use boilerctl::adapters::time::MonotonicClock;
use boilerctl::app::channels;
use boilerctl::app::ports::{ClockPort, ConfigPort};
use boilerctl::app::service::BurnService;
use boilerctl::config::BurnConfig;
use boilerctl::drivers::damper::DamperRelay;
use boilerctl::drivers::fan::FanDriver;
use boilerctl::pins;
use boilerctl::sensors::max31855::Max31855;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  boilerctl v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            BurnConfig::default()
        }
    };

    // ── 3. Construct hardware ─────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number in `pins` is claimed exactly once, here.
    let (tc_sclk, tc_miso, tc_cs, fan_pin, damper_pin) = unsafe {
        (
            AnyOutputPin::new(pins::TC_SCLK_GPIO),
            AnyInputPin::new(pins::TC_MISO_GPIO),
            AnyOutputPin::new(pins::TC_CS_GPIO),
            AnyOutputPin::new(pins::FAN_PWM_GPIO),
            AnyOutputPin::new(pins::DAMPER_RELAY_GPIO),
        )
    };

    let spi = SpiDriver::new_without_sdo(
        peripherals.spi2,
        tc_sclk,
        tc_miso,
        &SpiDriverConfig::new(),
    )?;
    let tc_device = SpiDeviceDriver::new(
        spi,
        Some(tc_cs),
        &SpiConfig::new().baudrate(Hertz(pins::TC_SPI_BAUD_HZ)),
    )?;

    let fan_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(pins::FAN_PWM_FREQ_HZ))
            .resolution(Resolution::Bits8),
    )?;
    let fan_pwm = LedcDriver::new(peripherals.ledc.channel0, &fan_timer, fan_pin)?;
    let damper_out = PinDriver::output(damper_pin)?;

    let mut hw = HardwareAdapter::new(
        Max31855::new(tc_device),
        FanDriver::new(fan_pwm),
        DamperRelay::new(damper_out),
    );
    if let Err(e) = hw.all_off() {
        warn!("initial actuator reset failed: {}", e);
    }

    let mut log_sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    // ── 4. Construct app service ──────────────────────────────
    let mut app = BurnService::new(config);
    app.start(clock.now(), &mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now();

        for cmd in channels::drain_pending() {
            app.handle_command(cmd, now, &mut log_sink);
        }

        let snapshot = app.tick(now, &mut hw, &mut log_sink);
        channels::publish(snapshot);

        // Config auto-save (5 s debounce after last change).
        app.auto_save_if_needed(now, &nvs, &mut log_sink);

        std::thread::sleep(Duration::from_millis(u64::from(
            app.config().control_loop_interval_ms,
        )));
    }
}
