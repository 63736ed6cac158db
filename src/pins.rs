//! GPIO / peripheral assignments for the boiler controller board
//! (ESP32-S3).
//!
//! Single source of truth: `main` wires peripherals from these values
//! rather than hard-coding them.

// ---------------------------------------------------------------------------
// Exhaust thermocouple (MAX31855 on SPI2, read-only)
// ---------------------------------------------------------------------------

pub const TC_SCLK_GPIO: i32 = 12;
pub const TC_MISO_GPIO: i32 = 13;
/// Chip select, active LOW.
pub const TC_CS_GPIO: i32 = 10;
/// MAX31855 tops out at 5 MHz.
pub const TC_SPI_BAUD_HZ: u32 = 4_000_000;

// ---------------------------------------------------------------------------
// Combustion fan (LEDC PWM into the fan speed controller)
// ---------------------------------------------------------------------------

pub const FAN_PWM_GPIO: i32 = 4;
/// 25 kHz keeps the fan drive inaudible.
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;

// ---------------------------------------------------------------------------
// Flue damper relay (active LOW: pin LOW = coil energised = damper open)
// ---------------------------------------------------------------------------

pub const DAMPER_RELAY_GPIO: i32 = 5;
