//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements        | Connects to                     |
//! |------------|-------------------|---------------------------------|
//! | `hardware` | ThermocouplePort  | MAX31855 over SPI               |
//! |            | ActuatorPort      | fan PWM, damper relay GPIO      |
//! | `log_sink` | EventSink         | Serial log output               |
//! | `nvs`      | ConfigPort        | NVS / in-memory store           |
//! | `time`     | ClockPort         | ESP32 system timer / `Instant`  |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
