//! Boiler controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module; everything else builds
//! and tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod clock;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod sensors;
