#![cfg_attr(not(test), no_std)]

//! # ProximityPi-rs
//! ## An ultrasonic proximity monitor in Rust
//!
//! Features:
//! - Distance ranging over a single shared trigger/echo line
//! - Intruder alarm when something comes within 10cm
//! - Temperature and humidity on button press
//! - 16x2 character display output
//! - Readings streamed as InfluxDB line protocol
//!
//! The library is hardware independent: everything is generic over
//! `embedded-hal` traits plus the small ports defined here
//! ([`pin::FlexPin`], [`timer::Clock`], [`rendering::CharacterDisplay`],
//! [`sensors::ClimateSensor`], [`telemetry::TimeSeriesSink`]).
//! The firmware binary plugs RP2040 peripherals into them.

pub(crate) mod macros;

pub mod alarm;
pub mod config;
pub mod error;
pub mod fixed;
pub mod monitor;
pub mod pin;
pub mod ranging;
pub mod rendering;
pub mod sensors;
pub mod telemetry;
pub mod timer;

#[cfg(test)]
mod mock;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use fixed::Hundredths;
pub use monitor::{Mode, Monitor, Peripherals, Shutdown, Step};
pub use ranging::{DistanceReading, RangeSample, RangeSampler};
