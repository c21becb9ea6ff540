//! Hardware-free logic for the battery-powered sensor node
//!
//! Two independent engines, both driven by the application loop:
//! - [`dht::DhtDecoder`] captures and decodes a frame from a DHT-family
//!   sensor over a single bidirectional data line
//! - [`rtc::CalendarEngine`] keeps the tick timebase on top of the calendar
//!   RTC and programs the wake-up alarm
//!
//! Peripherals come in through the traits of `hal-abstractions`, so
//! everything here runs against simulated hardware in host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dht;
pub mod error;
pub mod irq;
pub mod rtc;
pub mod timing;

#[cfg(test)]
mod sim;

pub use config::{DecoderConfig, RtcConfig};
pub use dht::{DhtDecoder, Reading, SensorModel, SensorResult};
pub use error::{CalendarError, CaptureError, DecoderInitError, Phase, RegistryError};
pub use irq::{LineHandler, LineId, LineIrqRegistry};
pub use rtc::{CalendarEngine, CalendarTime, Ticks, WakeSignal};
