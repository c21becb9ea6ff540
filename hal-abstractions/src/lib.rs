//! Hardware abstraction traits for the sensor node firmware
//!
//! This crate defines the seams between the hardware-free logic in
//! `sensor-node-core` and the board support crates. BSPs implement these
//! traits; tests implement them with simulated peripherals.

#![no_std]
#![deny(unsafe_code)]

pub mod counter;
pub mod irq;
pub mod line;
pub mod rtc;

pub use counter::FreeRunningCounter;
pub use irq::{GlobalCriticalSection, InterruptLock};
pub use line::{DataLine, Direction};
pub use rtc::{AlarmMask, AlarmSpec, BackupRegisters, CalendarPeripheral, RtcDate, RtcTime};
