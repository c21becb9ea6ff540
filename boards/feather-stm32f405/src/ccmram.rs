//! CCM RAM allocations
//!
//! The only module allowed to place statics with `#[link_section]`, which
//! `deny(unsafe_code)` rejects everywhere else.
//!
//! CCM RAM on the STM32F405RG: 64 KB at 0x1000_0000, CPU only (no DMA),
//! zero wait states. It is not initialised by the runtime, so anything placed
//! here must tolerate an arbitrary power-on value.
//!
//! Current allocations:
//! - `WAKE`: alarm-to-idle wake signal (1 byte)

#![allow(unsafe_code)]

use sensor_node_core::rtc::WakeSignal;

/// Raised by the RTC alarm interrupt, consumed by `idle`.
///
/// A stale power-on value costs at most one early measurement cycle.
#[link_section = ".ccmram"]
pub static WAKE: WakeSignal = WakeSignal::new();
