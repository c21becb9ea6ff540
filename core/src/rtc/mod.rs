//! Real-time calendar and wake-up alarm engine
//!
//! Time is kept as a two-digit-year calendar in the RTC and exposed as
//! [`Ticks`]: seconds since the epoch in the high bits, sub-second ticks in
//! the low bits.

mod alarm;
mod calendar;
mod engine;
mod ticks;
mod wake;

pub use alarm::{alarm_target, exact_alarm};
pub use calendar::{
    days_before_month, days_in_month, days_since_epoch, is_leap_year, CalendarTime,
    SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};
pub use engine::CalendarEngine;
pub use ticks::{TickScale, Ticks};
pub use wake::{alarm_fired, WakeSignal};
