//! Two-digit-year calendar arithmetic
//!
//! The calendar starts at year 0, January 1st, 00:00:00 and covers the years
//! `0..=99`. Inside that range every fourth year is a leap year, so the
//! Gregorian century rules never apply.
//!
//! Day counts use a closed form instead of iterating over years:
//! - `ceil(1461 * year / 4)` days before the year (year 0 is a leap year)
//! - `ceil(61 * (month - 1) / 2)` days before the month if every month
//!   alternated 31/30 days, minus a per-month correction
//! - `day - 1` days into the month

use hal_abstractions::{RtcDate, RtcTime};

use super::ticks::{TickScale, Ticks};

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 60 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: u32 = 24 * SECONDS_PER_HOUR;

const DAYS_IN_YEAR: u32 = 365;
const DAYS_IN_LEAP_YEAR: u32 = 366;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_IN_MONTH_LEAP: [u8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// Distance between the alternating 31/30 estimate and the real month start
const MONTH_CORRECTION: [u8; 12] = [0, 0, 2, 2, 2, 2, 2, 2, 1, 2, 1, 2];
const MONTH_CORRECTION_LEAP: [u8; 12] = [0, 0, 1, 1, 1, 1, 1, 1, 0, 1, 0, 1];

/// Leap years are the multiples of 4 within the two-digit epoch.
pub const fn is_leap_year(year: u8) -> bool {
    year % 4 == 0
}

/// Length of `month` (`1..=12`) in `year`.
pub const fn days_in_month(year: u8, month: u8) -> u8 {
    let index = month_index(month);
    if is_leap_year(year) {
        DAYS_IN_MONTH_LEAP[index]
    } else {
        DAYS_IN_MONTH[index]
    }
}

const fn month_index(month: u8) -> usize {
    let month = if month == 0 { 1 } else if month > 12 { 12 } else { month };
    (month - 1) as usize
}

const fn divc(x: u32, n: u32) -> u32 {
    (x + n - 1) / n
}

/// Days between January 1st and the first of `month`.
pub const fn days_before_month(year: u8, month: u8) -> u32 {
    let index = month_index(month);
    let correction = if is_leap_year(year) {
        MONTH_CORRECTION_LEAP[index]
    } else {
        MONTH_CORRECTION[index]
    };
    divc(index as u32 * (30 + 31), 2) - correction as u32
}

/// Days elapsed since the epoch's first day.
pub const fn days_since_epoch(year: u8, month: u8, day: u8) -> u32 {
    divc((DAYS_IN_YEAR * 3 + DAYS_IN_LEAP_YEAR) * year as u32, 4)
        + days_before_month(year, month)
        + day.saturating_sub(1) as u32
}

/// A calendar instant with a count-up sub-second field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    /// `0..=99`
    pub year: u8,
    /// `1..=12`
    pub month: u8,
    /// `1..=days_in_month(year, month)`
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Ticks elapsed in the current second
    pub sub_second: u16,
}

impl Default for CalendarTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl CalendarTime {
    /// Year 0, January 1st, midnight
    pub const EPOCH: Self = Self {
        year: 0,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        sub_second: 0,
    };

    pub const fn from_registers(date: RtcDate, time: RtcTime) -> Self {
        Self {
            year: date.year,
            month: date.month,
            day: date.day,
            hour: time.hours,
            minute: time.minutes,
            second: time.seconds,
            sub_second: time.sub_seconds,
        }
    }

    /// Date registers, with the weekday counted from a Monday epoch.
    pub const fn date(&self) -> RtcDate {
        let days = days_since_epoch(self.year, self.month, self.day);
        RtcDate {
            year: self.year,
            month: self.month,
            day: self.day,
            weekday: (days % 7) as u8 + 1,
        }
    }

    pub const fn time(&self) -> RtcTime {
        RtcTime {
            hours: self.hour,
            minutes: self.minute,
            seconds: self.second,
            sub_seconds: self.sub_second,
        }
    }

    /// Every field inside its range, sub-second against `resolution`.
    pub fn is_valid(&self, resolution: u32) -> bool {
        self.year <= 99
            && (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
            && u32::from(self.sub_second) <= resolution
    }

    /// Whole seconds since the epoch.
    pub const fn seconds_since_epoch(&self) -> u32 {
        days_since_epoch(self.year, self.month, self.day) * SECONDS_PER_DAY
            + self.hour as u32 * SECONDS_PER_HOUR
            + self.minute as u32 * SECONDS_PER_MINUTE
            + self.second as u32
    }

    /// Tick count since the epoch; wraps once the seconds outgrow the high bits.
    pub const fn to_ticks(&self, scale: &TickScale) -> Ticks {
        scale.compose(self.seconds_since_epoch(), self.sub_second as u32)
    }
}
