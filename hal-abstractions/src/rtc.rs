//! Calendar RTC peripheral and backup registers

/// Time-of-day registers as read from the peripheral (binary, 24-hour)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// Sub-second ticks elapsed in the current second, `0..=sync_prescaler`.
    ///
    /// Hardware that counts down (STM32 `SSR`) converts before reporting.
    pub sub_seconds: u16,
}

/// Date registers as read from the peripheral (binary)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcDate {
    /// Two-digit year, `0..=99`
    pub year: u8,
    /// `1..=12`
    pub month: u8,
    /// `1..=31`
    pub day: u8,
    /// `1..=7`, Monday = 1
    pub weekday: u8,
}

impl Default for RtcDate {
    fn default() -> Self {
        Self {
            year: 0,
            month: 1,
            day: 1,
            weekday: 1,
        }
    }
}

/// Fields excluded from the alarm comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmMask {
    pub day: bool,
    pub hours: bool,
    pub minutes: bool,
    pub seconds: bool,
    /// Number of least-significant sub-second bits that take part in the
    /// comparison (0 ignores the sub-second field).
    pub sub_second_bits: u8,
}

impl AlarmMask {
    /// Match on date, time and the full 8-bit sub-second field.
    pub const EXACT: Self = Self {
        day: false,
        hours: false,
        minutes: false,
        seconds: false,
        sub_second_bits: 8,
    };
}

/// A programmed wake-up target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmSpec {
    /// Day of month, `1..=31`
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Elapsed sub-second ticks, same orientation as [`RtcTime::sub_seconds`]
    pub sub_second: u16,
    pub mask: AlarmMask,
}

/// The calendar half of an RTC peripheral
///
/// Time and date are separate registers. Reading them is not atomic with
/// respect to a rollover, so callers re-read until
/// [`CalendarPeripheral::sub_second_register`] is stable.
pub trait CalendarPeripheral {
    type Error: core::fmt::Debug;

    /// Apply prescalers and 24-hour format. Leaves time and date untouched.
    fn configure(&mut self, async_prescaler: u8, sync_prescaler: u16) -> Result<(), Self::Error>;

    fn set_time(&mut self, time: RtcTime) -> Result<(), Self::Error>;

    fn set_date(&mut self, date: RtcDate) -> Result<(), Self::Error>;

    fn time(&mut self) -> RtcTime;

    fn date(&mut self) -> RtcDate;

    /// Raw sub-second register, used only to detect a change between reads.
    fn sub_second_register(&mut self) -> u32;

    /// Program the alarm and enable its interrupt.
    fn set_alarm(&mut self, alarm: &AlarmSpec) -> Result<(), Self::Error>;

    /// Disable the alarm. Pending flags are left alone.
    fn deactivate_alarm(&mut self);

    /// Clear the alarm-matched flag and its interrupt line.
    fn clear_alarm_flags(&mut self);
}

/// General-purpose registers that survive low-power modes but not power loss
pub trait BackupRegisters {
    fn write_backup(&mut self, index: usize, value: u32);

    fn read_backup(&mut self, index: usize) -> u32;
}
