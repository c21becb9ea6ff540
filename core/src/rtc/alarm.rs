//! Wake-up target computation

use hal_abstractions::{AlarmMask, AlarmSpec};

use super::calendar::{days_in_month, CalendarTime, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use super::ticks::{TickScale, Ticks};

/// The calendar instant `timeout` after `now`.
///
/// Every field carries into the next one, days included: a target past the
/// end of the month lands in the following month (or January of the
/// following year, wrapping year 99 back to 0).
pub fn alarm_target(now: &CalendarTime, timeout: Ticks, scale: &TickScale) -> CalendarTime {
    let per_second = scale.ticks_per_second();

    let sub_second = u32::from(now.sub_second) + scale.sub_seconds(timeout);
    let mut seconds = scale.whole_seconds(timeout) + sub_second / per_second;
    let sub_second = sub_second % per_second;

    let days = seconds / SECONDS_PER_DAY;
    seconds %= SECONDS_PER_DAY;
    let hours = seconds / SECONDS_PER_HOUR;
    seconds %= SECONDS_PER_HOUR;
    let minutes = seconds / SECONDS_PER_MINUTE;
    seconds %= SECONDS_PER_MINUTE;

    let second = u32::from(now.second) + seconds;
    let minute = u32::from(now.minute) + minutes + second / 60;
    let hour = u32::from(now.hour) + hours + minute / 60;
    let mut day = u32::from(now.day) + days + hour / 24;

    let mut year = now.year;
    let mut month = now.month;
    loop {
        let length = u32::from(days_in_month(year, month));
        if day <= length {
            break;
        }
        day -= length;
        month += 1;
        if month > 12 {
            month = 1;
            year = (year + 1) % 100;
        }
    }

    CalendarTime {
        year,
        month,
        day: day as u8,
        hour: (hour % 24) as u8,
        minute: (minute % 60) as u8,
        second: (second % 60) as u8,
        sub_second: sub_second as u16,
    }
}

/// Alarm matching `target` on day, time and every sub-second bit.
pub const fn exact_alarm(target: &CalendarTime, sub_second_bits: u8) -> AlarmSpec {
    AlarmSpec {
        day: target.day,
        hour: target.hour,
        minute: target.minute,
        second: target.second,
        sub_second: target.sub_second,
        mask: AlarmMask {
            sub_second_bits,
            ..AlarmMask::EXACT
        },
    }
}
