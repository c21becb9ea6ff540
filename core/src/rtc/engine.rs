//! Calendar engine: tick timebase, reference snapshots and wake-up alarms

use hal_abstractions::{AlarmSpec, BackupRegisters, CalendarPeripheral};

use super::alarm::{alarm_target, exact_alarm};
use super::calendar::CalendarTime;
use super::ticks::{TickScale, Ticks};
use super::wake::{alarm_fired, WakeSignal};
use crate::config::RtcConfig;
use crate::error::CalendarError;

/// Re-reads allowed before a torn calendar read is accepted as is
const MAX_READ_ATTEMPTS: u32 = 8;

/// Owns the calendar peripheral and the elapsed-time reference
pub struct CalendarEngine<P> {
    rtc: P,
    config: RtcConfig,
    scale: TickScale,
    reference: Ticks,
    initialized: bool,
}

impl<P: CalendarPeripheral> CalendarEngine<P> {
    pub fn new(rtc: P, config: RtcConfig) -> Self {
        let scale = TickScale::new(u32::from(config.sync_prescaler), config.sub_second_bits);
        Self {
            rtc,
            config,
            scale,
            reference: Ticks::ZERO,
            initialized: false,
        }
    }

    /// Configure the peripheral and start the calendar at the epoch.
    ///
    /// Only the first successful call touches the hardware; later calls
    /// return immediately. Ends with a reference snapshot.
    pub fn init(&mut self) -> Result<(), CalendarError> {
        if self.initialized {
            return Ok(());
        }
        if !self.scale.is_valid() {
            error!(
                "RTC prescaler {} does not fit {} sub-second bits",
                self.config.sync_prescaler, self.config.sub_second_bits
            );
            return Err(CalendarError::InvalidCalendar);
        }

        self.rtc
            .configure(self.config.async_prescaler, self.config.sync_prescaler)
            .map_err(|_| {
                error!("RTC prescaler configuration failed");
                CalendarError::Hardware
            })?;

        let epoch = self.config.epoch;
        if !epoch.is_valid(self.scale.resolution) {
            error!("RTC epoch out of range");
            return Err(CalendarError::InvalidCalendar);
        }
        self.rtc
            .set_time(epoch.time())
            .and_then(|()| self.rtc.set_date(epoch.date()))
            .map_err(|_| {
                error!("RTC calendar write failed");
                CalendarError::Hardware
            })?;

        self.cancel_alarm();
        self.initialized = true;
        let reference = self.snapshot_reference();
        info!(
            "RTC initialized: prescalers {}/{}, reference {} ticks",
            self.config.async_prescaler, self.config.sync_prescaler, reference.0
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Store the current tick count as the elapsed-time reference.
    pub fn snapshot_reference(&mut self) -> Ticks {
        let (_, ticks) = self.read_current_calendar();
        self.reference = ticks;
        ticks
    }

    /// The last stored reference, without touching the hardware.
    pub fn current_reference(&self) -> Ticks {
        self.reference
    }

    /// Ticks since the last snapshot, wrapping.
    pub fn elapsed_since_reference(&mut self) -> Ticks {
        self.timer_value().wrapping_sub(self.reference)
    }

    pub fn ms_to_ticks(&self, milliseconds: u32) -> Ticks {
        self.scale.ms_to_ticks(milliseconds)
    }

    pub fn ticks_to_ms(&self, ticks: Ticks) -> u32 {
        self.scale.ticks_to_ms(ticks)
    }

    /// Shortest timeout the alarm hardware honours reliably.
    pub fn minimum_timeout(&self) -> Ticks {
        Ticks(self.config.minimum_timeout_ticks)
    }

    pub fn tick_scale(&self) -> &TickScale {
        &self.scale
    }

    /// Read time and date as one instant.
    ///
    /// The sub-second register is sampled before and after the two calendar
    /// registers; a difference means a rollover may have split the read, so
    /// the whole read is repeated.
    pub fn read_current_calendar(&mut self) -> (CalendarTime, Ticks) {
        let mut attempts = 0;
        let now = loop {
            attempts += 1;
            let before = self.rtc.sub_second_register();
            let time = self.rtc.time();
            let date = self.rtc.date();
            let after = self.rtc.sub_second_register();

            let now = CalendarTime::from_registers(date, time);
            if before == after {
                break now;
            }
            if attempts >= MAX_READ_ATTEMPTS {
                warn!("RTC read unstable after {} attempts", attempts);
                break now;
            }
        };
        (now, now.to_ticks(&self.scale))
    }

    /// Current calendar as ticks since the epoch.
    pub fn timer_value(&mut self) -> Ticks {
        self.read_current_calendar().1
    }

    /// Seconds since the epoch and the milliseconds into the current second.
    pub fn calendar_time(&mut self) -> (u32, u16) {
        let ticks = self.timer_value();
        let milliseconds = self.scale.sub_second_ms(self.scale.sub_seconds(ticks));
        (self.scale.whole_seconds(ticks), milliseconds as u16)
    }

    /// Busy-wait on the calendar for `milliseconds`.
    ///
    /// Gives up with [`CalendarError::Stalled`] once `stall_reads`
    /// consecutive reads return the same tick count.
    pub fn delay_ms(&mut self, milliseconds: u32) -> Result<(), CalendarError> {
        let start = self.timer_value();
        let duration = self.ms_to_ticks(milliseconds);
        let mut last = start;
        let mut unchanged = 0;
        loop {
            let now = self.timer_value();
            if now.wrapping_sub(start) >= duration {
                return Ok(());
            }
            if now != last {
                last = now;
                unchanged = 0;
                continue;
            }
            unchanged += 1;
            if unchanged >= self.config.stall_reads {
                error!("Calendar stopped at {} ticks", now.0);
                return Err(CalendarError::Stalled);
            }
        }
    }

    /// Program a wake-up `timeout` ticks from now.
    ///
    /// Any pending alarm is cancelled first. A hardware failure is reported
    /// and leaves no alarm armed.
    pub fn schedule_alarm(&mut self, timeout: Ticks) -> Result<AlarmSpec, CalendarError> {
        if !self.initialized {
            return Err(CalendarError::NotInitialized);
        }
        self.cancel_alarm();

        let (now, _) = self.read_current_calendar();
        let target = alarm_target(&now, timeout, &self.scale);
        let alarm = exact_alarm(&target, self.config.sub_second_bits);

        if self.rtc.set_alarm(&alarm).is_err() {
            error!(
                "Failed to program RTC alarm for day {} {}:{}:{}",
                alarm.day, alarm.hour, alarm.minute, alarm.second
            );
            return Err(CalendarError::Hardware);
        }
        debug!(
            "RTC alarm set: day {} {}:{}:{}.{} ({} ticks)",
            alarm.day, alarm.hour, alarm.minute, alarm.second, alarm.sub_second, timeout.0
        );
        Ok(alarm)
    }

    /// Disarm the alarm and drop any pending match.
    pub fn cancel_alarm(&mut self) {
        self.rtc.deactivate_alarm();
        self.rtc.clear_alarm_flags();
    }

    /// Alarm interrupt body. Raises `wake` and nothing else.
    pub fn on_alarm(wake: &WakeSignal) {
        alarm_fired(wake);
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.rtc
    }

    pub fn release(self) -> P {
        self.rtc
    }
}

impl<P: CalendarPeripheral + BackupRegisters> CalendarEngine<P> {
    /// Store two words in the backup domain.
    pub fn backup_write(&mut self, word0: u32, word1: u32) {
        self.rtc.write_backup(0, word0);
        self.rtc.write_backup(1, word1);
    }

    pub fn backup_read(&mut self) -> (u32, u32) {
        (self.rtc.read_backup(0), self.rtc.read_backup(1))
    }
}
