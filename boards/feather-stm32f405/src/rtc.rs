//! Calendar RTC and backup registers over the raw register block
//!
//! The RTC clock source (LSE) and the backup-domain enable are set up by
//! `embassy_stm32::init`; everything after that goes through `stm32-metapac`
//! because the sub-second register and alarm A are not exposed by the HAL.
//!
//! Register values are BCD. `SSR` counts down from the synchronous
//! prescaler; [`RtcTime::sub_seconds`] counts up, so every access converts.

use defmt::Format;
use embassy_stm32::{peripherals, Peri};
use hal_abstractions::{AlarmSpec, BackupRegisters, CalendarPeripheral, RtcDate, RtcTime};
use stm32_metapac as pac;

/// EXTI line wired to the RTC alarm event
const ALARM_EXTI_LINE: usize = 17;

/// Backup registers on the F405
const BACKUP_REGISTERS: usize = 20;

/// Status-flag polls before giving up on the peripheral
const FLAG_POLLS: u32 = 100_000;

/// `ISR` rc_w0 flags: RSF, ALRAF, ALRBF, WUTF, TSF, TSOVF, TAMP1F, TAMP2F.
/// Writing 1 leaves a flag untouched, so `ISR` is always written whole
/// instead of read-modify-written, which could clear a flag raised in between.
const ISR_FLAGS: u32 = (1 << 5) | (0b111_1111 << 8);
const ISR_INIT: u32 = 1 << 7;
const ISR_ALRAF: u32 = 1 << 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum RtcError {
    /// `INITF` never set after requesting init mode
    InitTimeout,
    /// `ALRAWF` never set after disabling alarm A
    AlarmWriteTimeout,
}

pub struct Stm32Rtc {
    _rtc: Peri<'static, peripherals::RTC>,
    sync_prescaler: u16,
}

const fn to_bcd(value: u8) -> (u8, u8) {
    (value / 10, value % 10)
}

const fn from_bcd(tens: u8, units: u8) -> u8 {
    tens * 10 + units
}

fn wait_for(flag: impl Fn() -> bool) -> bool {
    (0..FLAG_POLLS).any(|_| flag())
}

/// Run `f` with the RTC write protection lifted.
fn unlocked<R>(f: impl FnOnce(pac::rtc::Rtc) -> R) -> R {
    let rtc = pac::RTC;
    rtc.wpr().write(|w| w.set_key(0xCA));
    rtc.wpr().write(|w| w.set_key(0x53));
    let result = f(rtc);
    rtc.wpr().write(|w| w.set_key(0xFF));
    result
}

fn write_isr(rtc: pac::rtc::Rtc, value: u32) {
    rtc.isr().write_value(pac::rtc::regs::Isr(value));
}

/// Run `f` in calendar init mode; the calendar is stopped meanwhile.
fn in_init_mode(f: impl FnOnce(pac::rtc::Rtc)) -> Result<(), RtcError> {
    unlocked(|rtc| {
        write_isr(rtc, ISR_FLAGS | ISR_INIT);
        if !wait_for(|| rtc.isr().read().initf()) {
            write_isr(rtc, ISR_FLAGS);
            return Err(RtcError::InitTimeout);
        }
        f(rtc);
        write_isr(rtc, ISR_FLAGS);
        Ok(())
    })
}

impl Stm32Rtc {
    /// Takes the RTC singleton; the backup domain must already be clocked.
    pub fn new(rtc: Peri<'static, peripherals::RTC>) -> Self {
        Self {
            _rtc: rtc,
            sync_prescaler: 255,
        }
    }
}

impl CalendarPeripheral for Stm32Rtc {
    type Error = RtcError;

    fn configure(&mut self, async_prescaler: u8, sync_prescaler: u16) -> Result<(), RtcError> {
        self.sync_prescaler = sync_prescaler;
        in_init_mode(|rtc| {
            rtc.cr().modify(|w| w.set_fmt(false));
            // PREDIV_S first, then PREDIV_A, as two separate writes
            rtc.prer().modify(|w| w.set_prediv_s(sync_prescaler));
            rtc.prer().modify(|w| w.set_prediv_a(async_prescaler & 0x7F));
        })?;

        // Alarm events reach the NVIC through EXTI line 17, rising edge
        pac::EXTI.imr(0).modify(|w| w.set_line(ALARM_EXTI_LINE, true));
        pac::EXTI.rtsr(0).modify(|w| w.set_line(ALARM_EXTI_LINE, true));
        Ok(())
    }

    fn set_time(&mut self, time: RtcTime) -> Result<(), RtcError> {
        let (ht, hu) = to_bcd(time.hours);
        let (mnt, mnu) = to_bcd(time.minutes);
        let (st, su) = to_bcd(time.seconds);
        in_init_mode(|rtc| {
            rtc.tr().write(|w| {
                w.set_ht(ht);
                w.set_hu(hu);
                w.set_mnt(mnt);
                w.set_mnu(mnu);
                w.set_st(st);
                w.set_su(su);
            });
        })
    }

    fn set_date(&mut self, date: RtcDate) -> Result<(), RtcError> {
        let (yt, yu) = to_bcd(date.year);
        let (mt, mu) = to_bcd(date.month);
        let (dt, du) = to_bcd(date.day);
        in_init_mode(|rtc| {
            rtc.dr().write(|w| {
                w.set_yt(yt);
                w.set_yu(yu);
                w.set_wdu(date.weekday);
                w.set_mt(mt == 1);
                w.set_mu(mu);
                w.set_dt(dt);
                w.set_du(du);
            });
        })
    }

    fn time(&mut self) -> RtcTime {
        let rtc = pac::RTC;
        // SSR first: it freezes TR and DR until DR is read
        let ssr = rtc.ssr().read().ss();
        let tr = rtc.tr().read();
        RtcTime {
            hours: from_bcd(tr.ht(), tr.hu()),
            minutes: from_bcd(tr.mnt(), tr.mnu()),
            seconds: from_bcd(tr.st(), tr.su()),
            sub_seconds: self.sync_prescaler.saturating_sub(ssr),
        }
    }

    fn date(&mut self) -> RtcDate {
        let dr = pac::RTC.dr().read();
        RtcDate {
            year: from_bcd(dr.yt(), dr.yu()),
            month: from_bcd(u8::from(dr.mt()), dr.mu()),
            day: from_bcd(dr.dt(), dr.du()),
            weekday: dr.wdu(),
        }
    }

    fn sub_second_register(&mut self) -> u32 {
        let rtc = pac::RTC;
        let ssr = rtc.ssr().read().ss();
        // Release the shadow lock taken by the SSR read
        let _ = rtc.dr().read();
        u32::from(ssr)
    }

    fn set_alarm(&mut self, alarm: &AlarmSpec) -> Result<(), RtcError> {
        let (dt, du) = to_bcd(alarm.day);
        let (ht, hu) = to_bcd(alarm.hour);
        let (mnt, mnu) = to_bcd(alarm.minute);
        let (st, su) = to_bcd(alarm.second);
        let ss = self.sync_prescaler.saturating_sub(alarm.sub_second);
        let mask = alarm.mask;

        unlocked(|rtc| {
            rtc.cr().modify(|w| {
                w.set_alre(0, false);
                w.set_alrie(0, false);
            });
            if !wait_for(|| rtc.isr().read().alrwf(0)) {
                return Err(RtcError::AlarmWriteTimeout);
            }

            rtc.alrmr(0).write(|w| {
                w.set_msk4(mask.day);
                w.set_wdsel(false);
                w.set_dt(dt);
                w.set_du(du);
                w.set_msk3(mask.hours);
                w.set_ht(ht);
                w.set_hu(hu);
                w.set_msk2(mask.minutes);
                w.set_mnt(mnt);
                w.set_mnu(mnu);
                w.set_msk1(mask.seconds);
                w.set_st(st);
                w.set_su(su);
            });
            rtc.alrmssr(0).write(|w| {
                w.set_maskss(mask.sub_second_bits);
                w.set_ss(ss);
            });

            rtc.cr().modify(|w| {
                w.set_alre(0, true);
                w.set_alrie(0, true);
            });
            Ok(())
        })
    }

    fn deactivate_alarm(&mut self) {
        unlocked(|rtc| {
            rtc.cr().modify(|w| {
                w.set_alre(0, false);
                w.set_alrie(0, false);
            });
        });
    }

    fn clear_alarm_flags(&mut self) {
        write_isr(pac::RTC, ISR_FLAGS & !ISR_ALRAF);
        pac::EXTI.pr(0).write(|w| w.set_line(ALARM_EXTI_LINE, true));
    }
}

impl BackupRegisters for Stm32Rtc {
    fn write_backup(&mut self, index: usize, value: u32) {
        if index < BACKUP_REGISTERS {
            pac::RTC.bkpr(index).write(|w| w.set_bkp(value));
        }
    }

    fn read_backup(&mut self, index: usize) -> u32 {
        if index < BACKUP_REGISTERS {
            pac::RTC.bkpr(index).read().bkp()
        } else {
            0
        }
    }
}
