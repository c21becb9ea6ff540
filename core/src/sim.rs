//! Simulated peripherals for host tests
//!
//! [`SimBus`] holds a virtual clock in nanoseconds. The counter advances it on
//! every read, the delay advances it by the requested amount, and the line
//! plays back a scripted waveform relative to the moment it was released.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::ErrorKind;
use hal_abstractions::line::{ErrorType, PinState};
use hal_abstractions::{
    AlarmSpec, BackupRegisters, CalendarPeripheral, DataLine, Direction, FreeRunningCounter,
    InterruptLock, RtcDate, RtcTime,
};

use crate::rtc::{alarm_target, CalendarTime, TickScale, Ticks};

/// Cost of one counter read on the virtual clock
const POLL_NS: u64 = 1_000;

pub struct SimBus {
    now_ns: Cell<u64>,
    released_at: Cell<Option<u64>>,
    waveform: Vec<(PinState, u32)>,
    idle: PinState,
    masked: Cell<bool>,
    mask_entries: Cell<u32>,
    unmasked_samples: Cell<u32>,
    configure_fault: Cell<bool>,
    reads_before_fault: Cell<Option<u32>>,
}

impl SimBus {
    /// `waveform` is a list of (level, duration in µs) played after release;
    /// the line reads `idle` before and after it.
    pub fn new(waveform: &[(PinState, u32)], idle: PinState) -> Rc<Self> {
        Rc::new(Self {
            now_ns: Cell::new(0),
            released_at: Cell::new(None),
            waveform: waveform.to_vec(),
            idle,
            masked: Cell::new(false),
            mask_entries: Cell::new(0),
            unmasked_samples: Cell::new(0),
            configure_fault: Cell::new(false),
            reads_before_fault: Cell::new(None),
        })
    }

    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }

    pub fn is_masked(&self) -> bool {
        self.masked.get()
    }

    pub fn mask_entries(&self) -> u32 {
        self.mask_entries.get()
    }

    /// Make every line direction change fail.
    pub fn fail_configure(&self, fail: bool) {
        self.configure_fault.set(fail);
    }

    /// Fail bus samples once `reads` more have succeeded.
    pub fn fail_reads_after(&self, reads: u32) {
        self.reads_before_fault.set(Some(reads));
    }

    /// Bus samples taken while the line was released and interrupts were on.
    pub fn unmasked_samples(&self) -> u32 {
        self.unmasked_samples.get()
    }

    fn level_now(&self) -> PinState {
        let Some(released_at) = self.released_at.get() else {
            return self.idle;
        };
        let mut elapsed = self.now_ns.get().saturating_sub(released_at);
        for &(level, micros) in &self.waveform {
            let span = micros as u64 * 1_000;
            if elapsed < span {
                return level;
            }
            elapsed -= span;
        }
        self.idle
    }
}

/// DHT-style response for the given five bytes: 80 µs low, 80 µs high, then
/// per bit 50 µs low and 26 µs (`0`) or 70 µs (`1`) high.
pub fn dht_waveform(bytes: [u8; 5]) -> Vec<(PinState, u32)> {
    let mut waveform = vec![
        (PinState::High, 20),
        (PinState::Low, 80),
        (PinState::High, 80),
    ];
    for byte in bytes {
        for shift in (0..8).rev() {
            let high = if (byte >> shift) & 1 == 1 { 70 } else { 26 };
            waveform.push((PinState::Low, 50));
            waveform.push((PinState::High, high));
        }
    }
    waveform.push((PinState::Low, 50));
    waveform
}

pub struct SimLine {
    bus: Rc<SimBus>,
    direction: Direction,
    driven: PinState,
}

impl SimLine {
    pub fn new(bus: &Rc<SimBus>) -> Self {
        Self {
            bus: Rc::clone(bus),
            direction: Direction::Output,
            driven: PinState::High,
        }
    }

    /// A line already switched to input at the current instant.
    pub fn released(bus: &Rc<SimBus>) -> Self {
        let mut line = Self::new(bus);
        line.configure(Direction::Input).unwrap();
        line
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn driven(&self) -> PinState {
        self.driven
    }
}

/// Injected line driver failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLineError;

impl embedded_hal::digital::Error for SimLineError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for SimLine {
    type Error = SimLineError;
}

impl DataLine for SimLine {
    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error> {
        if self.bus.configure_fault.get() {
            return Err(SimLineError);
        }
        self.direction = direction;
        self.bus.released_at.set(match direction {
            Direction::Input => Some(self.bus.now_ns.get()),
            Direction::Output => None,
        });
        Ok(())
    }

    fn write(&mut self, level: PinState) -> Result<(), Self::Error> {
        self.driven = level;
        Ok(())
    }

    fn read(&mut self) -> Result<PinState, Self::Error> {
        if self.direction == Direction::Output {
            return Ok(self.driven);
        }
        match self.bus.reads_before_fault.get() {
            Some(0) => return Err(SimLineError),
            Some(reads) => self.bus.reads_before_fault.set(Some(reads - 1)),
            None => {}
        }
        if !self.bus.is_masked() {
            self.bus.unmasked_samples.set(self.bus.unmasked_samples.get() + 1);
        }
        Ok(self.bus.level_now())
    }
}

pub struct SimCounter {
    bus: Rc<SimBus>,
    hz: u32,
    origin_ns: u64,
    running: bool,
    starts: u32,
}

impl SimCounter {
    pub fn new(bus: &Rc<SimBus>, hz: u32) -> Self {
        Self {
            bus: Rc::clone(bus),
            hz,
            origin_ns: bus.now_ns.get(),
            running: false,
            starts: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }
}

impl FreeRunningCounter for SimCounter {
    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn reset(&mut self) {
        self.origin_ns = self.bus.now_ns.get();
    }

    fn ticks(&mut self) -> u32 {
        let elapsed_ns = self.bus.now_ns.get() - self.origin_ns;
        self.bus.advance_ns(POLL_NS);
        (elapsed_ns * self.hz as u64 / 1_000_000_000) as u32
    }

    fn frequency_hz(&self) -> u32 {
        self.hz
    }
}

pub struct SimDelay {
    bus: Rc<SimBus>,
}

impl SimDelay {
    pub fn new(bus: &Rc<SimBus>) -> Self {
        Self {
            bus: Rc::clone(bus),
        }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bus.advance_ns(ns as u64);
    }
}

/// Records every masked window on the shared bus.
pub struct SimLock {
    bus: Rc<SimBus>,
}

impl SimLock {
    pub fn new(bus: &Rc<SimBus>) -> Self {
        Self {
            bus: Rc::clone(bus),
        }
    }
}

impl InterruptLock for SimLock {
    fn with_interrupts_masked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        assert!(!self.bus.masked.get(), "nested interrupt mask");
        self.bus.masked.set(true);
        self.bus.mask_entries.set(self.bus.mask_entries.get() + 1);
        let result = f();
        self.bus.masked.set(false);
        result
    }
}

/// Calendar peripheral backed by a [`CalendarTime`]
pub struct SimRtc {
    pub now: CalendarTime,
    pub configured: Option<(u8, u16)>,
    pub alarm: Option<AlarmSpec>,
    pub alarm_flags_cleared: u32,
    pub fail_configure: bool,
    pub fail_alarm: bool,
    /// Ticks added to the clock on every time-register read
    pub advance_per_read: u32,
    /// Instants to jump to right after the next time-register reads
    pub rollovers: VecDeque<CalendarTime>,
    pub time_reads: u32,
    pub backup: [u32; 2],
    scale: TickScale,
}

impl SimRtc {
    pub fn new(now: CalendarTime) -> Self {
        Self {
            now,
            configured: None,
            alarm: None,
            alarm_flags_cleared: 0,
            fail_configure: false,
            fail_alarm: false,
            advance_per_read: 0,
            rollovers: VecDeque::new(),
            time_reads: 0,
            backup: [0; 2],
            scale: TickScale::default(),
        }
    }
}

impl CalendarPeripheral for SimRtc {
    type Error = ();

    fn configure(&mut self, async_prescaler: u8, sync_prescaler: u16) -> Result<(), ()> {
        if self.fail_configure {
            return Err(());
        }
        self.configured = Some((async_prescaler, sync_prescaler));
        Ok(())
    }

    fn set_time(&mut self, time: RtcTime) -> Result<(), ()> {
        self.now.hour = time.hours;
        self.now.minute = time.minutes;
        self.now.second = time.seconds;
        self.now.sub_second = time.sub_seconds;
        Ok(())
    }

    fn set_date(&mut self, date: RtcDate) -> Result<(), ()> {
        self.now.year = date.year;
        self.now.month = date.month;
        self.now.day = date.day;
        Ok(())
    }

    fn time(&mut self) -> RtcTime {
        self.time_reads += 1;
        let time = self.now.time();
        if let Some(next) = self.rollovers.pop_front() {
            self.now = next;
        } else if self.advance_per_read > 0 {
            self.now = alarm_target(&self.now, Ticks(self.advance_per_read), &self.scale);
        }
        time
    }

    fn date(&mut self) -> RtcDate {
        self.now.date()
    }

    fn sub_second_register(&mut self) -> u32 {
        // STM32 SSR counts down from the synchronous prescaler
        255 - self.now.sub_second as u32
    }

    fn set_alarm(&mut self, alarm: &AlarmSpec) -> Result<(), ()> {
        if self.fail_alarm {
            return Err(());
        }
        self.alarm = Some(*alarm);
        Ok(())
    }

    fn deactivate_alarm(&mut self) {
        self.alarm = None;
    }

    fn clear_alarm_flags(&mut self) {
        self.alarm_flags_cleared += 1;
    }
}

impl BackupRegisters for SimRtc {
    fn write_backup(&mut self, index: usize, value: u32) {
        self.backup[index] = value;
    }

    fn read_backup(&mut self, index: usize) -> u32 {
        self.backup[index]
    }
}
