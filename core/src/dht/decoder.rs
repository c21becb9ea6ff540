//! Single-wire capture state machine
//!
//! One capture is: host reset pulse, sensor handshake (~80 µs low, ~80 µs
//! high), then 40 bits each made of a ~50 µs low lead-in and a high phase
//! whose length carries the bit. Everything after the reset pulse runs with
//! interrupts masked; the mask is scoped to a closure so every exit path
//! restores it.

use embedded_hal::delay::DelayNs;
use hal_abstractions::line::PinState;
use hal_abstractions::{DataLine, Direction, FreeRunningCounter, GlobalCriticalSection, InterruptLock};

use super::frame::{DecodedReading, Measurement, RawFrame, FRAME_BITS};
use crate::config::DecoderConfig;
use crate::error::{CaptureError, DecoderInitError, Phase};
use crate::timing::{micros_to_ticks, wait_while, TickWindow, WaitError};

/// Outcome of one capture
pub type SensorResult = Result<Reading, CaptureError>;

/// A successful capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub raw: DecodedReading,
    pub measurement: Measurement,
}

impl Reading {
    /// Integer temperature field
    pub fn temperature(&self) -> u8 {
        self.raw.temperature_integer
    }

    /// Integer humidity field
    pub fn humidity(&self) -> u8 {
        self.raw.humidity_integer
    }
}

/// Pulse windows in counter ticks, derived once from [`DecoderConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolTimings {
    pub timeout: u32,
    pub response: TickWindow,
    pub zero: TickWindow,
    pub one: TickWindow,
}

impl ProtocolTimings {
    pub fn new(config: &DecoderConfig, counter_hz: u32) -> Self {
        Self {
            timeout: micros_to_ticks(config.timeout_us, counter_hz),
            response: TickWindow::from_micros(&config.response_window_us, counter_hz),
            zero: TickWindow::from_micros(&config.zero_window_us, counter_hz),
            one: TickWindow::from_micros(&config.one_window_us, counter_hz),
        }
    }

    /// All windows resolvable and the bit windows disjoint.
    pub fn is_usable(&self) -> bool {
        self.response.is_resolvable()
            && self.zero.is_resolvable()
            && self.one.is_resolvable()
            && self.zero.max < self.one.min
    }

    fn classify(&self, ticks: u32) -> Option<bool> {
        if self.zero.contains(ticks) {
            Some(false)
        } else if self.one.contains(ticks) {
            Some(true)
        } else {
            None
        }
    }
}

/// Driver for one DHT-family sensor on one data line
///
/// Owns the line, the counter used for pulse timing, a delay for the reset
/// pulse and the interrupt lock guarding the capture window.
pub struct DhtDecoder<L, C, D, K = GlobalCriticalSection> {
    line: L,
    counter: C,
    delay: D,
    lock: K,
    config: DecoderConfig,
    timings: ProtocolTimings,
    last: Option<DecodedReading>,
}

impl<L, C, D, K> DhtDecoder<L, C, D, K>
where
    L: DataLine,
    C: FreeRunningCounter,
    D: DelayNs,
    K: InterruptLock,
{
    /// Take ownership of the peripherals and drive the line to its idle level.
    ///
    /// Fails if the line cannot be configured or the counter is too slow to
    /// tell the pulse windows apart.
    pub fn new(
        mut line: L,
        counter: C,
        delay: D,
        lock: K,
        config: DecoderConfig,
    ) -> Result<Self, DecoderInitError> {
        let hz = counter.frequency_hz();
        let timings = ProtocolTimings::new(&config, hz);
        if !timings.is_usable() {
            error!("Counter at {} Hz cannot resolve pulse windows", hz);
            return Err(DecoderInitError::CounterTooSlow { hz });
        }

        line.configure(Direction::Output)
            .and_then(|()| line.write(PinState::High))
            .map_err(|_| DecoderInitError::Line)?;

        debug!(
            "Decoder ready: timeout {} ticks, response {}..={}",
            timings.timeout, timings.response.min, timings.response.max
        );

        Ok(Self {
            line,
            counter,
            delay,
            lock,
            config,
            timings,
            last: None,
        })
    }

    /// Run one full read cycle. Blocks for the reset pulse plus ~4 ms.
    ///
    /// On failure the previously stored reading is kept.
    pub fn capture(&mut self) -> SensorResult {
        self.line
            .configure(Direction::Output)
            .and_then(|()| self.line.write(PinState::Low))
            .map_err(|_| CaptureError::Line)?;
        self.delay.delay_ms(self.config.reset_pulse_ms);

        let Self {
            line,
            counter,
            lock,
            timings,
            ..
        } = self;
        let frame = lock.with_interrupts_masked(|| {
            counter.start();
            counter.reset();
            let frame = sample_frame(line, counter, timings);
            counter.stop();
            frame
        });

        self.idle_line();

        let frame = frame.inspect_err(|e| warn!("Capture failed: {:?}", e))?;
        let raw = frame.decode();
        if self.config.verify_checksum && !raw.checksum_ok() {
            let e = CaptureError::ChecksumMismatch {
                expected: raw.checksum,
                computed: raw.computed_checksum(),
            };
            warn!("Capture failed: {:?}", e);
            return Err(e);
        }

        self.last = Some(raw);
        let reading = Reading {
            raw,
            measurement: raw.measurement(self.config.model),
        };
        debug!(
            "Captured {} %RH, {} C",
            reading.humidity(),
            reading.temperature()
        );
        Ok(reading)
    }

    /// Temperature integer field of the last good capture, 0 before the first.
    pub fn last_temperature(&self) -> u8 {
        self.last.map_or(0, |r| r.temperature_integer)
    }

    /// Humidity integer field of the last good capture, 0 before the first.
    pub fn last_humidity(&self) -> u8 {
        self.last.map_or(0, |r| r.humidity_integer)
    }

    pub fn last_reading(&self) -> Option<DecodedReading> {
        self.last
    }

    pub fn timings(&self) -> &ProtocolTimings {
        &self.timings
    }

    /// Give the peripherals back.
    pub fn release(self) -> (L, C, D, K) {
        (self.line, self.counter, self.delay, self.lock)
    }

    fn idle_line(&mut self) {
        if self
            .line
            .configure(Direction::Output)
            .and_then(|()| self.line.write(PinState::High))
            .is_err()
        {
            warn!("Failed to return data line to idle");
        }
    }
}

fn sample_frame<L, C>(
    line: &mut L,
    counter: &mut C,
    timings: &ProtocolTimings,
) -> Result<RawFrame, CaptureError>
where
    L: DataLine,
    C: FreeRunningCounter,
{
    line.configure(Direction::Input)
        .map_err(|_| CaptureError::Line)?;

    // The counter was reset before the line was released
    wait_while(line, counter, PinState::High, timings.timeout)
        .map_err(|e| wait_error(e, Phase::WaitResponseLow))?;

    for (phase, level) in [
        (Phase::ResponseLow, PinState::Low),
        (Phase::ResponseHigh, PinState::High),
    ] {
        counter.reset();
        let ticks = wait_while(line, counter, level, timings.timeout)
            .map_err(|e| wait_error(e, phase))?;
        if !timings.response.contains(ticks) {
            return Err(CaptureError::InvalidHandshake { phase, ticks });
        }
    }

    let mut frame = RawFrame::default();
    for bit in 0..FRAME_BITS {
        counter.reset();
        wait_while(line, counter, PinState::Low, timings.timeout)
            .map_err(|e| wait_error(e, Phase::BitLeadIn))?;

        counter.reset();
        let ticks = wait_while(line, counter, PinState::High, timings.timeout)
            .map_err(|e| wait_error(e, Phase::BitHigh))?;
        let value = timings
            .classify(ticks)
            .ok_or(CaptureError::InvalidPulseWidth {
                bit: bit as u8,
                ticks,
            })?;
        frame.set(bit, value);
    }
    Ok(frame)
}

fn wait_error(e: WaitError, phase: Phase) -> CaptureError {
    match e {
        WaitError::Line => CaptureError::Line,
        WaitError::Timeout => CaptureError::Timeout(phase),
    }
}
