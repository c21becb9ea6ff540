//! Decoder and calendar configuration structures

use core::ops::RangeInclusive;

use crate::dht::SensorModel;
use crate::rtc::CalendarTime;

/// Single-wire decoder configuration
///
/// Pulse windows are in microseconds and are scaled to counter ticks when
/// the decoder is constructed.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Sensor variant on the line
    pub model: SensorModel,
    /// Host reset pulse (line held low) in milliseconds
    pub reset_pulse_ms: u32,
    /// Budget for any single level change
    pub timeout_us: u32,
    /// Accepted length of each ~80 µs response pulse
    pub response_window_us: RangeInclusive<u32>,
    /// High-phase length of a `0` bit (~26-28 µs)
    pub zero_window_us: RangeInclusive<u32>,
    /// High-phase length of a `1` bit (~70 µs)
    pub one_window_us: RangeInclusive<u32>,
    /// Reject frames whose checksum byte does not match
    pub verify_checksum: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            model: SensorModel::Dht11,
            reset_pulse_ms: 18,
            timeout_us: 500,
            response_window_us: 75..=88,
            zero_window_us: 21..=29,
            one_window_us: 61..=79,
            verify_checksum: true,
        }
    }
}

/// Calendar peripheral configuration
#[derive(Debug, Clone)]
pub struct RtcConfig {
    /// Synchronous prescaler; also the sub-second resolution (`PREDIV_S`)
    pub sync_prescaler: u16,
    /// Asynchronous prescaler (`PREDIV_A`), 32.768 kHz / 128 = 256 Hz
    pub async_prescaler: u8,
    /// Width of the sub-second field in a tick count
    pub sub_second_bits: u8,
    /// Shortest alarm the hardware honours reliably, in ticks
    pub minimum_timeout_ticks: u32,
    /// Calendar value written by the first `init()`
    pub epoch: CalendarTime,
    /// Consecutive unchanged calendar reads after which `delay_ms` reports
    /// a stopped calendar; one tick spans thousands of reads
    pub stall_reads: u32,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            sync_prescaler: 255,
            async_prescaler: 127,
            sub_second_bits: 8,
            minimum_timeout_ticks: 3,
            epoch: CalendarTime::EPOCH,
            stall_reads: 1_000_000,
        }
    }
}
