//! Pulse timing against a free-running counter
//!
//! Windows are specified in microseconds and scaled once to the counter's
//! tick rate, so the same protocol logic runs against a hardware timer or a
//! virtual one in tests.

use core::ops::RangeInclusive;

use hal_abstractions::line::PinState;
use hal_abstractions::{DataLine, FreeRunningCounter};

/// Convert a duration in microseconds to counter ticks (truncating).
pub const fn micros_to_ticks(micros: u32, counter_hz: u32) -> u32 {
    let ticks = (micros as u64 * counter_hz as u64) / 1_000_000;
    if ticks > u32::MAX as u64 {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// Inclusive range of acceptable tick counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickWindow {
    pub min: u32,
    pub max: u32,
}

impl TickWindow {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Scale a microsecond range to ticks at `counter_hz`.
    pub fn from_micros(range: &RangeInclusive<u32>, counter_hz: u32) -> Self {
        Self::new(
            micros_to_ticks(*range.start(), counter_hz),
            micros_to_ticks(*range.end(), counter_hz),
        )
    }

    pub const fn contains(&self, ticks: u32) -> bool {
        ticks >= self.min && ticks <= self.max
    }

    /// A window that can tell at least two distinct tick counts apart.
    pub const fn is_resolvable(&self) -> bool {
        self.min < self.max
    }
}

/// Why a level wait ended without seeing the expected edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitError {
    /// Reading the line failed
    Line,
    /// The counter passed the budget with the line still at `level`
    Timeout,
}

/// Spin while `line` reads `level`.
///
/// Returns the counter value sampled on the iteration that first saw the
/// other level. The counter is not reset here; callers reset it to start a
/// measurement.
pub fn wait_while<L, C>(
    line: &mut L,
    counter: &mut C,
    level: PinState,
    budget_ticks: u32,
) -> Result<u32, WaitError>
where
    L: DataLine,
    C: FreeRunningCounter,
{
    loop {
        let elapsed = counter.ticks();
        if line.read().map_err(|_| WaitError::Line)? != level {
            return Ok(elapsed);
        }
        if elapsed > budget_ticks {
            return Err(WaitError::Timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBus, SimCounter, SimLine};

    #[test]
    fn test_micros_to_ticks_scales_with_frequency() {
        assert_eq!(micros_to_ticks(80, 1_000_000), 80);
        assert_eq!(micros_to_ticks(80, 2_000_000), 160);
        assert_eq!(micros_to_ticks(80, 84_000_000), 6720);
        assert_eq!(micros_to_ticks(26, 100_000), 2);
        assert_eq!(micros_to_ticks(u32::MAX, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = TickWindow::from_micros(&(75..=88), 1_000_000);
        assert!(!window.contains(74));
        assert!(window.contains(75));
        assert!(window.contains(88));
        assert!(!window.contains(89));
    }

    #[test]
    fn test_window_collapses_on_slow_counter() {
        assert!(TickWindow::from_micros(&(21..=29), 1_000_000).is_resolvable());
        assert!(!TickWindow::from_micros(&(21..=29), 100_000).is_resolvable());
    }

    #[test]
    fn test_wait_while_measures_pulse() {
        let bus = SimBus::new(&[(PinState::Low, 80)], PinState::High);
        let mut line = SimLine::released(&bus);
        let mut counter = SimCounter::new(&bus, 1_000_000);
        counter.reset();

        let ticks = wait_while(&mut line, &mut counter, PinState::Low, 500).unwrap();
        assert!((78..=81).contains(&ticks), "measured {} ticks", ticks);
    }

    #[test]
    fn test_wait_while_times_out_on_stuck_line() {
        let bus = SimBus::new(&[], PinState::High);
        let mut line = SimLine::released(&bus);
        let mut counter = SimCounter::new(&bus, 1_000_000);
        counter.reset();

        assert_eq!(
            wait_while(&mut line, &mut counter, PinState::High, 500),
            Err(WaitError::Timeout)
        );
        assert!(counter.ticks() > 500);
    }
}
