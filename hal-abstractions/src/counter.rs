//! Free-running hardware counter used as a pulse-width timebase

/// An up-counting hardware timer read as a raw tick value
///
/// The counter must not be shared with anything that reloads it while a
/// measurement is in progress. Implementations report their configured
/// frequency so callers can express timing windows in microseconds.
pub trait FreeRunningCounter {
    /// Start counting from the current value.
    fn start(&mut self);

    /// Stop counting. The current value is kept.
    fn stop(&mut self);

    /// Force the count back to zero without stopping.
    fn reset(&mut self);

    /// Current count.
    fn ticks(&mut self) -> u32;

    /// Counting frequency in Hz.
    fn frequency_hz(&self) -> u32;
}

impl<T: FreeRunningCounter + ?Sized> FreeRunningCounter for &mut T {
    fn start(&mut self) {
        T::start(self)
    }

    fn stop(&mut self) {
        T::stop(self)
    }

    fn reset(&mut self) {
        T::reset(self)
    }

    fn ticks(&mut self) -> u32 {
        T::ticks(self)
    }

    fn frequency_hz(&self) -> u32 {
        T::frequency_hz(self)
    }
}
