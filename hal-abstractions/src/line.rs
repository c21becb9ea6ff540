//! Bidirectional single-wire data line

pub use embedded_hal::digital::{ErrorType, PinState};

/// Direction a [`DataLine`] is driven in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Line released, level sampled from the bus
    Input,
    /// Line driven push-pull by the host
    Output,
}

/// A GPIO that can switch between driving and sampling the same wire
///
/// `embedded-hal` splits input and output into separate traits; single-wire
/// protocols need both on one pin with a direction change in between.
pub trait DataLine: ErrorType {
    /// Switch the line direction.
    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Drive the line. Only meaningful in [`Direction::Output`].
    fn write(&mut self, level: PinState) -> Result<(), Self::Error>;

    /// Sample the current bus level.
    fn read(&mut self) -> Result<PinState, Self::Error>;

    /// `true` when the bus reads high.
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()? == PinState::High)
    }
}

impl<T: DataLine + ?Sized> DataLine for &mut T {
    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::configure(self, direction)
    }

    fn write(&mut self, level: PinState) -> Result<(), Self::Error> {
        T::write(self, level)
    }

    fn read(&mut self) -> Result<PinState, Self::Error> {
        T::read(self)
    }
}
