//! Sensor data line on a flexible GPIO

use core::convert::Infallible;

use embassy_stm32::gpio::{Flex, Level, Pull, Speed};
use hal_abstractions::line::{ErrorType, PinState};
use hal_abstractions::{DataLine, Direction};

/// Bidirectional data pin; the sensor module carries the bus pull-up.
pub struct FlexDataLine {
    pin: Flex<'static>,
}

impl FlexDataLine {
    pub fn new(pin: Flex<'static>) -> Self {
        Self { pin }
    }
}

impl ErrorType for FlexDataLine {
    type Error = Infallible;
}

impl DataLine for FlexDataLine {
    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error> {
        match direction {
            Direction::Input => self.pin.set_as_input(Pull::None),
            Direction::Output => self.pin.set_as_output(Speed::VeryHigh),
        }
        Ok(())
    }

    fn write(&mut self, level: PinState) -> Result<(), Self::Error> {
        self.pin.set_level(match level {
            PinState::High => Level::High,
            PinState::Low => Level::Low,
        });
        Ok(())
    }

    fn read(&mut self) -> Result<PinState, Self::Error> {
        Ok(PinState::from(self.pin.is_high()))
    }
}
