//! TIM5 as a 1 MHz free-running pulse counter
//!
//! TIM5 is one of the two 32-bit general-purpose timers on the F405, so a
//! capture never sees the counter wrap.

use hal_abstractions::FreeRunningCounter;
use stm32_metapac as pac;

/// Counter rate handed to the decoder
pub const COUNTER_HZ: u32 = 1_000_000;

pub struct Tim5Counter {
    hz: u32,
}

impl Tim5Counter {
    /// `timer_clock_hz` is the TIM5 kernel clock (2 x APB1 when APB1 is divided).
    pub fn new(timer_clock_hz: u32) -> Self {
        pac::RCC.apb1enr().modify(|w| w.set_tim5en(true));

        let prescaler = (timer_clock_hz / COUNTER_HZ).saturating_sub(1);
        let tim = pac::TIM5;
        tim.cr1().modify(|w| w.set_cen(false));
        tim.psc().write_value(prescaler as u16);
        tim.arr().write_value(u32::MAX);
        // Latch the prescaler now rather than at the first overflow
        tim.egr().write(|w| w.set_ug(true));
        tim.cnt().write_value(0);

        Self {
            hz: timer_clock_hz / (prescaler + 1),
        }
    }
}

impl FreeRunningCounter for Tim5Counter {
    fn start(&mut self) {
        pac::TIM5.cr1().modify(|w| w.set_cen(true));
    }

    fn stop(&mut self) {
        pac::TIM5.cr1().modify(|w| w.set_cen(false));
    }

    fn reset(&mut self) {
        pac::TIM5.cnt().write_value(0);
    }

    fn ticks(&mut self) -> u32 {
        pac::TIM5.cnt().read()
    }

    fn frequency_hz(&self) -> u32 {
        self.hz
    }
}
