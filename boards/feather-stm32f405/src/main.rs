#![deny(unsafe_code)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;

mod ccmram;
mod counter;
mod line;
mod rtc;

/// Time between two measurement cycles
const MEASUREMENT_INTERVAL_MS: u32 = 60_000;

/// TIM5 kernel clock: APB1 is 42 MHz and divided, so timers run at 2x
const TIM5_CLOCK_HZ: u32 = 84_000_000;

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1])]
mod app {
    use super::*;
    use defmt::{error, info, warn};
    use embassy_stm32::gpio::Flex;
    use embassy_stm32::rcc::{Hse, HseMode, LsConfig, LseConfig, LseMode};
    use embassy_stm32::time::Hertz;
    use embassy_time::Delay;
    use hal_abstractions::{CalendarPeripheral, GlobalCriticalSection};
    use sensor_node_core::{CalendarEngine, DecoderConfig, DhtDecoder, RtcConfig};

    use counter::Tim5Counter;
    use line::FlexDataLine;
    use rtc::Stm32Rtc;

    type Sensor = DhtDecoder<FlexDataLine, Tim5Counter, Delay, GlobalCriticalSection>;

    #[shared]
    struct Shared {
        calendar: CalendarEngine<Stm32Rtc>,
    }

    #[local]
    struct Local {
        sensor: Option<Sensor>,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Sensor node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE, 32.768 kHz LSE (PC14/PC15)
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        // The calendar and its alarm run from the LSE through every sleep
        config.rcc.ls = LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz(32_768),
                mode: LseMode::Oscillator(embassy_stm32::rcc::LseDrive::MediumHigh),
            }),
        };

        let p = embassy_stm32::init(config);
        info!("Clocks up: SYSCLK=84MHz, RTC on LSE");

        // DHT data line on A0 (PA4 on the Feather header)
        let line = FlexDataLine::new(Flex::new(p.PA4));
        let counter = Tim5Counter::new(TIM5_CLOCK_HZ);
        let sensor = match DhtDecoder::new(
            line,
            counter,
            Delay,
            GlobalCriticalSection,
            DecoderConfig::default(),
        ) {
            Ok(sensor) => Some(sensor),
            Err(e) => {
                error!("Sensor disabled: {}", e);
                None
            }
        };

        let mut calendar = CalendarEngine::new(Stm32Rtc::new(p.RTC), RtcConfig::default());
        if let Err(e) = calendar.init() {
            // Without a calendar there is no alarm; idle will sleep until reset
            error!("Calendar init failed: {}", e);
        }

        measure::spawn().ok();

        (Shared { calendar }, Local { sensor })
    }

    /// One measurement cycle: capture, report, arm the next wake-up
    #[task(priority = 1, local = [sensor], shared = [calendar])]
    async fn measure(mut cx: measure::Context) {
        match cx.local.sensor.as_mut().map(|sensor| sensor.capture()) {
            Some(Ok(reading)) => info!(
                "Temperature {} C, humidity {} %RH",
                reading.temperature(),
                reading.humidity()
            ),
            Some(Err(e)) => warn!("Measurement failed: {}", e),
            None => {}
        }

        cx.shared.calendar.lock(|calendar| {
            let timeout = calendar
                .ms_to_ticks(MEASUREMENT_INTERVAL_MS)
                .max(calendar.minimum_timeout());
            if let Err(e) = calendar.schedule_alarm(timeout) {
                error!("Next wake-up not armed: {}", e);
            }
        });
    }

    /// RTC alarm A match: acknowledge and hand over to `idle`
    #[task(binds = RTC_ALARM, priority = 2, shared = [calendar])]
    fn rtc_alarm(mut cx: rtc_alarm::Context) {
        cx.shared
            .calendar
            .lock(|calendar| calendar.peripheral_mut().clear_alarm_flags());
        CalendarEngine::<Stm32Rtc>::on_alarm(&ccmram::WAKE);
    }

    /// Low-power manager: sleep until the alarm raises the wake signal
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            // WFI with interrupts masked still wakes on a pending interrupt,
            // so a raise between the check and the sleep is not lost
            let woke = cortex_m::interrupt::free(|_| {
                if ccmram::WAKE.take() {
                    true
                } else {
                    cortex_m::asm::wfi();
                    false
                }
            });
            if woke {
                measure::spawn().ok();
            }
        }
    }
}
