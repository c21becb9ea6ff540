//! Alarm-to-main-loop wake signal

use core::sync::atomic::{AtomicBool, Ordering};

/// Single flag raised from the alarm interrupt and consumed by the main loop
///
/// Lives in a `static`; both sides touch it with single atomic operations.
pub struct WakeSignal(AtomicBool);

impl WakeSignal {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume the signal; returns whether it was raised.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Alarm-match handler: request a wake-up, nothing more.
pub fn alarm_fired(wake: &WakeSignal) {
    wake.raise();
}

#[cfg(test)]
mod tests {
    use super::*;

    static WAKE: WakeSignal = WakeSignal::new();

    #[test]
    fn test_take_consumes() {
        let wake = WakeSignal::default();
        assert!(!wake.is_raised());
        assert!(!wake.take());

        alarm_fired(&wake);
        assert!(wake.is_raised());
        assert!(wake.take());
        assert!(!wake.is_raised());
        assert!(!wake.take());
    }

    #[test]
    fn test_repeated_raise_is_one_wake() {
        alarm_fired(&WAKE);
        alarm_fired(&WAKE);
        assert!(WAKE.take());
        assert!(!WAKE.take());
    }
}
