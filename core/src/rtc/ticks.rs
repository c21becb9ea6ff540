//! Tick counts: whole seconds in the high bits, sub-second ticks in the low bits

/// A point or span on the calendar timebase
///
/// Arithmetic wraps; a difference is meaningful as long as the span fits
/// in 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticks(pub u32);

impl Ticks {
    pub const ZERO: Self = Self(0);

    pub const fn wrapping_sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }

    pub const fn wrapping_add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }
}

/// Layout of a tick count for a given prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickScale {
    /// Sub-second resolution (the synchronous prescaler value)
    pub resolution: u32,
    /// Width of the sub-second field
    pub sub_second_bits: u8,
}

impl Default for TickScale {
    fn default() -> Self {
        Self::new(255, 8)
    }
}

impl TickScale {
    pub const fn new(resolution: u32, sub_second_bits: u8) -> Self {
        Self {
            resolution,
            sub_second_bits,
        }
    }

    /// A sub-second field of 1 to 16 bits wide enough for `resolution`.
    ///
    /// The conversions below stay panic-free on an invalid scale but their
    /// results are meaningless.
    pub const fn is_valid(&self) -> bool {
        self.sub_second_bits >= 1
            && self.sub_second_bits <= 16
            && self.resolution > 0
            && self.resolution < (1 << self.sub_second_bits)
    }

    /// Ticks in one whole second of the tick-count layout.
    pub const fn ticks_per_second(&self) -> u32 {
        match 1u32.checked_shl(self.sub_second_bits as u32) {
            Some(ticks) => ticks,
            None => 0,
        }
    }

    const fn sub_second_mask(&self) -> u32 {
        self.ticks_per_second().wrapping_sub(1)
    }

    pub const fn whole_seconds(&self, ticks: Ticks) -> u32 {
        match ticks.0.checked_shr(self.sub_second_bits as u32) {
            Some(seconds) => seconds,
            None => 0,
        }
    }

    pub const fn sub_seconds(&self, ticks: Ticks) -> u32 {
        ticks.0 & self.sub_second_mask()
    }

    /// Pack whole seconds and sub-second ticks; seconds wrap at the top.
    pub const fn compose(&self, seconds: u32, sub_seconds: u32) -> Ticks {
        let seconds = match seconds.checked_shl(self.sub_second_bits as u32) {
            Some(shifted) => shifted,
            None => 0,
        };
        Ticks(seconds.wrapping_add(sub_seconds & self.sub_second_mask()))
    }

    /// `ms * resolution / 1000`
    pub const fn ms_to_ticks(&self, milliseconds: u32) -> Ticks {
        Ticks(((milliseconds as u64 * self.resolution as u64) / 1000) as u32)
    }

    /// `whole_seconds * 1000 + sub_seconds * 1000 / resolution`
    pub const fn ticks_to_ms(&self, ticks: Ticks) -> u32 {
        let seconds = self.whole_seconds(ticks);
        let sub = self.sub_seconds(ticks);
        let sub_ms = match sub.wrapping_mul(1000).checked_div(self.resolution) {
            Some(ms) => ms,
            None => 0,
        };
        seconds.wrapping_mul(1000).wrapping_add(sub_ms)
    }

    /// Milliseconds within the current second, always below 1000.
    pub const fn sub_second_ms(&self, sub_seconds: u32) -> u32 {
        match sub_seconds.wrapping_mul(1000).checked_shr(self.sub_second_bits as u32) {
            Some(ms) => ms,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_conversions() {
        let scale = TickScale::default();
        assert_eq!(scale.ms_to_ticks(1000), Ticks(255));
        assert_eq!(scale.ticks_to_ms(Ticks(255)), 1000);
        assert_eq!(scale.ms_to_ticks(0), Ticks::ZERO);
        assert_eq!(scale.ticks_to_ms(Ticks::ZERO), 0);
    }

    #[test]
    fn test_ms_round_trip_within_one_tick() {
        let scale = TickScale::default();
        // One tick is 1000 / 255 ms
        for ms in 0..=1000 {
            let back = scale.ticks_to_ms(scale.ms_to_ticks(ms));
            assert!(back <= ms && ms - back <= 4, "{} ms -> {} ms", ms, back);
        }
    }

    #[test]
    fn test_tick_round_trip_within_one_tick() {
        let scale = TickScale::default();
        for ticks in 0..=255 {
            let back = scale.ms_to_ticks(scale.ticks_to_ms(Ticks(ticks))).0;
            assert!(back <= ticks && ticks - back <= 1, "{} -> {}", ticks, back);
        }
    }

    #[test]
    fn test_seconds_live_in_high_bits() {
        let scale = TickScale::default();
        let ticks = scale.compose(2, 128);
        assert_eq!(ticks, Ticks(640));
        assert_eq!(scale.whole_seconds(ticks), 2);
        assert_eq!(scale.sub_seconds(ticks), 128);
        assert_eq!(scale.ticks_to_ms(ticks), 2000 + 128 * 1000 / 255);
        assert_eq!(scale.ticks_per_second(), 256);
    }

    #[test]
    fn test_sub_second_ms_stays_below_one_second() {
        let scale = TickScale::default();
        assert_eq!(scale.sub_second_ms(0), 0);
        assert_eq!(scale.sub_second_ms(128), 500);
        assert_eq!(scale.sub_second_ms(255), 996);
    }

    #[test]
    fn test_wrapping_difference() {
        let earlier = Ticks(u32::MAX - 9);
        let later = earlier.wrapping_add(Ticks(30));
        assert_eq!(later, Ticks(20));
        assert_eq!(later.wrapping_sub(earlier), Ticks(30));
    }

    #[test]
    fn test_large_ms_does_not_overflow() {
        let scale = TickScale::default();
        assert_eq!(scale.ms_to_ticks(86_400_000), Ticks(22_032_000));
    }

    #[test]
    fn test_scale_validity() {
        assert!(TickScale::default().is_valid());
        assert!(TickScale::new(32_767, 15).is_valid());
        assert!(!TickScale::new(0, 8).is_valid());
        assert!(!TickScale::new(256, 8).is_valid());
        assert!(!TickScale::new(255, 0).is_valid());
        assert!(!TickScale::new(255, 32).is_valid());
    }

    #[test]
    fn test_invalid_scale_does_not_panic() {
        let no_resolution = TickScale::new(0, 8);
        assert_eq!(no_resolution.ticks_to_ms(Ticks(3 << 8 | 17)), 3000);

        let too_wide = TickScale::new(255, 40);
        assert_eq!(too_wide.ticks_per_second(), 0);
        assert_eq!(too_wide.whole_seconds(Ticks(u32::MAX)), 0);
        assert_eq!(too_wide.sub_second_ms(255), 0);
        assert_eq!(too_wide.compose(5, 7), Ticks(7));
    }
}
