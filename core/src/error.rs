//! Error types for the decoder, the calendar engine and the interrupt registry

/// Protocol state a capture failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Waiting for the sensor to pull the released line low
    WaitResponseLow,
    /// Timing the sensor's low response pulse
    ResponseLow,
    /// Timing the sensor's high response pulse
    ResponseHigh,
    /// Waiting out the low lead-in of a data bit
    BitLeadIn,
    /// Timing the high phase of a data bit
    BitHigh,
}

/// Single-wire capture failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureError {
    /// The line driver reported an error
    Line,
    /// The line never changed level within the timeout budget
    Timeout(Phase),
    /// A response pulse fell outside the handshake window
    InvalidHandshake { phase: Phase, ticks: u32 },
    /// A data bit's high phase was neither a short nor a long pulse
    InvalidPulseWidth { bit: u8, ticks: u32 },
    /// Transmitted checksum does not match the sum of the data bytes
    ChecksumMismatch { expected: u8, computed: u8 },
}

impl core::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Line => write!(f, "Data line error"),
            Self::Timeout(phase) => write!(f, "Timeout in {:?}", phase),
            Self::InvalidHandshake { phase, ticks } => {
                write!(f, "Invalid handshake in {:?} ({} ticks)", phase, ticks)
            }
            Self::InvalidPulseWidth { bit, ticks } => {
                write!(f, "Invalid pulse width for bit {} ({} ticks)", bit, ticks)
            }
            Self::ChecksumMismatch { expected, computed } => write!(
                f,
                "Checksum mismatch (expected {:#04x}, computed {:#04x})",
                expected, computed
            ),
        }
    }
}

impl core::error::Error for CaptureError {}

/// Decoder construction failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderInitError {
    /// The line could not be configured as an output
    Line,
    /// The counter is too slow to resolve the protocol's pulse windows
    CounterTooSlow { hz: u32 },
}

impl core::fmt::Display for DecoderInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Line => write!(f, "Data line configuration failed"),
            Self::CounterTooSlow { hz } => write!(f, "Counter too slow ({} Hz)", hz),
        }
    }
}

impl core::error::Error for DecoderInitError {}

/// Calendar engine failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalendarError {
    /// `init()` has not completed
    NotInitialized,
    /// The peripheral rejected a configuration, time, date or alarm write
    Hardware,
    /// A calendar value or prescaler setting outside its range
    InvalidCalendar,
    /// The calendar stopped advancing during a busy-wait
    Stalled,
}

impl core::fmt::Display for CalendarError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "Calendar not initialized"),
            Self::Hardware => write!(f, "Calendar hardware error"),
            Self::InvalidCalendar => write!(f, "Invalid calendar value"),
            Self::Stalled => write!(f, "Calendar stopped advancing"),
        }
    }
}

impl core::error::Error for CalendarError {}

/// Line interrupt registration failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// The line id is not an interrupt line on this device
    LineOutOfRange { line: u8, lines: u8 },
    /// A handler is already bound to the line
    AlreadyRegistered(u8),
    /// No room left in the registry
    Full,
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LineOutOfRange { line, lines } => {
                write!(f, "Line {} out of range (device has {})", line, lines)
            }
            Self::AlreadyRegistered(line) => write!(f, "Line {} already registered", line),
            Self::Full => write!(f, "Interrupt registry full"),
        }
    }
}

impl core::error::Error for RegistryError {}
