//! Raw 40-bit frames and their decoded fields

/// Bits in one sensor frame
pub const FRAME_BITS: usize = 40;

/// Sensor variants sharing the single-wire framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorModel {
    /// Integer byte plus a tenths byte for each quantity
    #[default]
    Dht11,
    /// 16-bit big-endian tenths, temperature sign in the top bit
    Dht22,
}

/// The 40 bits captured from the line, in transmission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    bits: [bool; FRAME_BITS],
}

impl Default for RawFrame {
    fn default() -> Self {
        Self {
            bits: [false; FRAME_BITS],
        }
    }
}

impl RawFrame {
    pub const fn from_bits(bits: [bool; FRAME_BITS]) -> Self {
        Self { bits }
    }

    /// Expand five bytes most-significant bit first.
    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        let mut frame = Self::default();
        for (index, bit) in frame.bits.iter_mut().enumerate() {
            *bit = (bytes[index / 8] >> (7 - index % 8)) & 1 == 1;
        }
        frame
    }

    pub fn set(&mut self, index: usize, bit: bool) {
        self.bits[index] = bit;
    }

    pub fn bits(&self) -> &[bool; FRAME_BITS] {
        &self.bits
    }

    /// Split into four data bytes and the checksum byte.
    pub fn decode(&self) -> DecodedReading {
        let mut bytes = [0u8; 5];
        for (byte, chunk) in bytes.iter_mut().zip(self.bits.chunks_exact(8)) {
            *byte = chunk
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit));
        }
        DecodedReading {
            humidity_integer: bytes[0],
            humidity_fraction: bytes[1],
            temperature_integer: bytes[2],
            temperature_fraction: bytes[3],
            checksum: bytes[4],
        }
    }
}

/// The five fields of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedReading {
    pub humidity_integer: u8,
    pub humidity_fraction: u8,
    pub temperature_integer: u8,
    pub temperature_fraction: u8,
    /// Checksum byte as transmitted
    pub checksum: u8,
}

impl DecodedReading {
    /// Low byte of the sum of the four data bytes.
    pub fn computed_checksum(&self) -> u8 {
        self.humidity_integer
            .wrapping_add(self.humidity_fraction)
            .wrapping_add(self.temperature_integer)
            .wrapping_add(self.temperature_fraction)
    }

    pub fn checksum_ok(&self) -> bool {
        self.computed_checksum() == self.checksum
    }

    /// Interpret the fields for the given sensor model.
    pub fn measurement(&self, model: SensorModel) -> Measurement {
        match model {
            SensorModel::Dht11 => Measurement {
                temperature_decicelsius: self.temperature_integer as i16 * 10
                    + (self.temperature_fraction % 10) as i16,
                humidity_permille: self.humidity_integer as u16 * 10
                    + (self.humidity_fraction % 10) as u16,
            },
            SensorModel::Dht22 => {
                let humidity = u16::from_be_bytes([self.humidity_integer, self.humidity_fraction]);
                let magnitude =
                    u16::from_be_bytes([self.temperature_integer & 0x7F, self.temperature_fraction])
                        as i16;
                let temperature = if self.temperature_integer & 0x80 != 0 {
                    -magnitude
                } else {
                    magnitude
                };
                Measurement {
                    temperature_decicelsius: temperature,
                    humidity_permille: humidity,
                }
            }
        }
    }
}

/// A reading in fixed-point units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature in 0.1 °C
    pub temperature_decicelsius: i16,
    /// Relative humidity in 0.1 %RH
    pub humidity_permille: u16,
}
