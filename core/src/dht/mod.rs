//! DHT-family single-wire humidity/temperature sensors

mod decoder;
mod frame;

pub use decoder::{DhtDecoder, ProtocolTimings, Reading, SensorResult};
pub use frame::{DecodedReading, Measurement, RawFrame, SensorModel, FRAME_BITS};
