//! Telemetry wire format
//!
//! One [`TelemetryFrame`] per observation, serialized with `postcard` and
//! framed with COBS so a `0x00` byte always ends a frame. The same encoding
//! is used on the device and by host tools reading the stream.

use serde::{Deserialize, Serialize};

use crate::domain::{Observation, RawSample, Temperature};
use crate::ports::telemetry::TelemetryError;

/// Upper bound for an encoded, COBS-framed [`TelemetryFrame`]
pub const MAX_FRAME_SIZE: usize = 32;

/// Byte that terminates every frame
pub const FRAME_DELIMITER: u8 = 0x00;

/// Observation as sent over the wire
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Cycle counter
    pub sequence: u32,
    /// Raw ADC code
    pub raw: u16,
    /// Degrees Celsius
    pub celsius: f32,
    /// Degrees Fahrenheit
    pub fahrenheit: f32,
}

impl From<&Observation> for TelemetryFrame {
    fn from(observation: &Observation) -> Self {
        Self {
            sequence: observation.sequence,
            raw: observation.raw.code(),
            celsius: observation.temperature.celsius,
            fahrenheit: observation.temperature.fahrenheit,
        }
    }
}

impl From<TelemetryFrame> for Observation {
    fn from(frame: TelemetryFrame) -> Self {
        Observation::new(
            frame.sequence,
            RawSample::new(frame.raw),
            Temperature {
                celsius: frame.celsius,
                fahrenheit: frame.fahrenheit,
            },
        )
    }
}

impl TelemetryFrame {
    /// Encode into `buf` as a COBS frame, delimiter included
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], TelemetryError> {
        postcard::to_slice_cobs(self, buf).map_err(|err| match err {
            postcard::Error::SerializeBufferFull => TelemetryError::MessageTooLarge,
            _ => TelemetryError::InvalidFormat,
        })
    }

    /// Decode one COBS frame in place
    pub fn decode(frame: &mut [u8]) -> Result<Self, TelemetryError> {
        postcard::from_bytes_cobs(frame).map_err(|_| TelemetryError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> TelemetryFrame {
        TelemetryFrame {
            sequence: 4_000_000_000,
            raw: 1023,
            celsius: 134.2,
            fahrenheit: 273.56,
        }
    }

    #[test]
    fn test_frame_is_cobs_delimited() {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = frame().encode(&mut buf).unwrap();
        let len = encoded.len();

        assert!(len <= MAX_FRAME_SIZE);
        assert_eq!(encoded[len - 1], FRAME_DELIMITER);
        assert!(!encoded[..len - 1].contains(&FRAME_DELIMITER));

        assert_eq!(TelemetryFrame::decode(encoded).unwrap(), frame());
    }

    #[test]
    fn test_small_buffer_reports_too_large() {
        let mut buf = [0u8; 4];
        assert_eq!(frame().encode(&mut buf), Err(TelemetryError::MessageTooLarge));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let mut garbage = [0x03, 0xFF, 0x00];
        assert_eq!(
            TelemetryFrame::decode(&mut garbage),
            Err(TelemetryError::InvalidFormat)
        );
    }
}
