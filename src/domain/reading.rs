//! Sensor reading domain entities
//!
//! This module defines the raw ADC sample, the converted temperature and the
//! per-cycle observation. None of them know how they are acquired or where
//! they are published.

use serde::{Deserialize, Serialize};

/// Raw digital code produced by one conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(u16);

impl RawSample {
    /// Wrap a raw code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the raw code
    pub const fn code(&self) -> u16 {
        self.0
    }
}

impl From<u16> for RawSample {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// A temperature in Celsius with its derived Fahrenheit value
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    /// Degrees Celsius
    pub celsius: f32,
    /// Degrees Fahrenheit, always `celsius * 9 / 5 + 32`
    pub fahrenheit: f32,
}

impl Temperature {
    /// Build a temperature from Celsius, deriving Fahrenheit
    #[inline]
    pub fn from_celsius(celsius: f32) -> Self {
        Self {
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
        }
    }
}

/// Convert Celsius to Fahrenheit
#[inline]
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// One acquisition cycle's output.
///
/// Recomputed every cycle and handed to a telemetry sink; nothing retains a
/// history of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Observation {
    /// Cycle counter, starting at 0 for the first successful sample
    pub sequence: u32,
    /// Code the temperature was converted from
    pub raw: RawSample,
    /// Converted temperature
    pub temperature: Temperature,
}

impl Observation {
    /// Create a new observation
    pub const fn new(sequence: u32, raw: RawSample, temperature: Temperature) -> Self {
        Self {
            sequence,
            raw,
            temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fahrenheit_reference_points() {
        assert_eq!(Temperature::from_celsius(0.0).fahrenheit, 32.0);
        assert_eq!(Temperature::from_celsius(100.0).fahrenheit, 212.0);
        assert_eq!(Temperature::from_celsius(-40.0).fahrenheit, -40.0);
    }

    #[test]
    fn test_raw_sample_ordering() {
        assert!(RawSample::new(10) < RawSample::from(11));
        assert_eq!(RawSample::new(1023).code(), 1023);
    }
}
