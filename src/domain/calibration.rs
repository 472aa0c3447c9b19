//! Temperature calibration domain service
//!
//! This module provides the factory calibration contract and the linear
//! conversion from raw ADC codes to temperature.

use serde::{Deserialize, Serialize};

use crate::domain::reading::{RawSample, Temperature};

/// Low reference temperature of the factory calibration (°C)
pub const DEFAULT_LOW_REFERENCE_C: f32 = 30.0;

/// High reference temperature of the factory calibration (°C)
pub const DEFAULT_HIGH_REFERENCE_C: f32 = 85.0;

/// TLV address of the ADC10 code at 30 °C with the 1.5 V reference (MSP430F5xx)
pub const TLV_CAL_ADC10_1V5_30C: usize = 0x1A1A;

/// TLV address of the ADC10 code at 85 °C with the 1.5 V reference (MSP430F5xx)
pub const TLV_CAL_ADC10_1V5_85C: usize = 0x1A1C;

/// Error type for calibration data
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Both calibration points carry the same code, the slope is undefined
    #[error("calibration codes are identical ({code}), slope is undefined")]
    DegeneratePair { code: u16 },
    /// A reference temperature is NaN or infinite
    #[error("calibration reference temperature is not finite")]
    NonFiniteReference,
}

/// Two factory-programmed ADC codes taken at known temperatures.
///
/// The only way to build one is through [`CalibrationPair::new`] (or
/// deserialization, which goes through the same check), so `high != low`
/// holds for every value of this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationCodes")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPair {
    low: u16,
    high: u16,
}

#[derive(Deserialize)]
struct CalibrationCodes {
    low: u16,
    high: u16,
}

impl TryFrom<CalibrationCodes> for CalibrationPair {
    type Error = CalibrationError;

    fn try_from(codes: CalibrationCodes) -> Result<Self, Self::Error> {
        Self::new(codes.low, codes.high)
    }
}

impl CalibrationPair {
    /// Create a calibration pair, rejecting identical codes
    pub const fn new(low: u16, high: u16) -> Result<Self, CalibrationError> {
        if low == high {
            return Err(CalibrationError::DegeneratePair { code: low });
        }
        Ok(Self { low, high })
    }

    /// Read the pair from the device's factory calibration table.
    ///
    /// # Safety
    ///
    /// Both addresses must be valid, aligned and readable `u16` locations,
    /// e.g. [`TLV_CAL_ADC10_1V5_30C`] and [`TLV_CAL_ADC10_1V5_85C`] on an
    /// MSP430F5xx.
    pub unsafe fn read_factory(low_addr: usize, high_addr: usize) -> Result<Self, CalibrationError> {
        let low = unsafe { core::ptr::read_volatile(low_addr as *const u16) };
        let high = unsafe { core::ptr::read_volatile(high_addr as *const u16) };
        Self::new(low, high)
    }

    /// Code at the low reference temperature
    pub const fn low(&self) -> u16 {
        self.low
    }

    /// Code at the high reference temperature
    pub const fn high(&self) -> u16 {
        self.high
    }

    /// Signed distance between the two codes, never zero
    pub const fn span(&self) -> i32 {
        self.high as i32 - self.low as i32
    }
}

/// Convert a raw sample to temperature by linear interpolation between two
/// calibration points.
///
/// Samples outside the calibrated range extrapolate along the same line and
/// are not clamped.
pub fn convert(sample: RawSample, cal: CalibrationPair, low_c: f32, high_c: f32) -> Temperature {
    let offset = i32::from(sample.code()) - i32::from(cal.low);
    let celsius = offset as f32 * (high_c - low_c) / cal.span() as f32 + low_c;
    Temperature::from_celsius(celsius)
}

/// Calibration pair bundled with the reference temperatures it was taken at
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationPoints")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureCalibration {
    /// Factory codes
    pub pair: CalibrationPair,
    /// Temperature at `pair.low()` (°C)
    pub low_c: f32,
    /// Temperature at `pair.high()` (°C)
    pub high_c: f32,
}

#[derive(Deserialize)]
struct CalibrationPoints {
    pair: CalibrationPair,
    low_c: f32,
    high_c: f32,
}

impl TryFrom<CalibrationPoints> for TemperatureCalibration {
    type Error = CalibrationError;

    fn try_from(points: CalibrationPoints) -> Result<Self, Self::Error> {
        Self::new(points.pair, points.low_c, points.high_c)
    }
}

impl TemperatureCalibration {
    /// Create a calibration with custom reference temperatures
    pub fn new(pair: CalibrationPair, low_c: f32, high_c: f32) -> Result<Self, CalibrationError> {
        if !low_c.is_finite() || !high_c.is_finite() {
            return Err(CalibrationError::NonFiniteReference);
        }
        Ok(Self { pair, low_c, high_c })
    }

    /// ADC10_A factory calibration: codes taken at 30 °C and 85 °C
    pub const fn adc10(pair: CalibrationPair) -> Self {
        Self {
            pair,
            low_c: DEFAULT_LOW_REFERENCE_C,
            high_c: DEFAULT_HIGH_REFERENCE_C,
        }
    }

    /// Convert a raw sample to temperature
    #[inline]
    pub fn convert(&self, sample: RawSample) -> Temperature {
        convert(sample, self.pair, self.low_c, self.high_c)
    }
}
