//! Peripheral ports - converter configuration and acquisition
//!
//! These traits are the seam between the sampler and whatever drives the
//! ADC: raw register writes, a driver library, or a simulation. A backend
//! implements both and the sampler never touches hardware directly.

use embedded_hal::delay::DelayNs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::RawSample;
use crate::ports::sensor::{SensorError, WaitPolicy};

/// Converter resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits8,
    Bits10,
}

impl Resolution {
    /// Largest code the converter can produce
    pub const fn max_code(self) -> u16 {
        match self {
            Resolution::Bits8 => 0x00FF,
            Resolution::Bits10 => 0x03FF,
        }
    }
}

/// Sample-and-hold time in converter clock cycles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SampleHoldCycles {
    Cycles4 = 0,
    Cycles8 = 1,
    Cycles16 = 2,
    Cycles32 = 3,
    Cycles64 = 4,
    Cycles96 = 5,
    Cycles128 = 6,
    Cycles192 = 7,
    Cycles256 = 8,
    Cycles384 = 9,
    Cycles512 = 10,
    Cycles768 = 11,
    Cycles1024 = 12,
}

/// Internal reference generator level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReferenceVoltage {
    V1_5 = 0,
    V2_0 = 1,
    V2_5 = 2,
}

/// Converter input channel (0..=15)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputChannel(u8);

impl InputChannel {
    /// Internal temperature sensor
    pub const TEMPERATURE_SENSOR: InputChannel = InputChannel(10);

    /// Create a channel, `None` if out of range
    pub const fn new(channel: u8) -> Option<Self> {
        if channel < 16 {
            Some(Self(channel))
        } else {
            None
        }
    }

    /// Get the raw channel number
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for InputChannel {
    type Error = &'static str;

    fn try_from(channel: u8) -> Result<Self, Self::Error> {
        Self::new(channel).ok_or("input channel out of range")
    }
}

impl From<InputChannel> for u8 {
    fn from(channel: InputChannel) -> u8 {
        channel.0
    }
}

/// Converter and reference configuration, applied once at startup
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// Input to convert
    pub channel: InputChannel,
    /// Output resolution
    pub resolution: Resolution,
    /// Sample-and-hold time; the temperature sensor needs at least 30 µs
    pub sample_hold: SampleHoldCycles,
    /// Positive reference level
    pub reference: ReferenceVoltage,
    /// Time for the reference to settle after it is switched on (µs)
    pub reference_settle_us: u32,
}

impl AdcConfig {
    /// Temperature sensor, 10-bit, 32-cycle sample/hold against internal 1.5 V
    pub const DEFAULT: Self = Self {
        channel: InputChannel::TEMPERATURE_SENSOR,
        resolution: Resolution::Bits10,
        sample_hold: SampleHoldCycles::Cycles32,
        reference: ReferenceVoltage::V1_5,
        reference_settle_us: 75,
    };
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Port for one-time peripheral configuration
pub trait PeripheralConfigurator {
    /// Program sample/hold timing, resolution, reference source and channel
    fn setup_converter(&mut self, config: &AdcConfig);

    /// Whether the reference generator is idle and may be reprogrammed
    fn reference_ready(&mut self) -> bool;

    /// Select the reference level and switch the generator on
    fn enable_reference(&mut self, voltage: ReferenceVoltage);

    /// Full configuration sequence.
    ///
    /// After this returns `Ok`, [`Acquisition::acquire`] yields valid samples.
    fn configure<D: DelayNs>(
        &mut self,
        config: &AdcConfig,
        wait: WaitPolicy,
        delay: &mut D,
    ) -> Result<(), SensorError> {
        self.setup_converter(config);

        if !wait.wait_until(|| self.reference_ready()) {
            return Err(SensorError::ReferenceTimeout {
                polls: wait.budget(),
            });
        }

        self.enable_reference(config.reference);
        delay.delay_us(config.reference_settle_us);

        debug!(
            "ADC configured: channel {}, {:?}, {:?}, reference {:?}",
            config.channel.value(),
            config.resolution,
            config.sample_hold,
            config.reference
        );
        Ok(())
    }
}

/// Port for single-channel, single conversions
pub trait Acquisition {
    /// Start a conversion if none is running, then report its state.
    ///
    /// Returns `WouldBlock` while the converter is busy. A conversion that
    /// is already in flight is never restarted.
    fn poll_conversion(&mut self) -> nb::Result<RawSample, SensorError>;

    /// Block until a conversion completes or the wait budget runs out
    fn acquire(&mut self, wait: WaitPolicy) -> Result<RawSample, SensorError> {
        wait.block(|| self.poll_conversion()).map_err(|err| match err {
            nb::Error::WouldBlock => SensorError::Timeout {
                polls: wait.budget(),
            },
            nb::Error::Other(err) => err,
        })
    }
}

/// Everything the sampler needs from a backend
pub trait TemperatureBackend: PeripheralConfigurator + Acquisition {}

impl<T: PeripheralConfigurator + Acquisition> TemperatureBackend for T {}
