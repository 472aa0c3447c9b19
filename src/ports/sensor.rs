//! Sensor port - abstraction for reading temperature observations
//!
//! This trait allows the application to read temperatures without knowing
//! which backend (direct registers, driver library, simulation) drives the
//! converter.

use serde::{Deserialize, Serialize};

use crate::domain::{CalibrationError, Observation, RawSample};
use crate::ports::peripheral::AdcConfig;

/// Poll budget used by [`WaitPolicy::default`]
pub const DEFAULT_MAX_POLLS: u32 = 100_000;

/// Error type for sensor operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Conversion did not complete within the poll budget
    #[error("conversion did not complete within {polls} polls")]
    Timeout { polls: u32 },
    /// Reference generator stayed busy during configuration
    #[error("reference generator stayed busy for {polls} polls")]
    ReferenceTimeout { polls: u32 },
    /// Sampling attempted before the peripheral was configured
    #[error("sampler used before configuration")]
    NotConfigured,
    /// Calibration data is unusable
    #[error("invalid calibration: {0}")]
    Calibration(#[from] CalibrationError),
}

impl SensorError {
    /// Whether the main loop should log and try again
    pub const fn is_retryable(&self) -> bool {
        matches!(self, SensorError::Timeout { .. })
    }
}

/// How long to wait on a hardware-ready flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Spin until the flag clears, however long that takes
    Spin,
    /// Give up after `max_polls` polls (at least one poll is always made)
    Bounded { max_polls: u32 },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Bounded {
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl WaitPolicy {
    /// Drive a non-blocking operation to completion.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` only when a bounded budget runs
    /// out; errors from `poll` are passed through untouched.
    pub fn block<T, E>(self, mut poll: impl FnMut() -> nb::Result<T, E>) -> nb::Result<T, E> {
        match self {
            WaitPolicy::Spin => loop {
                match poll() {
                    Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
                    done => return done,
                }
            },
            WaitPolicy::Bounded { max_polls } => {
                for _ in 0..max_polls.max(1) {
                    match poll() {
                        Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
                        done => return done,
                    }
                }
                Err(nb::Error::WouldBlock)
            }
        }
    }

    /// Poll `ready` until it returns `true`; `false` if the budget ran out
    pub fn wait_until(self, mut ready: impl FnMut() -> bool) -> bool {
        self.block(|| {
            if ready() {
                Ok(())
            } else {
                Err(nb::Error::<core::convert::Infallible>::WouldBlock)
            }
        })
        .is_ok()
    }

    /// Number of polls reported in timeout errors (`u32::MAX` when spinning)
    pub const fn budget(&self) -> u32 {
        match self {
            WaitPolicy::Spin => u32::MAX,
            WaitPolicy::Bounded { max_polls } => *max_polls,
        }
    }
}

/// Configuration for sampler behavior
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    /// Converter and reference setup
    pub adc: AdcConfig,
    /// Busy-wait behaviour for reference and conversion flags
    pub wait: WaitPolicy,
    /// Pause between cycles (milliseconds, 0 = back to back)
    pub read_interval_ms: u32,
    /// Number of conversions averaged into one sample
    pub averaging_samples: u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            adc: AdcConfig::default(),
            wait: WaitPolicy::default(),
            read_interval_ms: 0,
            averaging_samples: 1,
        }
    }
}

impl SamplerConfig {
    /// Bare-metal loop: spin on flags, sample back to back
    pub const fn bare_metal() -> Self {
        Self {
            adc: AdcConfig::DEFAULT,
            wait: WaitPolicy::Spin,
            read_interval_ms: 0,
            averaging_samples: 1,
        }
    }

    /// Host or simulation loop: bounded waits, twice a second
    pub const fn host() -> Self {
        Self {
            adc: AdcConfig::DEFAULT,
            wait: WaitPolicy::Bounded {
                max_polls: DEFAULT_MAX_POLLS,
            },
            read_interval_ms: 500,
            averaging_samples: 1,
        }
    }
}

/// Port for reading temperature observations
///
/// # Example Implementation
///
/// ```ignore
/// impl<B: TemperatureBackend, D: DelayNs> SensorPort for TemperatureSampler<B, D> {
///     fn read(&mut self) -> Result<Observation, SensorError> {
///         self.sample()
///     }
///
///     fn last_raw_value(&self) -> Option<RawSample> {
///         self.last_raw
///     }
/// }
/// ```
pub trait SensorPort {
    /// Acquire and convert a single sample
    fn read(&mut self) -> Result<Observation, SensorError>;

    /// Get the last raw ADC value (for diagnostics)
    ///
    /// Returns `None` if nothing was sampled yet or the sensor doesn't
    /// expose raw values.
    fn last_raw_value(&self) -> Option<RawSample> {
        None
    }
}
