//! MSP430 ADC10 Internal Temperature Sampler
//!
//! This library samples the on-die temperature sensor of an MSP430F5xx
//! through the ADC10_A converter and the REF_A reference generator, and
//! converts raw codes to degrees using the factory calibration pair.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - CalibrationPair / TemperatureCalibration                     │
//! │  - convert(): raw code -> Celsius and Fahrenheit                │
//! │  - Observation entity                                           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - PeripheralConfigurator: converter + reference setup          │
//! │  - Acquisition: start a conversion, wait, read the result       │
//! │  - SensorPort: read an observation                              │
//! │  - TelemetrySink: publish observations                          │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - DirectRegisterBackend: whole control-word writes             │
//! │  - LibraryBackend: typed driver library calls                   │
//! │  - SimulatedAdc10: host register file                           │
//! │  - CobsFrameSink / LogSink / LatestObservation                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`TemperatureSampler`] ties the layers together: configure once, then
//! acquire, convert and publish in a loop.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

// ============================================================================
// Protocol (shared between host and device)
// ============================================================================

pub mod protocol;

pub use protocol::{TelemetryFrame, FRAME_DELIMITER, MAX_FRAME_SIZE};

// ============================================================================
// Hexagonal Architecture
// ============================================================================

/// Domain layer - pure conversion logic
pub mod domain;

/// Ports - traits defining boundaries
pub mod ports;

/// Adapters - concrete implementations
pub mod adapters;

/// Sampling loop
pub mod sampler;

// Re-export key domain types
pub use domain::{
    convert, CalibrationError, CalibrationPair, Observation, RawSample, Temperature,
    TemperatureCalibration,
};

// Re-export key port traits
pub use ports::{
    Acquisition, AdcConfig, PeripheralConfigurator, SamplerConfig, SensorError, SensorPort,
    TelemetryError, TelemetrySink, TemperatureBackend, WaitPolicy,
};

// Re-export adapters
pub use adapters::{
    CobsFrameSink, DirectRegisterBackend, LatestObservation, LibraryBackend, LogSink, Mmio,
    RegisterAccess, RegisterSnapshot, SelectedBackend, SimulatedAdc10,
};

pub use sampler::TemperatureSampler;
