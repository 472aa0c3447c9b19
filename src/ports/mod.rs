//! Ports (interfaces) defining the boundaries of the application
//!
//! Ports are traits that define how the domain interacts with hardware and
//! with whoever consumes its output.
//!
//! - **PeripheralConfigurator**: one-time converter and reference setup
//! - **Acquisition**: start a conversion and wait for end of conversion
//! - **SensorPort**: read a converted observation
//! - **TelemetrySink**: publish observations (debug cell, log, serial)

pub mod peripheral;
pub mod sensor;
pub mod telemetry;

pub use peripheral::{
    Acquisition, AdcConfig, InputChannel, PeripheralConfigurator, ReferenceVoltage, Resolution,
    SampleHoldCycles, TemperatureBackend,
};
pub use sensor::{SamplerConfig, SensorError, SensorPort, WaitPolicy};
pub use telemetry::{TelemetryError, TelemetrySink};
