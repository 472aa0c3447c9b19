//! Adapters - concrete implementations of ports
//!
//! Adapters connect the domain to the outside world by implementing
//! the port traits. Each adapter knows how to work with a specific
//! technology or hardware.
//!
//! # Available Adapters
//!
//! - **direct_register**: ADC10_A/REF_A driven by whole control-word writes
//! - **library**: ADC10_A/REF_A driven through the typed driver library
//! - **simulated**: host-side register file standing in for the hardware
//! - **cobs_frame**: postcard/COBS telemetry over an `embedded-io` writer
//! - **debug_sinks**: last-value cell and log output

pub mod cobs_frame;
pub mod debug_sinks;
pub mod direct_register;
pub mod driverlib;
pub mod library;
pub mod registers;
pub mod simulated;

pub use cobs_frame::CobsFrameSink;
pub use debug_sinks::{LatestObservation, LogSink};
pub use direct_register::DirectRegisterBackend;
pub use library::LibraryBackend;
pub use registers::{Mmio, RegisterAccess, RegisterSnapshot};
pub use simulated::SimulatedAdc10;

/// Backend chosen at build time: the driver library with the `driverlib`
/// feature, direct register writes otherwise
#[cfg(feature = "driverlib")]
pub type SelectedBackend<R> = LibraryBackend<R>;

/// Backend chosen at build time: the driver library with the `driverlib`
/// feature, direct register writes otherwise
#[cfg(not(feature = "driverlib"))]
pub type SelectedBackend<R> = DirectRegisterBackend<R>;
