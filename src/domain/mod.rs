//! Domain layer - pure business logic independent of infrastructure
//!
//! This module contains the calibration contract and the raw-code to
//! temperature conversion, plus the entities that flow through a cycle.

pub mod calibration;
pub mod reading;

pub use calibration::{convert, CalibrationError, CalibrationPair, TemperatureCalibration};
pub use reading::{Observation, RawSample, Temperature};
