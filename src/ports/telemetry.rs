//! Telemetry port - where converted observations go
//!
//! The sampler publishes every observation through this trait. What happens
//! next (a debugger-visible cell, a log line, a framed serial stream) is the
//! adapter's business.

use crate::domain::Observation;

/// Error type for publishing observations
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Failed to write to the transport
    #[error("failed to send telemetry")]
    SendFailed,
    /// Encoded message does not fit the frame buffer
    #[error("telemetry message too large")]
    MessageTooLarge,
    /// Message could not be encoded or decoded
    #[error("invalid telemetry format")]
    InvalidFormat,
}

/// Port for publishing observations
///
/// Any `FnMut(&Observation)` closure is a sink that never fails.
pub trait TelemetrySink {
    /// Publish one observation
    fn publish(&mut self, observation: &Observation) -> Result<(), TelemetryError>;
}

impl<F: FnMut(&Observation)> TelemetrySink for F {
    fn publish(&mut self, observation: &Observation) -> Result<(), TelemetryError> {
        self(observation);
        Ok(())
    }
}
