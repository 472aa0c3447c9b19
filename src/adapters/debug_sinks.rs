//! Local telemetry sinks
//!
//! - [`LatestObservation`] keeps the most recent observation where a
//!   debugger or the surrounding firmware can look at it
//! - [`LogSink`] writes each observation to the `log` facade

use log::info;

use crate::domain::Observation;
use crate::ports::telemetry::{TelemetryError, TelemetrySink};

/// Sink that remembers the last observation published
#[derive(Clone, Copy, Debug, Default)]
pub struct LatestObservation {
    latest: Option<Observation>,
    published: u32,
}

impl LatestObservation {
    /// Create an empty sink
    pub const fn new() -> Self {
        Self {
            latest: None,
            published: 0,
        }
    }

    /// Most recent observation, if any
    pub fn get(&self) -> Option<Observation> {
        self.latest
    }

    /// Number of observations published so far
    pub fn published(&self) -> u32 {
        self.published
    }
}

impl TelemetrySink for LatestObservation {
    fn publish(&mut self, observation: &Observation) -> Result<(), TelemetryError> {
        self.latest = Some(*observation);
        self.published = self.published.wrapping_add(1);
        Ok(())
    }
}

/// Sink that logs every observation at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&mut self, observation: &Observation) -> Result<(), TelemetryError> {
        info!(
            "#{}: raw={} {:.2}°C {:.2}°F",
            observation.sequence,
            observation.raw.code(),
            observation.temperature.celsius,
            observation.temperature.fahrenheit
        );
        Ok(())
    }
}
