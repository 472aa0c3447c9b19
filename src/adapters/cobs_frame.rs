//! Framed serial telemetry adapter
//!
//! This adapter implements the TelemetrySink trait over any `embedded-io`
//! writer (UART, USB CDC, a host pipe).

use embedded_io::Write;
use log::trace;

use crate::domain::Observation;
use crate::ports::telemetry::{TelemetryError, TelemetrySink};
use crate::protocol::{TelemetryFrame, MAX_FRAME_SIZE};

/// Telemetry sink writing COBS-encoded postcard frames
pub struct CobsFrameSink<W> {
    writer: W,
    frames_sent: u32,
}

impl<W: Write> CobsFrameSink<W> {
    /// Create a new sink over a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_sent: 0,
        }
    }

    /// Number of frames written successfully
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Get mutable access to the underlying writer
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Give the writer back
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for CobsFrameSink<W> {
    fn publish(&mut self, observation: &Observation) -> Result<(), TelemetryError> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = TelemetryFrame::from(observation).encode(&mut buf)?;

        self.writer
            .write_all(encoded)
            .map_err(|_| TelemetryError::SendFailed)?;
        self.writer.flush().map_err(|_| TelemetryError::SendFailed)?;

        self.frames_sent = self.frames_sent.wrapping_add(1);
        trace!("frame #{} sent ({} bytes)", observation.sequence, encoded.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawSample, Temperature};
    use crate::protocol::FRAME_DELIMITER;
    use embedded_io::{ErrorKind, ErrorType};

    struct VecWriter(Vec<u8>);

    impl ErrorType for VecWriter {
        type Error = ErrorKind;
    }

    impl Write for VecWriter {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl ErrorType for BrokenWriter {
        type Error = ErrorKind;
    }

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
            Err(ErrorKind::BrokenPipe)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn observation(sequence: u32, code: u16, celsius: f32) -> Observation {
        Observation::new(sequence, RawSample::new(code), Temperature::from_celsius(celsius))
    }

    #[test]
    fn test_frames_decode_back_to_observations() {
        let mut sink = CobsFrameSink::new(VecWriter(Vec::new()));
        let sent = [observation(0, 731, 30.0), observation(1, 879, 85.0)];
        for obs in &sent {
            sink.publish(obs).unwrap();
        }
        assert_eq!(sink.frames_sent(), 2);

        let mut stream = sink.into_inner().0;
        let mut received = Vec::new();
        for frame in stream.split_mut(|b| *b == FRAME_DELIMITER) {
            if frame.is_empty() {
                continue;
            }
            received.push(Observation::from(TelemetryFrame::decode(frame).unwrap()));
        }
        assert_eq!(received, sent);
    }

    #[test]
    fn test_write_failure_reported() {
        let mut sink = CobsFrameSink::new(BrokenWriter);
        assert_eq!(
            sink.publish(&observation(0, 800, 50.0)),
            Err(TelemetryError::SendFailed)
        );
        assert_eq!(sink.frames_sent(), 0);
    }
}
