//! Temperature sampler - configure once, then acquire, convert, publish
//!
//! The sampler owns a backend (exclusive use of the ADC), a delay provider
//! and the calibration. It is the only component with control flow; the
//! ports it drives do the hardware work and the domain does the math.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::domain::{Observation, RawSample, TemperatureCalibration};
use crate::ports::peripheral::TemperatureBackend;
use crate::ports::sensor::{SamplerConfig, SensorError, SensorPort};
use crate::ports::telemetry::TelemetrySink;

/// Single-channel temperature sampler
pub struct TemperatureSampler<B, D> {
    backend: B,
    delay: D,
    calibration: TemperatureCalibration,
    config: SamplerConfig,
    configured: bool,
    sequence: u32,
    last_raw: Option<RawSample>,
}

impl<B: TemperatureBackend, D: DelayNs> TemperatureSampler<B, D> {
    /// Create a sampler; nothing touches the hardware until [`start`](Self::start)
    pub fn new(backend: B, delay: D, calibration: TemperatureCalibration, config: SamplerConfig) -> Self {
        Self {
            backend,
            delay,
            calibration,
            config,
            configured: false,
            sequence: 0,
            last_raw: None,
        }
    }

    /// Configure the converter and reference.
    ///
    /// Only the first successful call programs the hardware; later calls
    /// return `Ok` without touching it.
    pub fn start(&mut self) -> Result<(), SensorError> {
        if self.configured {
            debug!("sampler already configured");
            return Ok(());
        }

        self.backend
            .configure(&self.config.adc, self.config.wait, &mut self.delay)?;
        self.configured = true;

        info!(
            "sampler started: calibration {}/{} at {}/{} °C, {:?}",
            self.calibration.pair.low(),
            self.calibration.pair.high(),
            self.calibration.low_c,
            self.calibration.high_c,
            self.config.wait
        );
        Ok(())
    }

    /// Whether [`start`](Self::start) has succeeded
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Acquire and convert one sample
    pub fn sample(&mut self) -> Result<Observation, SensorError> {
        if !self.configured {
            return Err(SensorError::NotConfigured);
        }

        let raw = self.acquire_averaged()?;
        self.last_raw = Some(raw);

        let observation = Observation::new(self.sequence, raw, self.calibration.convert(raw));
        self.sequence = self.sequence.wrapping_add(1);
        Ok(observation)
    }

    fn acquire_averaged(&mut self) -> Result<RawSample, SensorError> {
        let count = u32::from(self.config.averaging_samples.max(1));
        if count == 1 {
            return self.backend.acquire(self.config.wait);
        }

        let mut sum = 0u32;
        for _ in 0..count {
            sum += u32::from(self.backend.acquire(self.config.wait)?.code());
        }
        // Rounded mean of codes that each fit in u16
        Ok(RawSample::new(((sum + count / 2) / count) as u16))
    }

    /// One cycle: sample, then publish.
    ///
    /// A sink failure is logged and does not fail the cycle.
    pub fn step<S: TelemetrySink + ?Sized>(&mut self, sink: &mut S) -> Result<Observation, SensorError> {
        let observation = self.sample()?;
        if let Err(err) = sink.publish(&observation) {
            error!("failed to publish observation #{}: {}", observation.sequence, err);
        }
        Ok(observation)
    }

    /// Configure, then sample and publish forever.
    ///
    /// Conversion timeouts are logged and retried. Only configuration
    /// failures end the loop.
    pub fn run<S: TelemetrySink + ?Sized>(&mut self, sink: &mut S) -> Result<Infallible, SensorError> {
        self.start()?;

        loop {
            self.cycle(sink)?;
        }
    }

    /// One loop iteration: step, then wait out the interval.
    ///
    /// A retryable error is logged and reported as `Ok(None)`; anything
    /// else is returned before waiting.
    pub fn cycle<S: TelemetrySink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<Option<Observation>, SensorError> {
        let observation = match self.step(sink) {
            Ok(observation) => Some(observation),
            Err(err) if err.is_retryable() => {
                warn!("{}, retrying", err);
                None
            }
            Err(err) => return Err(err),
        };

        self.wait_interval();
        Ok(observation)
    }

    /// Wait out the configured interval between cycles
    pub fn wait_interval(&mut self) {
        if self.config.read_interval_ms > 0 {
            self.delay.delay_ms(self.config.read_interval_ms);
        }
    }

    /// Current calibration
    pub fn calibration(&self) -> TemperatureCalibration {
        self.calibration
    }

    /// Replace the calibration used for subsequent samples
    pub fn set_calibration(&mut self, calibration: TemperatureCalibration) {
        self.calibration = calibration;
    }

    /// Sampler configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Take the backend and delay provider back
    pub fn release(self) -> (B, D) {
        (self.backend, self.delay)
    }
}

impl<B: TemperatureBackend, D: DelayNs> SensorPort for TemperatureSampler<B, D> {
    fn read(&mut self) -> Result<Observation, SensorError> {
        self.sample()
    }

    fn last_raw_value(&self) -> Option<RawSample> {
        self.last_raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        DirectRegisterBackend, LatestObservation, LibraryBackend, SimulatedAdc10,
    };
    use std::collections::VecDeque;

    use crate::domain::CalibrationPair;
    use crate::ports::peripheral::{Acquisition, AdcConfig, PeripheralConfigurator, ReferenceVoltage};
    use crate::ports::sensor::WaitPolicy;
    use crate::ports::telemetry::TelemetryError;

    #[derive(Default)]
    struct CountingDelay {
        total_us: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_us += u64::from(ns / 1000);
        }

        fn delay_us(&mut self, us: u32) {
            self.total_us += u64::from(us);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_us += u64::from(ms) * 1000;
        }
    }

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        fn publish(&mut self, _observation: &Observation) -> Result<(), TelemetryError> {
            Err(TelemetryError::SendFailed)
        }
    }

    /// Backend that plays back a fixed sequence of poll results, then
    /// reports itself unconfigured
    struct ScriptedBackend {
        polls: VecDeque<nb::Result<RawSample, SensorError>>,
    }

    impl ScriptedBackend {
        fn new(polls: impl IntoIterator<Item = nb::Result<RawSample, SensorError>>) -> Self {
            Self {
                polls: polls.into_iter().collect(),
            }
        }
    }

    impl PeripheralConfigurator for ScriptedBackend {
        fn setup_converter(&mut self, _config: &AdcConfig) {}

        fn reference_ready(&mut self) -> bool {
            true
        }

        fn enable_reference(&mut self, _voltage: ReferenceVoltage) {}
    }

    impl Acquisition for ScriptedBackend {
        fn poll_conversion(&mut self) -> nb::Result<RawSample, SensorError> {
            self.polls
                .pop_front()
                .unwrap_or(Err(nb::Error::Other(SensorError::NotConfigured)))
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn calibration() -> TemperatureCalibration {
        TemperatureCalibration::adc10(CalibrationPair::new(731, 879).unwrap())
    }

    fn sampler(
        config: SamplerConfig,
    ) -> TemperatureSampler<DirectRegisterBackend<SimulatedAdc10>, CountingDelay> {
        init_logging();
        let backend = DirectRegisterBackend::new(SimulatedAdc10::new(calibration()));
        TemperatureSampler::new(backend, CountingDelay::default(), calibration(), config)
    }

    fn simulator<D: DelayNs>(
        sampler: &mut TemperatureSampler<DirectRegisterBackend<SimulatedAdc10>, D>,
    ) -> &mut SimulatedAdc10 {
        sampler.backend_mut().registers_mut()
    }

    #[test]
    fn test_sample_before_start_fails() {
        let mut sampler = sampler(SamplerConfig::default());
        assert_eq!(sampler.sample(), Err(SensorError::NotConfigured));
        assert_eq!(sampler.last_raw_value(), None);
    }

    #[test]
    fn test_start_waits_for_reference_settle() {
        let mut sampler = sampler(SamplerConfig::default());
        sampler.start().unwrap();
        assert!(sampler.is_configured());
        assert_eq!(sampler.release().1.total_us, 75);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut sampler = sampler(SamplerConfig::default());
        sampler.start().unwrap();
        simulator(&mut sampler).set_reference_busy_reads(u32::MAX);
        // A second configuration would time out on the busy reference
        assert_eq!(sampler.start(), Ok(()));
    }

    #[test]
    fn test_samples_convert_through_calibration() {
        let mut sampler = sampler(SamplerConfig::bare_metal());
        sampler.start().unwrap();

        simulator(&mut sampler).set_die_temperature(30.0);
        let first = sampler.sample().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.raw.code(), 731);
        assert_eq!(first.temperature.celsius, 30.0);
        assert_eq!(first.temperature.fahrenheit, 86.0);

        simulator(&mut sampler).set_die_temperature(85.0);
        let second = sampler.read().unwrap();
        assert_eq!(second.sequence, 1);
        assert_eq!(second.temperature.celsius, 85.0);
        assert_eq!(second.temperature.fahrenheit, 185.0);
        assert_eq!(sampler.last_raw_value(), Some(RawSample::new(879)));
    }

    #[test]
    fn test_step_publishes_to_sink() {
        let mut sampler = sampler(SamplerConfig::default());
        sampler.start().unwrap();
        let mut latest = LatestObservation::new();

        for _ in 0..3 {
            sampler.step(&mut latest).unwrap();
        }
        assert_eq!(latest.published(), 3);
        assert_eq!(latest.get().unwrap().sequence, 2);
    }

    #[test]
    fn test_closure_sink() {
        let mut sampler = sampler(SamplerConfig::default());
        sampler.start().unwrap();
        let mut seen = Vec::new();
        let mut sink = |obs: &Observation| seen.push(obs.raw.code());

        sampler.step(&mut sink).unwrap();
        sampler.step(&mut sink).unwrap();
        assert_eq!(seen, [718, 718]);
    }

    #[test]
    fn test_publish_failure_does_not_fail_cycle() {
        let mut sampler = sampler(SamplerConfig::default());
        sampler.start().unwrap();
        assert!(sampler.step(&mut FailingSink).is_ok());
        assert!(sampler.step(&mut FailingSink).is_ok());
    }

    #[test]
    fn test_timeout_is_retryable_and_recovers() {
        let config = SamplerConfig {
            wait: WaitPolicy::Bounded { max_polls: 64 },
            ..SamplerConfig::default()
        };
        let mut sampler = sampler(config);
        sampler.start().unwrap();

        simulator(&mut sampler).stall(true);
        let err = sampler.sample().unwrap_err();
        assert_eq!(err, SensorError::Timeout { polls: 64 });
        assert!(err.is_retryable());

        simulator(&mut sampler).stall(false);
        let obs = sampler.sample().unwrap();
        // Sequence only advances on success
        assert_eq!(obs.sequence, 0);
    }

    #[test]
    fn test_run_returns_configuration_errors() {
        let config = SamplerConfig {
            wait: WaitPolicy::Bounded { max_polls: 8 },
            ..SamplerConfig::default()
        };
        let mut sampler = sampler(config);
        simulator(&mut sampler).set_reference_busy_reads(u32::MAX);

        let mut latest = LatestObservation::new();
        assert_eq!(
            sampler.run(&mut latest),
            Err(SensorError::ReferenceTimeout { polls: 8 })
        );
        assert_eq!(latest.published(), 0);
    }

    #[test]
    fn test_run_retries_timeouts_until_fatal_error() {
        init_logging();
        let backend = ScriptedBackend::new([
            Ok(RawSample::new(731)),
            Err(nb::Error::WouldBlock),
            Ok(RawSample::new(879)),
            Err(nb::Error::WouldBlock),
            Ok(RawSample::new(805)),
        ]);
        let config = SamplerConfig {
            wait: WaitPolicy::Bounded { max_polls: 1 },
            read_interval_ms: 10,
            ..SamplerConfig::default()
        };
        let mut sampler =
            TemperatureSampler::new(backend, CountingDelay::default(), calibration(), config);

        let mut published = Vec::new();
        let mut sink = |obs: &Observation| published.push((obs.sequence, obs.raw.code()));
        assert_eq!(sampler.run(&mut sink), Err(SensorError::NotConfigured));

        assert_eq!(published, [(0, 731), (1, 879), (2, 805)]);
        // Settle delay plus one interval for each of the five cycles that finished
        assert_eq!(sampler.release().1.total_us, 75 + 5 * 10_000);
    }

    #[test]
    fn test_cycle_reports_timeout_as_none() {
        let config = SamplerConfig {
            wait: WaitPolicy::Bounded { max_polls: 16 },
            ..SamplerConfig::default()
        };
        let mut sampler = sampler(config);
        sampler.start().unwrap();
        let mut latest = LatestObservation::new();

        simulator(&mut sampler).stall(true);
        assert_eq!(sampler.cycle(&mut latest), Ok(None));
        assert_eq!(latest.published(), 0);

        simulator(&mut sampler).stall(false);
        let obs = sampler.cycle(&mut latest).unwrap().unwrap();
        assert_eq!(latest.get(), Some(obs));
    }

    #[test]
    fn test_averaging_rounds_mean_code() {
        let config = SamplerConfig {
            averaging_samples: 4,
            ..SamplerConfig::default()
        };
        let mut sampler = sampler(config);
        sampler.start().unwrap();
        simulator(&mut sampler).force_code(Some(801));

        let obs = sampler.sample().unwrap();
        assert_eq!(obs.raw.code(), 801);
        assert_eq!(simulator(&mut sampler).conversions(), 4);
    }

    #[test]
    fn test_library_backend_produces_same_observations() {
        init_logging();
        let backend = LibraryBackend::new(SimulatedAdc10::new(calibration()));
        let mut library = TemperatureSampler::new(
            backend,
            CountingDelay::default(),
            calibration(),
            SamplerConfig::default(),
        );
        let mut direct = sampler(SamplerConfig::default());
        library.start().unwrap();
        direct.start().unwrap();

        for celsius in [10.0, 42.0, 99.0] {
            library.backend_mut().registers_mut().set_die_temperature(celsius);
            simulator(&mut direct).set_die_temperature(celsius);
            assert_eq!(library.sample(), direct.sample());
        }
    }

    #[test]
    fn test_interval_uses_delay() {
        let config = SamplerConfig {
            read_interval_ms: 500,
            ..SamplerConfig::default()
        };
        let mut sampler = sampler(config);
        sampler.wait_interval();
        assert_eq!(sampler.release().1.total_us, 500_000);
    }
}
