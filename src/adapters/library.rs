//! Driver-library backend
//!
//! Implements the peripheral ports through the typed [`Adc10`] driver
//! instead of raw control words. Produces the same register state as
//! [`DirectRegisterBackend`](crate::adapters::DirectRegisterBackend) for the
//! same [`AdcConfig`].

use log::debug;

use crate::adapters::driverlib::{
    Adc10, ClockDivider, ClockSource, ConversionMode, NegativeReference, PositiveReference,
    SampleHoldSource,
};
use crate::adapters::registers::{RegisterAccess, RegisterSnapshot};
use crate::domain::RawSample;
use crate::ports::peripheral::{
    Acquisition, AdcConfig, PeripheralConfigurator, ReferenceVoltage, Resolution,
};
use crate::ports::sensor::SensorError;

/// ADC backend built on the peripheral driver library
pub struct LibraryBackend<R> {
    adc: Adc10<R>,
    resolution: Resolution,
    converting: bool,
}

impl<R: RegisterAccess> LibraryBackend<R> {
    /// Create a backend over a register access handle
    pub fn new(regs: R) -> Self {
        Self {
            adc: Adc10::new(regs),
            resolution: Resolution::Bits10,
            converting: false,
        }
    }

    /// Read back the configuration registers
    pub fn snapshot(&mut self) -> RegisterSnapshot {
        RegisterSnapshot::capture(self.adc.registers_mut())
    }

    /// Get mutable access to the register handle
    pub fn registers_mut(&mut self) -> &mut R {
        self.adc.registers_mut()
    }

    /// Give the register handle back
    pub fn release(self) -> R {
        self.adc.release()
    }
}

impl<R: RegisterAccess> PeripheralConfigurator for LibraryBackend<R> {
    fn setup_converter(&mut self, config: &AdcConfig) {
        self.adc.disable_interrupts();
        self.adc.init(
            SampleHoldSource::Software,
            ClockSource::Adc10Osc,
            ClockDivider::Div1,
        );
        self.adc.enable();
        self.adc.setup_sampling_timer(config.sample_hold, false);
        self.adc.set_resolution(config.resolution);
        self.adc.configure_memory(
            config.channel,
            PositiveReference::Internal,
            NegativeReference::AVss,
        );

        self.resolution = config.resolution;
        self.converting = false;
    }

    fn reference_ready(&mut self) -> bool {
        !self.adc.reference().is_busy()
    }

    fn enable_reference(&mut self, voltage: ReferenceVoltage) {
        let mut reference = self.adc.reference();
        reference.set_voltage(voltage);
        reference.enable();
        debug!("registers: {}", self.snapshot());
    }
}

impl<R: RegisterAccess> Acquisition for LibraryBackend<R> {
    fn poll_conversion(&mut self) -> nb::Result<RawSample, SensorError> {
        if !self.converting {
            self.adc.start_conversion(ConversionMode::SingleChannel);
            self.converting = true;
        }

        if self.adc.is_busy() {
            return Err(nb::Error::WouldBlock);
        }

        self.converting = false;
        Ok(RawSample::new(self.adc.results() & self.resolution.max_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::direct_register::DirectRegisterBackend;
    use crate::adapters::simulated::SimulatedAdc10;
    use crate::domain::{CalibrationPair, TemperatureCalibration};
    use crate::ports::peripheral::{InputChannel, SampleHoldCycles};
    use crate::ports::sensor::WaitPolicy;

    struct NoDelay;

    impl embedded_hal::delay::DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn simulator() -> SimulatedAdc10 {
        let pair = CalibrationPair::new(731, 879).unwrap();
        SimulatedAdc10::new(TemperatureCalibration::adc10(pair))
    }

    #[test]
    fn test_configure_matches_reference_register_values() {
        let mut backend = LibraryBackend::new(simulator());
        let config = AdcConfig {
            sample_hold: SampleHoldCycles::Cycles16,
            ..AdcConfig::default()
        };
        backend
            .configure(&config, WaitPolicy::Spin, &mut NoDelay)
            .unwrap();

        let snap = backend.snapshot();
        assert_eq!(snap.adc10ctl0, 0x0210);
        assert_eq!(snap.adc10ctl1, 0x0200);
        assert_eq!(snap.adc10ctl2, 0x0010);
        assert_eq!(snap.adc10mctl0, 0x001A);
        assert_eq!(snap.adc10ie, 0x0000);
        assert_eq!(snap.refctl0, 0x0181);
    }

    #[test]
    fn test_backends_agree_on_register_state() {
        let configs = [
            AdcConfig::default(),
            AdcConfig {
                resolution: Resolution::Bits8,
                sample_hold: SampleHoldCycles::Cycles1024,
                reference: ReferenceVoltage::V2_0,
                ..AdcConfig::default()
            },
            AdcConfig {
                channel: InputChannel::new(5).unwrap(),
                reference: ReferenceVoltage::V2_5,
                ..AdcConfig::default()
            },
        ];

        for config in configs {
            let mut library = LibraryBackend::new(simulator());
            let mut direct = DirectRegisterBackend::new(simulator());
            library.configure(&config, WaitPolicy::Spin, &mut NoDelay).unwrap();
            direct.configure(&config, WaitPolicy::Spin, &mut NoDelay).unwrap();
            assert_eq!(library.snapshot(), direct.snapshot(), "{config:?}");
        }
    }

    #[test]
    fn test_backends_agree_on_samples() {
        let mut library = LibraryBackend::new(simulator());
        let mut direct = DirectRegisterBackend::new(simulator());
        library.configure(&AdcConfig::default(), WaitPolicy::Spin, &mut NoDelay).unwrap();
        direct.configure(&AdcConfig::default(), WaitPolicy::Spin, &mut NoDelay).unwrap();

        for celsius in [-20.0, 0.0, 30.0, 55.5, 85.0, 120.0] {
            library.registers_mut().set_die_temperature(celsius);
            direct.registers_mut().set_die_temperature(celsius);
            assert_eq!(
                library.acquire(WaitPolicy::Spin),
                direct.acquire(WaitPolicy::Spin)
            );
        }
    }

    #[test]
    fn test_stalled_conversion_times_out() {
        let mut backend = LibraryBackend::new(simulator());
        backend.configure(&AdcConfig::default(), WaitPolicy::Spin, &mut NoDelay).unwrap();
        backend.registers_mut().stall(true);

        let wait = WaitPolicy::Bounded { max_polls: 32 };
        assert_eq!(backend.acquire(wait), Err(SensorError::Timeout { polls: 32 }));
        assert_eq!(backend.acquire(wait), Err(SensorError::Timeout { polls: 32 }));
        assert_eq!(backend.registers_mut().conversions(), 1);
    }
}
