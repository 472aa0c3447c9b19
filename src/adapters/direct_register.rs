//! Direct register backend
//!
//! Programs ADC10_A and REF_A by writing whole control words, the way a
//! bare-metal program would. Works on any [`RegisterAccess`], so the same
//! code drives real hardware through [`Mmio`](crate::adapters::registers::Mmio)
//! or the host simulation.

use log::debug;

use crate::adapters::registers::{adc10, refgen, RegisterAccess, RegisterSnapshot};
use crate::domain::RawSample;
use crate::ports::peripheral::{
    Acquisition, AdcConfig, PeripheralConfigurator, ReferenceVoltage, Resolution,
};
use crate::ports::sensor::SensorError;

/// ADC backend that writes control registers directly
pub struct DirectRegisterBackend<R> {
    regs: R,
    resolution: Resolution,
    converting: bool,
}

impl<R: RegisterAccess> DirectRegisterBackend<R> {
    /// Create a backend over a register access handle
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            resolution: Resolution::Bits10,
            converting: false,
        }
    }

    /// Read back the configuration registers
    pub fn snapshot(&mut self) -> RegisterSnapshot {
        RegisterSnapshot::capture(&mut self.regs)
    }

    /// Get mutable access to the register handle
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Give the register handle back
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: RegisterAccess> PeripheralConfigurator for DirectRegisterBackend<R> {
    fn setup_converter(&mut self, config: &AdcConfig) {
        let sht = (config.sample_hold as u16) << adc10::ADC10SHT_SHIFT;
        let res = match config.resolution {
            Resolution::Bits8 => 0,
            Resolution::Bits10 => adc10::ADC10RES,
        };

        self.regs.write(adc10::ADC10IE, 0);
        // Writing ADC10CTL0 whole also clears ADC10ENC, unlocking the rest
        self.regs.write(adc10::ADC10CTL0, sht | adc10::ADC10ON);
        self.regs.write(adc10::ADC10CTL1, adc10::ADC10SHP);
        self.regs.write(adc10::ADC10CTL2, res);
        self.regs.write(
            adc10::ADC10MCTL0,
            adc10::ADC10SREF_1 | u16::from(config.channel.value()),
        );

        self.resolution = config.resolution;
        self.converting = false;
    }

    fn reference_ready(&mut self) -> bool {
        self.regs.read(refgen::REFCTL0) & refgen::REFGENBUSY == 0
    }

    fn enable_reference(&mut self, voltage: ReferenceVoltage) {
        let vsel = (voltage as u16) << refgen::REFVSEL_SHIFT;
        self.regs
            .write(refgen::REFCTL0, refgen::REFMSTR | vsel | refgen::REFON);
        debug!("registers: {}", self.snapshot());
    }
}

impl<R: RegisterAccess> Acquisition for DirectRegisterBackend<R> {
    fn poll_conversion(&mut self) -> nb::Result<RawSample, SensorError> {
        if !self.converting {
            self.regs.clear_bits(adc10::ADC10CTL0, adc10::ADC10ENC);
            self.regs
                .set_bits(adc10::ADC10CTL0, adc10::ADC10ENC | adc10::ADC10SC);
            self.converting = true;
        }

        if self.regs.read(adc10::ADC10CTL1) & adc10::ADC10BUSY != 0 {
            return Err(nb::Error::WouldBlock);
        }

        self.converting = false;
        let code = self.regs.read(adc10::ADC10MEM0) & self.resolution.max_code();
        Ok(RawSample::new(code))
    }
}
