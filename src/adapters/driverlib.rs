//! ADC10_A / REF_A peripheral driver library
//!
//! A typed, call-per-setting driver in the style of vendor peripheral
//! libraries: each method touches only the fields it owns, so callers never
//! assemble control words by hand.
//!
//! - [`Adc10`] owns the register handle and drives the converter
//! - [`Reference`] borrows it to drive the reference generator

use crate::adapters::registers::{adc10, refgen, RegisterAccess};
use crate::ports::peripheral::{InputChannel, ReferenceVoltage, Resolution, SampleHoldCycles};

/// What triggers sample-and-hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleHoldSource {
    /// Software, via `ADC10SC`
    Software = 0,
    TimerA0Out1 = 1,
    TimerB0Out1 = 2,
    TimerA1Out1 = 3,
}

/// Converter clock source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Internal ADC10OSC (MODOSC, ~5 MHz)
    Adc10Osc = 0,
    Aclk = 1,
    Mclk = 2,
    Smclk = 3,
}

/// Converter clock divider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivider {
    Div1 = 0,
    Div2 = 1,
    Div3 = 2,
    Div4 = 3,
    Div5 = 4,
    Div6 = 5,
    Div7 = 6,
    Div8 = 7,
}

/// Conversion sequence mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionMode {
    SingleChannel = 0,
    SequenceOfChannels = 1,
    RepeatedSingleChannel = 2,
    RepeatedSequenceOfChannels = 3,
}

/// Positive reference selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositiveReference {
    AVcc = 0,
    /// Internal reference generator (VREF+)
    Internal = 1,
    /// External reference pin (VeREF+)
    External = 2,
}

/// Negative reference selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegativeReference {
    AVss = 0,
    /// External reference pin (VeREF-)
    External = 4,
}

/// ADC10_A driver
pub struct Adc10<R> {
    regs: R,
}

impl<R: RegisterAccess> Adc10<R> {
    /// Create a driver over a register access handle
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Power the core down and select trigger and clock.
    ///
    /// Pulse sample mode is always used, so the sample time comes from
    /// [`Adc10::setup_sampling_timer`].
    pub fn init(&mut self, source: SampleHoldSource, clock: ClockSource, divider: ClockDivider) {
        self.regs
            .clear_bits(adc10::ADC10CTL0, adc10::ADC10ENC | adc10::ADC10ON);
        self.regs.write(
            adc10::ADC10CTL1,
            ((source as u16) << 10) | ((clock as u16) << 3) | ((divider as u16) << 5) | adc10::ADC10SHP,
        );
    }

    /// Power the converter core on
    pub fn enable(&mut self) {
        self.regs.set_bits(adc10::ADC10CTL0, adc10::ADC10ON);
    }

    /// Stop conversions and power the core off
    pub fn disable(&mut self) {
        self.regs
            .clear_bits(adc10::ADC10CTL0, adc10::ADC10ENC | adc10::ADC10ON);
    }

    /// Set the sample-and-hold time and multiple-sample mode
    pub fn setup_sampling_timer(&mut self, cycles: SampleHoldCycles, multiple_samples: bool) {
        let msc = if multiple_samples { adc10::ADC10MSC } else { 0 };
        self.regs.modify(adc10::ADC10CTL0, |v| {
            (v & !(adc10::ADC10SHT_MASK | adc10::ADC10MSC))
                | ((cycles as u16) << adc10::ADC10SHT_SHIFT)
                | msc
        });
    }

    /// Select 8- or 10-bit results
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.regs.modify(adc10::ADC10CTL2, |v| match resolution {
            Resolution::Bits8 => v & !adc10::ADC10RES,
            Resolution::Bits10 => v | adc10::ADC10RES,
        });
    }

    /// Select input channel and reference sources
    pub fn configure_memory(
        &mut self,
        channel: InputChannel,
        positive: PositiveReference,
        negative: NegativeReference,
    ) {
        self.disable_conversions();
        let sref = ((positive as u16) | (negative as u16)) << 4;
        self.regs
            .write(adc10::ADC10MCTL0, sref | u16::from(channel.value()));
    }

    /// Mask every ADC10_A interrupt source
    pub fn disable_interrupts(&mut self) {
        self.regs.write(adc10::ADC10IE, 0);
    }

    /// Enable and start conversions in `mode`
    pub fn start_conversion(&mut self, mode: ConversionMode) {
        self.disable_conversions();
        self.regs.modify(adc10::ADC10CTL1, |v| {
            (v & !adc10::ADC10CONSEQ_MASK) | ((mode as u16) << 1)
        });
        self.regs
            .set_bits(adc10::ADC10CTL0, adc10::ADC10ENC | adc10::ADC10SC);
    }

    /// Clear `ADC10ENC` so the configuration can be changed
    pub fn disable_conversions(&mut self) {
        self.regs.clear_bits(adc10::ADC10CTL0, adc10::ADC10ENC);
    }

    /// Whether a conversion is in progress
    pub fn is_busy(&mut self) -> bool {
        self.regs.read(adc10::ADC10CTL1) & adc10::ADC10BUSY != 0
    }

    /// Read the conversion result register
    pub fn results(&mut self) -> u16 {
        self.regs.read(adc10::ADC10MEM0)
    }

    /// Borrow the reference generator
    pub fn reference(&mut self) -> Reference<'_, R> {
        Reference {
            regs: &mut self.regs,
        }
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

/// REF_A driver, borrowed from [`Adc10::reference`]
pub struct Reference<'a, R> {
    regs: &'a mut R,
}

impl<R: RegisterAccess> Reference<'_, R> {
    /// Whether the generator is busy and must not be reprogrammed
    pub fn is_busy(&mut self) -> bool {
        self.regs.read(refgen::REFCTL0) & refgen::REFGENBUSY != 0
    }

    /// Select the generator output level and take control from the PMM
    pub fn set_voltage(&mut self, voltage: ReferenceVoltage) {
        self.regs.modify(refgen::REFCTL0, |v| {
            (v & !refgen::REFVSEL_MASK)
                | ((voltage as u16) << refgen::REFVSEL_SHIFT)
                | refgen::REFMSTR
        });
    }

    /// Switch the generator on
    pub fn enable(&mut self) {
        self.regs.set_bits(refgen::REFCTL0, refgen::REFON);
    }

    /// Switch the generator off
    pub fn disable(&mut self) {
        self.regs.clear_bits(refgen::REFCTL0, refgen::REFON);
    }
}
