//! Simulated ADC10_A + REF_A register file
//!
//! Behaves like the real peripherals closely enough to run either backend
//! on a host: the reference generator can report busy for a while, a
//! conversion keeps `ADC10BUSY` set for a configurable number of status
//! reads, and the converted code follows a settable die temperature through
//! the inverse of the calibration line.

use crate::adapters::registers::{adc10, refgen, RegisterAccess};
use crate::domain::TemperatureCalibration;

/// Host-side stand-in for the ADC10_A and REF_A peripherals
#[derive(Clone, Debug)]
pub struct SimulatedAdc10 {
    adc10ctl0: u16,
    adc10ctl1: u16,
    adc10ctl2: u16,
    adc10mctl0: u16,
    adc10mem0: u16,
    adc10ie: u16,
    adc10ifg: u16,
    refctl0: u16,

    calibration: TemperatureCalibration,
    die_temperature_c: f32,
    forced_code: Option<u16>,

    conversion_latency: u32,
    busy_reads_left: u32,
    reference_busy_reads: u32,
    stalled: bool,
    conversions: u32,
}

impl SimulatedAdc10 {
    /// Create a simulator whose sensor follows `calibration`, at 25 °C
    pub fn new(calibration: TemperatureCalibration) -> Self {
        Self {
            adc10ctl0: 0,
            adc10ctl1: 0,
            // RES is set out of reset
            adc10ctl2: adc10::ADC10RES,
            adc10mctl0: 0,
            adc10mem0: 0,
            adc10ie: 0,
            adc10ifg: 0,
            refctl0: 0,
            calibration,
            die_temperature_c: 25.0,
            forced_code: None,
            conversion_latency: 4,
            busy_reads_left: 0,
            reference_busy_reads: 0,
            stalled: false,
            conversions: 0,
        }
    }

    /// Set the temperature the sensor reports
    pub fn set_die_temperature(&mut self, celsius: f32) {
        self.die_temperature_c = celsius;
    }

    /// Current simulated die temperature
    pub fn die_temperature(&self) -> f32 {
        self.die_temperature_c
    }

    /// Return this 10-bit code from every conversion instead of following
    /// the die temperature
    pub fn force_code(&mut self, code: Option<u16>) {
        self.forced_code = code;
    }

    /// Number of `ADC10CTL1` reads a conversion stays busy for
    pub fn set_conversion_latency(&mut self, reads: u32) {
        self.conversion_latency = reads;
    }

    /// Number of `REFCTL0` reads that report `REFGENBUSY`
    pub fn set_reference_busy_reads(&mut self, reads: u32) {
        self.reference_busy_reads = reads;
    }

    /// Keep `ADC10BUSY` set forever (or release it)
    pub fn stall(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Conversions started so far
    pub fn conversions(&self) -> u32 {
        self.conversions
    }

    /// Whether a conversion is in flight
    pub fn is_converting(&self) -> bool {
        self.adc10ctl1 & adc10::ADC10BUSY != 0
    }

    /// Peek at a register without side effects
    pub fn peek(&self, addr: u16) -> u16 {
        match addr {
            adc10::ADC10CTL0 => self.adc10ctl0,
            adc10::ADC10CTL1 => self.adc10ctl1,
            adc10::ADC10CTL2 => self.adc10ctl2,
            adc10::ADC10MCTL0 => self.adc10mctl0,
            adc10::ADC10MEM0 => self.adc10mem0,
            adc10::ADC10IE => self.adc10ie,
            adc10::ADC10IFG => self.adc10ifg,
            refgen::REFCTL0 => self.refctl0,
            _ => 0,
        }
    }

    /// 10-bit code the sensor produces at the current die temperature
    pub fn sensor_code(&self) -> u16 {
        if let Some(code) = self.forced_code {
            return code & 0x03FF;
        }
        let cal = &self.calibration;
        let offset = (self.die_temperature_c - cal.low_c) * cal.pair.span() as f32
            / (cal.high_c - cal.low_c);
        // Clamp before the cast so extreme temperatures saturate at the rails
        let code = (f32::from(cal.pair.low()) + offset).clamp(0.0, 1023.0);
        round_to_i32(code) as u16
    }

    fn start_conversion(&mut self) {
        self.conversions = self.conversions.wrapping_add(1);
        self.adc10ctl1 |= adc10::ADC10BUSY;
        self.adc10ifg &= !adc10::ADC10IFG0;
        self.busy_reads_left = self.conversion_latency;
    }

    fn finish_conversion(&mut self) {
        let code = self.sensor_code();
        self.adc10mem0 = if self.adc10ctl2 & adc10::ADC10RES != 0 {
            code
        } else {
            code >> 2
        };
        self.adc10ctl1 &= !adc10::ADC10BUSY;
        self.adc10ifg |= adc10::ADC10IFG0;
    }

    fn write_ctl0(&mut self, value: u16) {
        let start = value & adc10::ADC10SC != 0
            && value & adc10::ADC10ENC != 0
            && value & adc10::ADC10ON != 0
            && !self.is_converting();

        // ADC10SC clears itself
        self.adc10ctl0 = value & !adc10::ADC10SC;
        if start {
            self.start_conversion();
        }
    }

    fn read_ctl1(&mut self) -> u16 {
        if self.is_converting() && !self.stalled {
            if self.busy_reads_left > 0 {
                self.busy_reads_left -= 1;
            } else {
                self.finish_conversion();
            }
        }
        self.adc10ctl1
    }

    fn read_refctl0(&mut self) -> u16 {
        if self.reference_busy_reads > 0 {
            self.reference_busy_reads -= 1;
            self.refctl0 | refgen::REFGENBUSY
        } else {
            self.refctl0
        }
    }
}

fn round_to_i32(value: f32) -> i32 {
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}

impl RegisterAccess for SimulatedAdc10 {
    fn read(&mut self, addr: u16) -> u16 {
        match addr {
            adc10::ADC10CTL1 => self.read_ctl1(),
            adc10::ADC10MEM0 => {
                self.adc10ifg &= !adc10::ADC10IFG0;
                self.adc10mem0
            }
            refgen::REFCTL0 => self.read_refctl0(),
            _ => self.peek(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u16) {
        match addr {
            adc10::ADC10CTL0 => self.write_ctl0(value),
            // ADC10BUSY is read-only
            adc10::ADC10CTL1 => {
                self.adc10ctl1 = (value & !adc10::ADC10BUSY) | (self.adc10ctl1 & adc10::ADC10BUSY)
            }
            adc10::ADC10CTL2 => self.adc10ctl2 = value,
            adc10::ADC10MCTL0 => self.adc10mctl0 = value,
            adc10::ADC10IE => self.adc10ie = value,
            adc10::ADC10IFG => self.adc10ifg = value,
            refgen::REFCTL0 => {
                let value = value & !(refgen::REFGENBUSY | refgen::REFGENACT);
                self.refctl0 = if value & refgen::REFON != 0 {
                    value | refgen::REFGENACT
                } else {
                    value
                };
            }
            _ => {}
        }
    }
}
