//! ADC10_A and REF_A register map and 16-bit register access
//!
//! Addresses and bit positions follow the MSP430F5xx family user's guide.
//! Backends only talk to hardware through [`RegisterAccess`], so the same
//! code runs against real memory-mapped registers ([`Mmio`]) or the host
//! simulation.

/// ADC10_A control and data registers
pub mod adc10 {
    pub const ADC10CTL0: u16 = 0x0740;
    pub const ADC10CTL1: u16 = 0x0742;
    pub const ADC10CTL2: u16 = 0x0744;
    pub const ADC10MCTL0: u16 = 0x074A;
    pub const ADC10MEM0: u16 = 0x0752;
    pub const ADC10IE: u16 = 0x075A;
    pub const ADC10IFG: u16 = 0x075C;

    // ADC10CTL0
    pub const ADC10SC: u16 = 0x0001;
    pub const ADC10ENC: u16 = 0x0002;
    pub const ADC10ON: u16 = 0x0010;
    pub const ADC10MSC: u16 = 0x0080;
    pub const ADC10SHT_MASK: u16 = 0x0F00;
    pub const ADC10SHT_SHIFT: u16 = 8;

    // ADC10CTL1
    pub const ADC10BUSY: u16 = 0x0001;
    pub const ADC10CONSEQ_MASK: u16 = 0x0006;
    pub const ADC10SSEL_MASK: u16 = 0x0018;
    pub const ADC10DIV_MASK: u16 = 0x00E0;
    pub const ADC10SHP: u16 = 0x0200;
    pub const ADC10SHS_MASK: u16 = 0x0C00;

    // ADC10CTL2
    pub const ADC10RES: u16 = 0x0010;

    // ADC10MCTL0
    pub const ADC10INCH_MASK: u16 = 0x000F;
    pub const ADC10SREF_MASK: u16 = 0x0070;
    /// VR+ = VREF+ (internal), VR- = AVss
    pub const ADC10SREF_1: u16 = 0x0010;

    // ADC10IFG
    pub const ADC10IFG0: u16 = 0x0001;
}

/// REF_A reference generator
pub mod refgen {
    pub const REFCTL0: u16 = 0x01B0;

    pub const REFON: u16 = 0x0001;
    pub const REFOUT: u16 = 0x0002;
    pub const REFVSEL_MASK: u16 = 0x0030;
    pub const REFVSEL_SHIFT: u16 = 4;
    pub const REFMSTR: u16 = 0x0080;
    pub const REFGENACT: u16 = 0x0100;
    pub const REFGENBUSY: u16 = 0x0400;
}

/// 16-bit peripheral register access by absolute address
pub trait RegisterAccess {
    /// Read a register
    fn read(&mut self, addr: u16) -> u16;

    /// Write a register
    fn write(&mut self, addr: u16, value: u16);

    /// Read-modify-write a register
    #[inline]
    fn modify(&mut self, addr: u16, f: impl FnOnce(u16) -> u16) {
        let value = self.read(addr);
        self.write(addr, f(value));
    }

    /// Set the bits in `mask`
    #[inline]
    fn set_bits(&mut self, addr: u16, mask: u16) {
        self.modify(addr, |v| v | mask);
    }

    /// Clear the bits in `mask`
    #[inline]
    fn clear_bits(&mut self, addr: u16, mask: u16) {
        self.modify(addr, |v| v & !mask);
    }
}

impl<R: RegisterAccess + ?Sized> RegisterAccess for &mut R {
    #[inline]
    fn read(&mut self, addr: u16) -> u16 {
        (**self).read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u16) {
        (**self).write(addr, value)
    }
}

/// Volatile access to the device's memory-mapped peripheral registers
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Take access to the peripheral register space.
    ///
    /// # Safety
    ///
    /// Must only be used on a device that maps ADC10_A and REF_A at the
    /// addresses in [`adc10`] and [`refgen`], and no other code may drive
    /// those peripherals while this handle exists.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterAccess for Mmio {
    #[inline]
    fn read(&mut self, addr: u16) -> u16 {
        unsafe { core::ptr::read_volatile(addr as usize as *const u16) }
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u16) {
        unsafe { core::ptr::write_volatile(addr as usize as *mut u16, value) }
    }
}

/// Copy of the configuration registers, for inspection after setup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterSnapshot {
    pub adc10ctl0: u16,
    pub adc10ctl1: u16,
    pub adc10ctl2: u16,
    pub adc10mctl0: u16,
    pub adc10ie: u16,
    pub refctl0: u16,
}

impl RegisterSnapshot {
    /// Read all configuration registers
    pub fn capture<R: RegisterAccess>(regs: &mut R) -> Self {
        Self {
            adc10ctl0: regs.read(adc10::ADC10CTL0),
            adc10ctl1: regs.read(adc10::ADC10CTL1),
            adc10ctl2: regs.read(adc10::ADC10CTL2),
            adc10mctl0: regs.read(adc10::ADC10MCTL0),
            adc10ie: regs.read(adc10::ADC10IE),
            refctl0: regs.read(refgen::REFCTL0),
        }
    }
}

impl core::fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "ADC10CTL0={:#06x} ADC10CTL1={:#06x} ADC10CTL2={:#06x} ADC10MCTL0={:#06x} ADC10IE={:#06x} REFCTL0={:#06x}",
            self.adc10ctl0, self.adc10ctl1, self.adc10ctl2, self.adc10mctl0, self.adc10ie, self.refctl0
        )
    }
}
