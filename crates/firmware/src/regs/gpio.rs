//! GPIO port registers.

use platform::{OutputType, Pull, RegisterAccess, Speed};

/// Register offsets.
pub mod offset {
    /// Mode register
    pub const MODER: usize = 0x00;
    /// Output type register
    pub const OTYPER: usize = 0x04;
    /// Output speed register
    pub const OSPEEDR: usize = 0x08;
    /// Pull-up/pull-down register
    pub const PUPDR: usize = 0x0C;
    /// Bit set/reset register
    pub const BSRR: usize = 0x18;
    /// Alternate function low (pins 0–7)
    pub const AFRL: usize = 0x20;
    /// Alternate function high (pins 8–15)
    pub const AFRH: usize = 0x24;
}

/// MODER field values.
pub mod mode {
    /// Input
    pub const INPUT: u32 = 0b00;
    /// General-purpose output
    pub const OUTPUT: u32 = 0b01;
    /// Alternate function
    pub const ALTERNATE: u32 = 0b10;
    /// Analog
    pub const ANALOG: u32 = 0b11;
}

/// One GPIO port.
pub struct GpioRegs<R> {
    regs: R,
}

#[allow(clippy::arithmetic_side_effects)] // pin numbers are masked to 0–15
impl<R: RegisterAccess> GpioRegs<R> {
    /// Wrap a register block.
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Underlying register access.
    pub fn raw(&self) -> &R {
        &self.regs
    }

    /// Give the register access back.
    pub fn into_inner(self) -> R {
        self.regs
    }

    fn field2(&self, offset: usize, pin: u8, value: u32) {
        let shift = u32::from(pin & 0x0F) * 2;
        self.regs
            .modify(offset, |v| (v & !(0b11 << shift)) | ((value & 0b11) << shift));
    }

    /// Set the 2-bit MODER field.
    pub fn set_mode(&self, pin: u8, value: u32) {
        self.field2(offset::MODER, pin, value);
    }

    /// Set the output type.
    pub fn set_output_type(&self, pin: u8, output_type: OutputType) {
        let bit = 1 << u32::from(pin & 0x0F);
        match output_type {
            OutputType::PushPull => self.regs.clear_bits(offset::OTYPER, bit),
            OutputType::OpenDrain => self.regs.set_bits(offset::OTYPER, bit),
        }
    }

    /// Set the slew rate.
    pub fn set_speed(&self, pin: u8, speed: Speed) {
        let value = match speed {
            Speed::Low => 0b00,
            Speed::Medium => 0b01,
            Speed::Fast => 0b10,
            Speed::High => 0b11,
        };
        self.field2(offset::OSPEEDR, pin, value);
    }

    /// Set the pull resistor.
    pub fn set_pull(&self, pin: u8, pull: Pull) {
        let value = match pull {
            Pull::None => 0b00,
            Pull::Up => 0b01,
            Pull::Down => 0b10,
        };
        self.field2(offset::PUPDR, pin, value);
    }

    /// Select alternate function `af` (0–15).
    pub fn set_alternate(&self, pin: u8, af: u8) {
        let pin = pin & 0x0F;
        let (offset, slot) = if pin < 8 {
            (offset::AFRL, pin)
        } else {
            (offset::AFRH, pin - 8)
        };
        let shift = u32::from(slot) * 4;
        self.regs.modify(offset, |v| {
            (v & !(0xF << shift)) | ((u32::from(af) & 0xF) << shift)
        });
    }

    /// Drive the pin high or low atomically through BSRR.
    pub fn set_level(&self, pin: u8, high: bool) {
        let bit = u32::from(pin & 0x0F);
        let value = if high { 1 << bit } else { 1 << (bit + 16) };
        self.regs.write(offset::BSRR, value);
    }
}
