//! I2C (v1) register block.

use platform::RegisterAccess;

/// Register offsets.
pub mod offset {
    /// Control register 1
    pub const CR1: usize = 0x00;
    /// Control register 2
    pub const CR2: usize = 0x04;
    /// Own address register 1
    pub const OAR1: usize = 0x08;
    /// Data register
    pub const DR: usize = 0x10;
    /// Status register 1
    pub const SR1: usize = 0x14;
    /// Status register 2
    pub const SR2: usize = 0x18;
    /// Clock control register
    pub const CCR: usize = 0x1C;
    /// Rise time register
    pub const TRISE: usize = 0x20;
}

/// CR1 bits.
pub mod cr1 {
    /// Peripheral enable
    pub const PE: u32 = 1 << 0;
    /// General call enable
    pub const ENGC: u32 = 1 << 6;
    /// Start generation
    pub const START: u32 = 1 << 8;
    /// Stop generation
    pub const STOP: u32 = 1 << 9;
    /// Acknowledge enable
    pub const ACK: u32 = 1 << 10;
    /// (N)ACK applies to the byte in the shift register
    pub const POS: u32 = 1 << 11;
    /// Software reset
    pub const SWRST: u32 = 1 << 15;
}

/// SR1 bits.
pub mod sr1 {
    /// Start bit generated
    pub const SB: u32 = 1 << 0;
    /// Address sent
    pub const ADDR: u32 = 1 << 1;
    /// Byte transfer finished
    pub const BTF: u32 = 1 << 2;
    /// Data register not empty (receive)
    pub const RXNE: u32 = 1 << 6;
    /// Data register empty (transmit)
    pub const TXE: u32 = 1 << 7;
    /// Bus error
    pub const BERR: u32 = 1 << 8;
    /// Arbitration lost
    pub const ARLO: u32 = 1 << 9;
    /// Acknowledge failure
    pub const AF: u32 = 1 << 10;
    /// Every error flag the driver handles
    pub const ERRORS: u32 = BERR | ARLO | AF;
}

/// SR2 bits.
pub mod sr2 {
    /// Bus busy
    pub const BUSY: u32 = 1 << 1;
}

/// CCR fields.
pub mod ccr {
    /// Clock control value, 12 bits
    pub const CCR_MASK: u32 = 0x0FFF;
    /// Fast-mode duty cycle (0 = Tlow/Thigh 2)
    pub const DUTY: u32 = 1 << 14;
    /// Fast-mode select
    pub const FS: u32 = 1 << 15;
}

/// CR2.FREQ mask (peripheral clock in MHz).
pub const CR2_FREQ_MASK: u32 = 0x3F;

/// One I2C peripheral.
pub struct I2cRegs<R> {
    regs: R,
}

impl<R: RegisterAccess> I2cRegs<R> {
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

    /// Status register 1.
    pub fn sr1(&self) -> u32 {
        self.regs.read(offset::SR1)
    }

    /// Status register 2. Reading SR1 then SR2 clears ADDR.
    pub fn sr2(&self) -> u32 {
        self.regs.read(offset::SR2)
    }

    /// Clear rc_w0 flags in SR1; writing 1 leaves the other flags untouched.
    pub fn clear_sr1(&self, mask: u32) {
        self.regs.write(offset::SR1, !mask & 0xFFFF);
    }

    /// Set bits in CR1.
    pub fn set_cr1(&self, mask: u32) {
        self.regs.set_bits(offset::CR1, mask);
    }

    /// Clear bits in CR1.
    pub fn clear_cr1(&self, mask: u32) {
        self.regs.clear_bits(offset::CR1, mask);
    }

    /// Write a byte to DR.
    pub fn write_dr(&self, byte: u8) {
        self.regs.write(offset::DR, u32::from(byte));
    }

    /// Read a byte from DR.
    pub fn read_dr(&self) -> u8 {
        (self.regs.read(offset::DR) & 0xFF) as u8
    }

    /// Program CR2.FREQ with the peripheral clock in MHz.
    pub fn set_freq_mhz(&self, mhz: u8) {
        self.regs.modify(offset::CR2, |v| {
            (v & !CR2_FREQ_MASK) | (u32::from(mhz) & CR2_FREQ_MASK)
        });
    }

    /// Program CCR and TRISE. The peripheral must be disabled.
    pub fn set_timing(&self, ccr_value: u16, fast_mode: bool, trise: u8) {
        let mut value = u32::from(ccr_value) & ccr::CCR_MASK;
        if fast_mode {
            value |= ccr::FS;
        }
        self.regs.write(offset::CCR, value);
        self.regs.write(offset::TRISE, u32::from(trise) & 0x3F);
    }
}
