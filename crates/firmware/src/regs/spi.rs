//! SPI/I2S register block (I2S mode only).

use platform::RegisterAccess;

/// Register offsets.
pub mod offset {
    /// Control register 1 (SPI mode only; kept zero in I2S mode)
    pub const CR1: usize = 0x00;
    /// Control register 2
    pub const CR2: usize = 0x04;
    /// Status register
    pub const SR: usize = 0x08;
    /// Data register
    pub const DR: usize = 0x0C;
    /// I2S configuration register
    pub const I2SCFGR: usize = 0x1C;
    /// I2S prescaler register
    pub const I2SPR: usize = 0x20;
}

/// CR2 bits.
pub mod cr2 {
    /// Tx buffer DMA enable
    pub const TXDMAEN: u32 = 1 << 1;
}

/// SR bits.
pub mod sr {
    /// Transmit buffer empty
    pub const TXE: u32 = 1 << 1;
    /// Busy
    pub const BSY: u32 = 1 << 7;
}

/// I2SCFGR fields.
pub mod i2scfgr {
    /// Clock polarity (0 = idle low)
    pub const CKPOL: u32 = 1 << 3;
    /// Standard selection field shift (00 = Philips)
    pub const I2SSTD_SHIFT: u32 = 4;
    /// Configuration mode: master transmit
    pub const I2SCFG_MASTER_TX: u32 = 0b10 << 8;
    /// Peripheral enable
    pub const I2SE: u32 = 1 << 10;
    /// I2S mode (vs SPI)
    pub const I2SMOD: u32 = 1 << 11;
    /// Data length field (00 = 16 bit), channel length 16 bit
    pub const DATLEN_16: u32 = 0b00 << 1;
}

/// I2SPR fields.
pub mod i2spr {
    /// Linear prescaler mask
    pub const DIV_MASK: u32 = 0xFF;
    /// Odd factor
    pub const ODD: u32 = 1 << 8;
    /// Master clock output enable
    pub const MCKOE: u32 = 1 << 9;
}

/// One SPI peripheral in I2S mode.
pub struct SpiI2sRegs<R> {
    regs: R,
}

impl<R: RegisterAccess> SpiI2sRegs<R> {
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

    /// Program the prescaler (`div`, `odd`) with master clock output on.
    pub fn set_prescaler(&self, div: u8, odd: bool) {
        let mut value = u32::from(div) & i2spr::DIV_MASK;
        if odd {
            value |= i2spr::ODD;
        }
        self.regs.write(offset::I2SPR, value | i2spr::MCKOE);
    }

    /// Master transmit, Philips standard, 16-bit data, clock idle low.
    /// Leaves the peripheral disabled.
    pub fn configure_master_tx(&self) {
        self.regs.write(
            offset::I2SCFGR,
            i2scfgr::I2SMOD | i2scfgr::I2SCFG_MASTER_TX | i2scfgr::DATLEN_16,
        );
    }

    /// Set or clear I2SE.
    pub fn set_enabled(&self, on: bool) {
        if on {
            self.regs.set_bits(offset::I2SCFGR, i2scfgr::I2SE);
        } else {
            self.regs.clear_bits(offset::I2SCFGR, i2scfgr::I2SE);
        }
    }

    /// `true` when I2SE is set.
    pub fn is_enabled(&self) -> bool {
        self.regs.bits_set(offset::I2SCFGR, i2scfgr::I2SE)
    }

    /// Set or clear the transmit DMA request.
    pub fn set_tx_dma(&self, on: bool) {
        if on {
            self.regs.set_bits(offset::CR2, cr2::TXDMAEN);
        } else {
            self.regs.clear_bits(offset::CR2, cr2::TXDMAEN);
        }
    }

    /// `true` while the transmit DMA request is enabled.
    pub fn tx_dma_enabled(&self) -> bool {
        self.regs.bits_set(offset::CR2, cr2::TXDMAEN)
    }
}
