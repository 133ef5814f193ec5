//! Reset and clock control register block.

use platform::RegisterAccess;

/// Register offsets.
pub mod offset {
    /// Clock control register
    pub const CR: usize = 0x00;
    /// PLL configuration register
    pub const PLLCFGR: usize = 0x04;
    /// Clock configuration register
    pub const CFGR: usize = 0x08;
    /// AHB1 peripheral clock enable
    pub const AHB1ENR: usize = 0x30;
    /// APB1 peripheral clock enable
    pub const APB1ENR: usize = 0x40;
}

/// CR bits.
pub mod cr {
    /// HSI enable
    pub const HSION: u32 = 1 << 0;
    /// HSI ready
    pub const HSIRDY: u32 = 1 << 1;
    /// PLL enable
    pub const PLLON: u32 = 1 << 24;
    /// PLL ready
    pub const PLLRDY: u32 = 1 << 25;
}

/// PLLCFGR fields.
pub mod pllcfgr {
    /// PLLN shift
    pub const N_SHIFT: u32 = 6;
    /// PLLP shift (encoded as P/2 − 1)
    pub const P_SHIFT: u32 = 16;
    /// PLL source: HSE when set, HSI when clear
    pub const SRC_HSE: u32 = 1 << 22;
    /// PLLQ shift
    pub const Q_SHIFT: u32 = 24;

    /// Field value for dividers `m`, `n`, `p`, `q` with HSI as source.
    ///
    /// `p` must be one of 2, 4, 6, 8.
    #[allow(clippy::arithmetic_side_effects)] // fields masked to their widths
    pub const fn hsi(m: u32, n: u32, p: u32, q: u32) -> u32 {
        let p_bits = ((p / 2).saturating_sub(1)) & 0b11;
        (m & 0x3F) | ((n & 0x1FF) << N_SHIFT) | (p_bits << P_SHIFT) | ((q & 0xF) << Q_SHIFT)
    }
}

/// CFGR fields.
pub mod cfgr {
    /// System clock switch mask
    pub const SW_MASK: u32 = 0b11;
    /// System clock switch: PLL
    pub const SW_PLL: u32 = 0b10;
    /// System clock switch status shift
    pub const SWS_SHIFT: u32 = 2;
    /// APB1 prescaler /4
    pub const PPRE1_DIV4: u32 = 0b101 << 10;
    /// APB2 prescaler /2
    pub const PPRE2_DIV2: u32 = 0b100 << 13;
}

/// AHB1ENR bits.
pub mod ahb1 {
    /// GPIO port enable, bit = port index
    pub const fn gpio(port_index: u8) -> u32 {
        1 << (port_index & 0x0F)
    }
    /// DMA1 enable
    pub const DMA1EN: u32 = 1 << 21;
}

/// APB1ENR bits.
pub mod apb1 {
    /// TIM2 enable
    pub const TIM2EN: u32 = 1 << 0;
    /// TIM3 enable
    pub const TIM3EN: u32 = 1 << 1;
    /// SPI3 enable
    pub const SPI3EN: u32 = 1 << 15;
    /// I2C1 enable
    pub const I2C1EN: u32 = 1 << 21;
    /// I2C2 enable
    pub const I2C2EN: u32 = 1 << 22;
    /// I2C3 enable
    pub const I2C3EN: u32 = 1 << 23;
    /// Power interface enable
    pub const PWREN: u32 = 1 << 28;
}

/// RCC block.
pub struct RccRegs<R> {
    regs: R,
}

impl<R: RegisterAccess> RccRegs<R> {
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

    /// Enable AHB1 peripheral clocks.
    pub fn enable_ahb1(&self, mask: u32) {
        self.regs.set_bits(offset::AHB1ENR, mask);
    }

    /// Enable APB1 peripheral clocks.
    pub fn enable_apb1(&self, mask: u32) {
        self.regs.set_bits(offset::APB1ENR, mask);
    }

    /// Disable APB1 peripheral clocks.
    pub fn disable_apb1(&self, mask: u32) {
        self.regs.clear_bits(offset::APB1ENR, mask);
    }
}

/// Flash interface ACR (offset 0 of the flash register block).
pub mod flash_acr {
    /// ACR offset
    pub const OFFSET: usize = 0x00;
    /// Wait-state field mask
    pub const LATENCY_MASK: u32 = 0b111;
    /// Prefetch enable
    pub const PRFTEN: u32 = 1 << 8;
    /// Instruction cache enable
    pub const ICEN: u32 = 1 << 9;
    /// Data cache enable
    pub const DCEN: u32 = 1 << 10;
}
