//! Typed STM32F407 register blocks.
//!
//! Each block wraps a [`RegisterAccess`](platform::RegisterAccess)
//! implementation and exposes the fields the audio drivers use by name.
//! Offsets and bit positions follow RM0090. On target the blocks are built
//! over [`Mmio`](platform::Mmio) at the addresses in [`base`]; host tests build
//! them over simulated register files.

pub mod dma;
pub mod gpio;
pub mod i2c;
pub mod rcc;
pub mod spi;
pub mod tim;

pub use dma::DmaStreamRegs;
pub use gpio::GpioRegs;
pub use i2c::I2cRegs;
pub use rcc::RccRegs;
pub use spi::SpiI2sRegs;
pub use tim::TimerRegs;

/// Peripheral base addresses (RM0090 §2.3, memory map).
pub mod base {
    /// TIM2 (APB1)
    pub const TIM2: usize = 0x4000_0000;
    /// TIM3 (APB1)
    pub const TIM3: usize = 0x4000_0400;
    /// SPI3 / I2S3 (APB1)
    pub const SPI3: usize = 0x4000_3C00;
    /// I2C1 (APB1)
    pub const I2C1: usize = 0x4000_5400;
    /// I2C2 (APB1)
    pub const I2C2: usize = 0x4000_5800;
    /// I2C3 (APB1)
    pub const I2C3: usize = 0x4000_5C00;
    /// GPIOA (AHB1); ports are 0x400 apart.
    pub const GPIOA: usize = 0x4002_0000;
    /// Distance between consecutive GPIO port blocks.
    pub const GPIO_STRIDE: usize = 0x400;
    /// RCC (AHB1)
    pub const RCC: usize = 0x4002_3800;
    /// Flash interface (AHB1)
    pub const FLASH: usize = 0x4002_3C00;
    /// DMA1 (AHB1)
    pub const DMA1: usize = 0x4002_6000;
}
