//! Memory-mapped register access.
//!
//! Every peripheral driver in the firmware talks to silicon through
//! [`RegisterAccess`]. On target the implementation is [`Mmio`], a thin
//! volatile pointer wrapper and the only `unsafe` boundary for register I/O.
//! On the host the same drivers run against
//! [`SimRegisters`](crate::mocks::SimRegisters) or a behavioral model.
//!
//! Offsets are byte offsets from the peripheral base address, exactly as they
//! appear in the STM32F4 reference manual (RM0090) register maps.

/// Read/write access to a block of 32-bit peripheral registers.
///
/// Methods take `&self`: a register write is a side effect on the device,
/// not on the Rust value that names it.
pub trait RegisterAccess {
    /// Read the register at `offset` bytes from the block base.
    fn read(&self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`.
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write.
    fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// Set every bit in `mask`.
    fn set_bits(&self, offset: usize, mask: u32) {
        self.modify(offset, |v| v | mask);
    }

    /// Clear every bit in `mask`.
    fn clear_bits(&self, offset: usize, mask: u32) {
        self.modify(offset, |v| v & !mask);
    }

    /// `true` when every bit in `mask` reads as 1.
    fn bits_set(&self, offset: usize, mask: u32) -> bool {
        self.read(offset) & mask == mask
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value);
    }
}

/// Volatile access to a peripheral register block at a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create an accessor for the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a memory-mapped peripheral block that is
    /// valid for 32-bit volatile access at every offset the owning driver
    /// touches, and exactly one driver may own the block at a time.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the block.
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Absolute address of the register at `offset`.
    ///
    /// Used when a DMA engine needs the peripheral data-register address.
    #[allow(clippy::arithmetic_side_effects)] // peripheral offsets are < 0x400; no overflow
    pub const fn address_of(&self, offset: usize) -> usize {
        self.base + offset
    }
}

impl RegisterAccess for Mmio {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `Mmio::new` requires `base + offset` to be a valid, aligned
        // peripheral register owned by this driver.
        unsafe { core::ptr::read_volatile(self.address_of(offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(self.address_of(offset) as *mut u32, value) }
    }
}
