//! DMA controller stream registers.
//!
//! A stream is addressed inside its controller block: stream `x` registers
//! start at `0x10 + 0x18 * x`. Interrupt flags for streams 0–3 live in
//! LISR/LIFCR and for 4–7 in HISR/HIFCR, packed at bit offsets 0, 6, 16, 22.

use platform::RegisterAccess;

/// Controller-level register offsets.
pub mod offset {
    /// Low interrupt status (streams 0–3)
    pub const LISR: usize = 0x00;
    /// High interrupt status (streams 4–7)
    pub const HISR: usize = 0x04;
    /// Low interrupt flag clear
    pub const LIFCR: usize = 0x08;
    /// High interrupt flag clear
    pub const HIFCR: usize = 0x0C;
    /// First stream block
    pub const STREAM0: usize = 0x10;
    /// Size of one stream block
    pub const STREAM_STRIDE: usize = 0x18;
    /// SxCR within a stream block
    pub const CR: usize = 0x00;
    /// SxNDTR
    pub const NDTR: usize = 0x04;
    /// SxPAR
    pub const PAR: usize = 0x08;
    /// SxM0AR
    pub const M0AR: usize = 0x0C;
    /// SxFCR
    pub const FCR: usize = 0x14;
}

/// SxCR fields.
pub mod cr {
    /// Stream enable
    pub const EN: u32 = 1 << 0;
    /// Transfer error interrupt enable
    pub const TEIE: u32 = 1 << 2;
    /// Transfer complete interrupt enable
    pub const TCIE: u32 = 1 << 4;
    /// Direction: memory to peripheral
    pub const DIR_MEM_TO_PERIPH: u32 = 0b01 << 6;
    /// Memory increment
    pub const MINC: u32 = 1 << 10;
    /// Peripheral size 16 bit
    pub const PSIZE_16: u32 = 0b01 << 11;
    /// Memory size 16 bit
    pub const MSIZE_16: u32 = 0b01 << 13;
    /// Priority medium
    pub const PL_MEDIUM: u32 = 0b01 << 16;
    /// Channel select shift
    pub const CHSEL_SHIFT: u32 = 25;
}

/// Per-stream interrupt flags, before shifting into the stream's slot.
pub mod flag {
    /// FIFO error
    pub const FE: u32 = 1 << 0;
    /// Direct mode error
    pub const DME: u32 = 1 << 2;
    /// Transfer error
    pub const TE: u32 = 1 << 3;
    /// Half transfer
    pub const HT: u32 = 1 << 4;
    /// Transfer complete
    pub const TC: u32 = 1 << 5;
    /// Every flag
    pub const ALL: u32 = FE | DME | TE | HT | TC;
    /// Errors the driver clears and counts
    pub const ERRORS: u32 = FE | DME | TE;
}

const FLAG_SHIFTS: [u32; 4] = [0, 6, 16, 22];

/// One stream of a DMA controller.
pub struct DmaStreamRegs<R> {
    regs: R,
    stream: u8,
}

impl<R: RegisterAccess> DmaStreamRegs<R> {
    /// Stream `stream` (0–7, higher bits ignored) of the controller `regs`.
    pub const fn new(regs: R, stream: u8) -> Self {
        Self {
            regs,
            stream: stream & 0x07,
        }
    }

    /// Stream number.
    pub fn stream(&self) -> u8 {
        self.stream
    }

    /// Underlying controller register access.
    pub fn raw(&self) -> &R {
        &self.regs
    }

    /// Give the controller register access back.
    pub fn into_inner(self) -> R {
        self.regs
    }

    #[allow(clippy::arithmetic_side_effects)] // stream ≤ 7, offsets < 0xD0
    fn reg(&self, offset: usize) -> usize {
        offset::STREAM0 + offset::STREAM_STRIDE * usize::from(self.stream) + offset
    }

    fn flag_shift(&self) -> u32 {
        FLAG_SHIFTS
            .get(usize::from(self.stream & 0x03))
            .copied()
            .unwrap_or(0)
    }

    fn status_offsets(&self) -> (usize, usize) {
        if self.stream < 4 {
            (offset::LISR, offset::LIFCR)
        } else {
            (offset::HISR, offset::HIFCR)
        }
    }

    /// Read SxCR.
    pub fn cr(&self) -> u32 {
        self.regs.read(self.reg(offset::CR))
    }

    /// Write SxCR.
    pub fn set_cr(&self, value: u32) {
        self.regs.write(self.reg(offset::CR), value);
    }

    /// `true` while the stream is enabled.
    pub fn is_enabled(&self) -> bool {
        self.cr() & cr::EN != 0
    }

    /// Set EN.
    pub fn enable(&self) {
        self.regs.set_bits(self.reg(offset::CR), cr::EN);
    }

    /// Clear EN. Hardware keeps it set until the current beat finishes.
    pub fn disable(&self) {
        self.regs.clear_bits(self.reg(offset::CR), cr::EN);
    }

    /// Items left to transfer.
    pub fn ndtr(&self) -> u32 {
        self.regs.read(self.reg(offset::NDTR)) & 0xFFFF
    }

    /// Program the item count.
    pub fn set_ndtr(&self, items: u16) {
        self.regs.write(self.reg(offset::NDTR), u32::from(items));
    }

    /// Program the peripheral address.
    pub fn set_par(&self, address: u32) {
        self.regs.write(self.reg(offset::PAR), address);
    }

    /// Program the memory address.
    pub fn set_m0ar(&self, address: u32) {
        self.regs.write(self.reg(offset::M0AR), address);
    }

    /// Direct mode (FIFO disabled).
    pub fn set_direct_mode(&self) {
        self.regs.write(self.reg(offset::FCR), 0);
    }

    /// Interrupt flags of this stream, unshifted (see [`flag`]).
    pub fn flags(&self) -> u32 {
        let (isr, _) = self.status_offsets();
        (self.regs.read(isr) >> self.flag_shift()) & flag::ALL
    }

    /// Clear the given flags (unshifted) of this stream.
    pub fn clear_flags(&self, flags: u32) {
        let (_, ifcr) = self.status_offsets();
        self.regs.write(ifcr, (flags & flag::ALL) << self.flag_shift());
    }
}
