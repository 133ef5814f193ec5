//! I2S3 audio-data bus fed by DMA1 Stream 5.
//!
//! The bus streams one borrowed `&[i16]` buffer (interleaved stereo) to the
//! codec without copying it. Ownership follows the transfer:
//!
//! ```text
//! I2sBus ──start(buf)──► Transfer<'buf> ──stop()──► I2sBus
//!                              │   ▲           │
//!                              │   └─ timeout ─┘
//!                              └── drop ⇒ stream halted
//! ```
//!
//! While a [`Transfer`] exists the buffer stays borrowed, so it cannot be
//! modified or freed under the DMA engine. A `stop` that times out hands the
//! transfer back instead of the bus. Completion is reported by
//! [`on_dma_interrupt`] through a [`StreamFlags`] shared with the ISR.
//! Only whole-buffer completion is signalled.

use core::marker::PhantomData;
use core::sync::atomic::{compiler_fence, AtomicBool, AtomicU32, Ordering};

use platform::audio_config::DataBusPins;
use platform::{PinConfig, PinConfigurator, RegisterAccess, SampleRate};

use crate::audio::clock_math::{self, I2sPrescaler};
use crate::regs::dma::{cr, flag};
use crate::regs::{base, spi, DmaStreamRegs, SpiI2sRegs};

/// Address DMA writes samples to: SPI3 data register.
#[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)] // constant, fits 32 bits
pub const SPI3_DR_ADDRESS: u32 = (base::SPI3 + spi::offset::DR) as u32;

/// Largest buffer one DMA transfer can carry (NDTR is 16 bits).
pub const MAX_TRANSFER_SAMPLES: usize = u16::MAX as usize;

/// Default poll budget when waiting for the stream to disable.
pub const DEFAULT_TIMEOUT_LOOPS: u32 = 100_000;

/// State shared between the DMA interrupt and the foreground.
///
/// Each field is a single atomic word; the ISR only stores, the foreground
/// only reads and re-arms.
pub struct StreamFlags {
    complete: AtomicBool,
    completions: AtomicU32,
    faults: AtomicU32,
}

impl StreamFlags {
    /// Cleared flags, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            complete: AtomicBool::new(false),
            completions: AtomicU32::new(0),
            faults: AtomicU32::new(0),
        }
    }

    /// `true` once the current buffer has been fully handed to the bus.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Buffers completed since power-up. Wraps.
    pub fn completions(&self) -> u32 {
        self.completions.load(Ordering::Relaxed)
    }

    /// DMA error interrupts since power-up. Wraps.
    pub fn faults(&self) -> u32 {
        self.faults.load(Ordering::Relaxed)
    }

    fn arm(&self) {
        self.complete.store(false, Ordering::Release);
    }

    fn signal_complete(&self) {
        let next = self.completions.load(Ordering::Relaxed).wrapping_add(1);
        self.completions.store(next, Ordering::Relaxed);
        self.complete.store(true, Ordering::Release);
    }

    fn record_fault(&self) {
        let next = self.faults.load(Ordering::Relaxed).wrapping_add(1);
        self.faults.store(next, Ordering::Relaxed);
    }
}

impl Default for StreamFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// DMA stream interrupt body.
///
/// Call from the `DMA1_STREAM5` handler. Clears every flag it handles so the
/// interrupt does not re-enter.
pub fn on_dma_interrupt<R: RegisterAccess>(dma: &DmaStreamRegs<R>, flags: &StreamFlags) {
    let pending = dma.flags();
    if pending & flag::ERRORS != 0 {
        dma.clear_flags(pending & flag::ERRORS);
        flags.record_fault();
    }
    if pending & flag::HT != 0 {
        dma.clear_flags(flag::HT);
    }
    if pending & flag::TC != 0 {
        dma.clear_flags(flag::TC);
        flags.signal_complete();
    }
}

/// Audio-data bus failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError {
    /// The DMA stream did not report disabled within the poll budget
    Timeout,
    /// Empty buffer, or more samples than one transfer can carry
    InvalidLength,
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => f.write_str("DMA stream did not stop in time"),
            Self::InvalidLength => f.write_str("buffer length not streamable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StreamError {}

/// Audio-data bus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sBusConfig {
    /// Frame rate
    pub sample_rate: SampleRate,
    /// Poll budget for stream disable
    pub timeout_loops: u32,
}

impl I2sBusConfig {
    /// Settings for `sample_rate` with the default poll budget.
    pub const fn new(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            timeout_loops: DEFAULT_TIMEOUT_LOOPS,
        }
    }

    /// Override the poll budget.
    pub const fn with_timeout_loops(mut self, loops: u32) -> Self {
        self.timeout_loops = loops;
        self
    }
}

/// An idle audio-data bus.
pub struct I2sBus<'f, S, D> {
    spi: SpiI2sRegs<S>,
    dma: DmaStreamRegs<D>,
    flags: &'f StreamFlags,
    sample_rate: SampleRate,
    prescaler: I2sPrescaler,
    timeout_loops: u32,
}

/// [`I2sBus::start`] failure; the bus is handed back.
pub struct StartError<'f, S, D> {
    /// The still-idle bus
    pub bus: I2sBus<'f, S, D>,
    /// What went wrong
    pub error: StreamError,
}

impl<'f, S: RegisterAccess, D: RegisterAccess> I2sBus<'f, S, D> {
    /// Configure pins, the I2S clock and the DMA stream.
    ///
    /// `dma` is the whole DMA1 controller block; the stream and channel come
    /// from the board wiring. The SPI3 and DMA1 clocks must already be on.
    pub fn open<P: PinConfigurator>(
        spi: S,
        dma: D,
        flags: &'f StreamFlags,
        pins: &mut P,
        config: I2sBusConfig,
    ) -> Result<Self, StreamError> {
        for pin in [
            DataBusPins::MCLK,
            DataBusPins::CK,
            DataBusPins::SD,
            DataBusPins::WS,
        ] {
            pins.enable_port(pin.port);
            pins.configure(pin, PinConfig::alternate_push_pull(DataBusPins::AF));
        }

        let mut bus = Self {
            spi: SpiI2sRegs::new(spi),
            dma: DmaStreamRegs::new(dma, DataBusPins::DMA_STREAM),
            flags,
            sample_rate: config.sample_rate,
            prescaler: clock_math::i2s_prescaler_apb1(config.sample_rate),
            timeout_loops: config.timeout_loops.max(1),
        };
        bus.halt()?;
        bus.configure_stream();
        bus.set_sample_rate(config.sample_rate);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "data bus open: {} Hz, I2SDIV {}, ODD {}",
            config.sample_rate.hz(),
            bus.prescaler.div,
            bus.prescaler.odd
        );
        Ok(bus)
    }

    /// Reprogram the clock for `rate`. The bus is idle, so this is safe at
    /// any time.
    pub fn set_sample_rate(&mut self, rate: SampleRate) {
        self.sample_rate = rate;
        self.prescaler = clock_math::i2s_prescaler_apb1(rate);
        self.spi.set_enabled(false);
        self.spi.configure_master_tx();
        self.spi.set_prescaler(self.prescaler.div, self.prescaler.odd);
    }

    /// Current frame rate.
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Prescaler in use.
    pub fn prescaler(&self) -> I2sPrescaler {
        self.prescaler
    }

    /// Flags shared with the DMA interrupt.
    pub fn flags(&self) -> &'f StreamFlags {
        self.flags
    }

    /// Stream `samples` from the first element.
    ///
    /// The stream is disabled, its flags cleared, the address and count
    /// programmed, and then it is re-enabled. Samples flow without CPU
    /// involvement afterwards.
    pub fn start<'buf>(
        self,
        samples: &'buf [i16],
    ) -> Result<Transfer<'buf, 'f, S, D>, StartError<'f, S, D>> {
        let Ok(count) = u16::try_from(samples.len()) else {
            return Err(StartError {
                bus: self,
                error: StreamError::InvalidLength,
            });
        };
        if count == 0 {
            return Err(StartError {
                bus: self,
                error: StreamError::InvalidLength,
            });
        }
        if let Err(error) = self.halt() {
            return Err(StartError { bus: self, error });
        }

        self.dma.clear_flags(flag::ALL);
        self.flags.arm();
        // Address of the borrowed buffer; the target has a 32-bit address space.
        #[allow(clippy::cast_possible_truncation)]
        self.dma.set_m0ar(samples.as_ptr() as usize as u32);
        self.dma.set_ndtr(count);
        // Buffer contents must be in memory before the DMA engine reads them.
        compiler_fence(Ordering::SeqCst);
        self.dma.enable();
        self.spi.set_tx_dma(true);
        self.spi.set_enabled(true);

        Ok(Transfer {
            flags: self.flags,
            bus: Some(self),
            len: count,
            _buffer: PhantomData,
        })
    }

    /// Stream control register contents for SPI3_TX on this board.
    fn configure_stream(&self) {
        let channel = u32::from(DataBusPins::DMA_CHANNEL) << cr::CHSEL_SHIFT;
        self.dma.set_cr(
            channel
                | cr::PL_MEDIUM
                | cr::MSIZE_16
                | cr::PSIZE_16
                | cr::MINC
                | cr::DIR_MEM_TO_PERIPH
                | cr::TCIE
                | cr::TEIE,
        );
        self.dma.set_par(SPI3_DR_ADDRESS);
        self.dma.set_direct_mode();
        self.dma.clear_flags(flag::ALL);
    }

    /// Stop requests, disable I2S and the stream, and wait until the stream
    /// reports disabled.
    fn halt(&self) -> Result<(), StreamError> {
        if self.try_halt() {
            return Ok(());
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("data bus: DMA stream stuck enabled");
        Err(StreamError::Timeout)
    }

    /// One bounded halt attempt; `true` once EN reads back clear.
    fn try_halt(&self) -> bool {
        self.spi.set_tx_dma(false);
        self.spi.set_enabled(false);
        self.dma.disable();
        (0..self.timeout_loops).any(|_| !self.dma.is_enabled())
    }
}

/// [`Transfer::stop`] failure; the stream may still be reading the buffer, so
/// the transfer (and its borrow) is handed back.
pub struct StopError<'buf, 'f, S: RegisterAccess, D: RegisterAccess> {
    /// The transfer that is still outstanding
    pub transfer: Transfer<'buf, 'f, S, D>,
    /// What went wrong
    pub error: StreamError,
}

/// A buffer being streamed.
///
/// Dropping the transfer halts the stream and does not return until the
/// stream reports disabled; use [`stop`](Self::stop) for a bounded wait.
/// Leaking it with `mem::forget` leaves the DMA engine reading the buffer
/// after the borrow ends.
pub struct Transfer<'buf, 'f, S: RegisterAccess, D: RegisterAccess> {
    /// `None` only after a successful `stop`.
    bus: Option<I2sBus<'f, S, D>>,
    flags: &'f StreamFlags,
    len: u16,
    _buffer: PhantomData<&'buf [i16]>,
}

impl<'buf, 'f, S: RegisterAccess, D: RegisterAccess> Transfer<'buf, 'f, S, D> {
    /// `true` once every sample has been handed to the bus.
    pub fn is_complete(&self) -> bool {
        self.flags.is_complete()
    }

    /// Samples the DMA engine has yet to move.
    pub fn samples_remaining(&self) -> u32 {
        match &self.bus {
            Some(bus) if !self.is_complete() => bus.dma.ndtr().min(u32::from(self.len)),
            _ => 0,
        }
    }

    /// Samples moved so far.
    pub fn position(&self) -> u32 {
        u32::from(self.len).saturating_sub(self.samples_remaining())
    }

    /// Buffer length in samples.
    pub fn len(&self) -> u32 {
        u32::from(self.len)
    }

    /// Always `false`; empty buffers are rejected by `start`.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Withhold DMA requests; the DMA position is kept.
    pub fn pause(&mut self) {
        if let Some(bus) = &self.bus {
            bus.spi.set_tx_dma(false);
        }
    }

    /// Re-enable DMA requests.
    pub fn resume(&mut self) {
        if let Some(bus) = &self.bus {
            bus.spi.set_tx_dma(true);
        }
    }

    /// `true` while requests are withheld.
    pub fn is_paused(&self) -> bool {
        self.bus.as_ref().is_none_or(|bus| !bus.spi.tx_dma_enabled())
    }

    /// Halt the stream and return the idle bus, releasing the buffer.
    ///
    /// If the stream does not report disabled within the timeout, the
    /// transfer comes back in the error and the buffer stays borrowed.
    pub fn stop(mut self) -> Result<I2sBus<'f, S, D>, StopError<'buf, 'f, S, D>> {
        let halted = self.bus.as_ref().map(I2sBus::halt);
        if let Some(Err(error)) = halted {
            return Err(StopError {
                transfer: self,
                error,
            });
        }
        match self.bus.take() {
            Some(bus) => Ok(bus),
            None => Err(StopError {
                transfer: self,
                error: StreamError::Timeout,
            }),
        }
    }
}

impl<S: RegisterAccess, D: RegisterAccess> Drop for Transfer<'_, '_, S, D> {
    fn drop(&mut self) {
        // The borrow ends here: the stream must be off before returning.
        if let Some(bus) = &self.bus {
            while !bus.try_halt() {}
        }
    }
}
