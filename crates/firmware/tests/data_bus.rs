//! I2S3 + DMA1 Stream 5 data bus tests over simulated register blocks.
// Integration test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::large_stack_arrays,
    clippy::cast_possible_truncation,
)]
//!
//! `SimRegisters` reads back what was written, so the stream disables as
//! soon as EN is cleared. A wrapper that pins EN high stands in for a stream
//! that never stops.
//!
//! Run with: cargo test -p firmware --test data_bus

use std::cell::Cell;

use firmware::bus::i2s::SPI3_DR_ADDRESS;
use firmware::bus::{on_dma_interrupt, I2sBus, I2sBusConfig, StreamError, StreamFlags};
use firmware::regs::dma::{cr, flag, offset as dma_offset};
use firmware::regs::spi::{cr2, i2scfgr, i2spr, offset as spi_offset};
use firmware::regs::DmaStreamRegs;
use platform::audio_config::DataBusPins;
use platform::mocks::{RecordingPins, SimRegisters};
use platform::{PinConfig, RegisterAccess, SampleRate};

const STREAM5: usize = dma_offset::STREAM0 + dma_offset::STREAM_STRIDE * 5;
const S5_CR: usize = STREAM5 + dma_offset::CR;
const S5_NDTR: usize = STREAM5 + dma_offset::NDTR;
const S5_PAR: usize = STREAM5 + dma_offset::PAR;
const S5_M0AR: usize = STREAM5 + dma_offset::M0AR;
const S5_FCR: usize = STREAM5 + dma_offset::FCR;
/// Stream 5 occupies the second slot of HISR/HIFCR.
const S5_FLAG_SHIFT: u32 = 6;

/// DMA controller whose stream 5 can be made to ignore EN being cleared.
///
/// `stuck_reads` counts the CR reads that still report EN; `u32::MAX` never
/// runs out.
#[derive(Default)]
struct StickyDma {
    sim: SimRegisters,
    stuck_reads: Cell<u32>,
}

impl StickyDma {
    fn stick(&self) {
        self.stuck_reads.set(u32::MAX);
    }

    fn stick_for(&self, reads: u32) {
        self.stuck_reads.set(reads);
    }

    fn unstick(&self) {
        self.stuck_reads.set(0);
    }
}

impl RegisterAccess for StickyDma {
    fn read(&self, offset: usize) -> u32 {
        let value = self.sim.peek(offset);
        let left = self.stuck_reads.get();
        if offset == S5_CR && left > 0 {
            if left != u32::MAX {
                self.stuck_reads.set(left - 1);
            }
            value | cr::EN
        } else {
            value
        }
    }

    fn write(&self, offset: usize, value: u32) {
        self.sim.write(offset, value);
    }
}

fn open<'f>(
    spi: &'f SimRegisters,
    dma: &'f SimRegisters,
    flags: &'f StreamFlags,
    rate: SampleRate,
) -> I2sBus<'f, &'f SimRegisters, &'f SimRegisters> {
    let mut pins = RecordingPins::new();
    I2sBus::open(spi, dma, flags, &mut pins, I2sBusConfig::new(rate).with_timeout_loops(8)).unwrap()
}

// ============================================================================
// Open
// ============================================================================

#[test]
fn open_routes_all_four_pins_to_af6() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    I2sBus::open(&spi, &dma, &flags, &mut pins, I2sBusConfig::new(SampleRate::Hz44100)).unwrap();

    for pin in [DataBusPins::MCLK, DataBusPins::CK, DataBusPins::SD, DataBusPins::WS] {
        assert_eq!(
            pins.config_of(pin),
            Some(PinConfig::alternate_push_pull(DataBusPins::AF)),
            "{pin:?}"
        );
    }
}

#[test]
fn open_programs_stream_for_spi3_tx() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let _bus = open(&spi, &dma, &flags, SampleRate::Hz44100);

    let stream_cr = dma.peek(S5_CR);
    assert_eq!(stream_cr >> cr::CHSEL_SHIFT, u32::from(DataBusPins::DMA_CHANNEL));
    for bit in [cr::MINC, cr::DIR_MEM_TO_PERIPH, cr::PSIZE_16, cr::MSIZE_16, cr::TCIE, cr::TEIE] {
        assert_eq!(stream_cr & bit, bit, "SxCR bit {bit:#x}");
    }
    assert_eq!(stream_cr & cr::EN, 0, "stream must stay disabled until start");
    assert_eq!(dma.peek(S5_PAR), SPI3_DR_ADDRESS);
    assert_eq!(dma.peek(S5_FCR), 0, "direct mode");
}

#[test]
fn open_leaves_i2s_configured_but_disabled() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);

    let cfg = spi.peek(spi_offset::I2SCFGR);
    assert_eq!(cfg, i2scfgr::I2SMOD | i2scfgr::I2SCFG_MASTER_TX);
    assert_eq!(cfg & i2scfgr::I2SE, 0);
    assert_eq!(spi.peek(spi_offset::I2SPR), 7 | i2spr::ODD | i2spr::MCKOE);
    assert_eq!(bus.sample_rate(), SampleRate::Hz44100);
}

#[test]
fn set_sample_rate_reprograms_prescaler() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut bus = open(&spi, &dma, &flags, SampleRate::Hz44100);

    bus.set_sample_rate(SampleRate::Hz48000);
    assert_eq!(spi.peek(spi_offset::I2SPR), 7 | i2spr::MCKOE);
    bus.set_sample_rate(SampleRate::Hz96000);
    assert_eq!(spi.peek(spi_offset::I2SPR), 3 | i2spr::ODD | i2spr::MCKOE);
    assert_eq!(bus.prescaler().div, 3);
}

#[test]
fn open_times_out_when_stream_never_disables() {
    let spi = SimRegisters::new();
    let dma = StickyDma::default();
    dma.stick();
    let flags = StreamFlags::new();
    let mut pins = RecordingPins::new();

    let result = I2sBus::open(
        &spi,
        &dma,
        &flags,
        &mut pins,
        I2sBusConfig::new(SampleRate::Hz44100).with_timeout_loops(4),
    );
    assert!(matches!(result, Err(StreamError::Timeout)));
}

// ============================================================================
// Start / stop
// ============================================================================

#[test]
fn start_programs_address_count_and_enables() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 512];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start rejected a valid buffer");
    };
    assert_eq!(dma.peek(S5_M0AR), samples.as_ptr() as usize as u32);
    assert_eq!(dma.peek(S5_NDTR), 512);
    assert_ne!(dma.peek(S5_CR) & cr::EN, 0);
    assert_ne!(spi.peek(spi_offset::CR2) & cr2::TXDMAEN, 0);
    assert_ne!(spi.peek(spi_offset::I2SCFGR) & i2scfgr::I2SE, 0);
    assert_eq!(transfer.len(), 512);
    assert!(!transfer.is_complete());
    assert!(!transfer.is_paused());
}

#[test]
fn start_clears_stale_flags_before_enabling() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    dma.clear_log();
    let samples = [0i16; 16];

    let Ok(_transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    let writes = dma.writes();
    let clear = writes
        .iter()
        .position(|&(o, v)| o == dma_offset::HIFCR && v == flag::ALL << S5_FLAG_SHIFT)
        .expect("flags cleared");
    let enable = writes
        .iter()
        .rposition(|&(o, v)| o == S5_CR && v & cr::EN != 0)
        .expect("stream enabled");
    assert!(clear < enable);
}

#[test]
fn start_rejects_empty_and_oversized_buffers() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);

    let Err(failed) = bus.start(&[]) else {
        panic!("empty buffer accepted");
    };
    assert_eq!(failed.error, StreamError::InvalidLength);

    let oversized = vec![0i16; usize::from(u16::MAX) + 1];
    let Err(failed) = failed.bus.start(&oversized) else {
        panic!("oversized buffer accepted");
    };
    assert_eq!(failed.error, StreamError::InvalidLength);
    assert_eq!(dma.peek(S5_CR) & cr::EN, 0);
}

#[test]
fn start_accepts_largest_transfer() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = vec![0i16; usize::from(u16::MAX)];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("largest buffer rejected");
    };
    assert_eq!(dma.peek(S5_NDTR), u32::from(u16::MAX));
    drop(transfer);
}

#[test]
fn stop_halts_stream_and_returns_bus() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [1i16; 64];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    let Ok(bus) = transfer.stop() else {
        panic!("stop failed");
    };
    assert_eq!(dma.peek(S5_CR) & cr::EN, 0);
    assert_eq!(spi.peek(spi_offset::CR2) & cr2::TXDMAEN, 0);
    assert_eq!(spi.peek(spi_offset::I2SCFGR) & i2scfgr::I2SE, 0);

    // The returned bus streams again.
    let Ok(_again) = bus.start(&samples) else {
        panic!("restart failed");
    };
}

#[test]
fn dropping_transfer_halts_stream() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 8];
    {
        let Ok(_transfer) = bus.start(&samples) else {
            panic!("start failed");
        };
        assert_ne!(dma.peek(S5_CR) & cr::EN, 0);
    }
    assert_eq!(dma.peek(S5_CR) & cr::EN, 0);
    assert_eq!(spi.peek(spi_offset::I2SCFGR) & i2scfgr::I2SE, 0);
}

fn sticky_bus<'f>(
    spi: &'f SimRegisters,
    dma: &'f StickyDma,
    flags: &'f StreamFlags,
) -> I2sBus<'f, &'f SimRegisters, &'f StickyDma> {
    let mut pins = RecordingPins::new();
    I2sBus::open(spi, dma, flags, &mut pins, I2sBusConfig::new(SampleRate::Hz48000).with_timeout_loops(4))
        .unwrap()
}

#[test]
fn start_and_stop_report_stuck_stream() {
    let (spi, dma, flags) = (SimRegisters::new(), StickyDma::default(), StreamFlags::new());
    let bus = sticky_bus(&spi, &dma, &flags);
    let samples = [0i16; 32];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    dma.stick();
    let Err(failed) = transfer.stop() else {
        panic!("stop on a stuck stream succeeded");
    };
    dma.unstick();
    assert_eq!(failed.error, StreamError::Timeout);
    let Ok(bus) = failed.transfer.stop() else {
        panic!("stop after the stream settled failed");
    };

    dma.stick();
    let Err(failed) = bus.start(&samples) else {
        panic!("start on a stuck stream succeeded");
    };
    assert_eq!(failed.error, StreamError::Timeout);
}

#[test]
fn failed_stop_keeps_the_buffer_borrowed() {
    let (spi, dma, flags) = (SimRegisters::new(), StickyDma::default(), StreamFlags::new());
    let bus = sticky_bus(&spi, &dma, &flags);
    let samples = [7i16; 16];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    dma.stick();
    let Err(failed) = transfer.stop() else {
        panic!("stop on a stuck stream succeeded");
    };
    let stream_enabled = dma.read(S5_CR) & cr::EN != 0;
    let address = dma.sim.peek(S5_M0AR);
    dma.unstick();

    // The stream is still live on `samples`, and the transfer that borrows
    // them came back with the error.
    assert!(stream_enabled);
    assert_eq!(address, samples.as_ptr() as usize as u32);
    assert_eq!(failed.transfer.len(), 16);

    let Ok(_bus) = failed.transfer.stop() else {
        panic!("stop after the stream settled failed");
    };
    assert_eq!(dma.sim.peek(S5_CR) & cr::EN, 0);
}

#[test]
fn dropping_transfer_waits_for_a_slow_stream() {
    let (spi, dma, flags) = (SimRegisters::new(), StickyDma::default(), StreamFlags::new());
    let bus = sticky_bus(&spi, &dma, &flags);
    let samples = [0i16; 16];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    // Outlasts several bounded halt attempts.
    dma.stick_for(25);
    drop(transfer);

    assert_eq!(dma.stuck_reads.get(), 0);
    assert_eq!(dma.read(S5_CR) & cr::EN, 0);
    assert_eq!(spi.peek(spi_offset::I2SCFGR) & i2scfgr::I2SE, 0);
}

// ============================================================================
// Pause / position / completion
// ============================================================================

#[test]
fn pause_withholds_requests_and_keeps_position() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 1000];

    let Ok(mut transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    dma.preset(S5_NDTR, 600);
    transfer.pause();
    assert!(transfer.is_paused());
    assert_eq!(spi.peek(spi_offset::CR2) & cr2::TXDMAEN, 0);
    assert_ne!(dma.peek(S5_CR) & cr::EN, 0, "stream stays armed while paused");
    assert_eq!(transfer.position(), 400);

    transfer.resume();
    assert!(!transfer.is_paused());
    assert_ne!(spi.peek(spi_offset::CR2) & cr2::TXDMAEN, 0);
    assert_eq!(transfer.position(), 400);
}

#[test]
fn position_counts_samples_moved() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 300];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    assert_eq!(transfer.position(), 0);
    assert_eq!(transfer.samples_remaining(), 300);
    dma.preset(S5_NDTR, 1);
    assert_eq!(transfer.position(), 299);
    // A count larger than the buffer is clamped.
    dma.preset(S5_NDTR, 0xFFFF);
    assert_eq!(transfer.position(), 0);
}

#[test]
fn transfer_complete_interrupt_finishes_buffer() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 128];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    dma.clear_log();
    dma.preset(dma_offset::HISR, flag::TC << S5_FLAG_SHIFT);
    on_dma_interrupt(&DmaStreamRegs::new(&dma, DataBusPins::DMA_STREAM), &flags);

    assert!(transfer.is_complete());
    assert_eq!(transfer.samples_remaining(), 0);
    assert_eq!(transfer.position(), 128);
    assert_eq!(flags.completions(), 1);
    assert_eq!(
        dma.writes_to(dma_offset::HIFCR).as_slice(),
        &[flag::TC << S5_FLAG_SHIFT]
    );
}

#[test]
fn half_transfer_is_cleared_without_completing() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 128];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    dma.clear_log();
    dma.preset(dma_offset::HISR, flag::HT << S5_FLAG_SHIFT);
    on_dma_interrupt(&DmaStreamRegs::new(&dma, DataBusPins::DMA_STREAM), &flags);

    assert!(!transfer.is_complete());
    assert_eq!(flags.completions(), 0);
    assert_eq!(
        dma.writes_to(dma_offset::HIFCR).as_slice(),
        &[flag::HT << S5_FLAG_SHIFT]
    );
}

#[test]
fn error_flags_are_counted_and_cleared() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let _bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    dma.clear_log();
    dma.preset(dma_offset::HISR, (flag::TE | flag::FE) << S5_FLAG_SHIFT);

    on_dma_interrupt(&DmaStreamRegs::new(&dma, DataBusPins::DMA_STREAM), &flags);

    assert_eq!(flags.faults(), 1);
    assert!(!flags.is_complete());
    assert_eq!(
        dma.writes_to(dma_offset::HIFCR).as_slice(),
        &[(flag::TE | flag::FE) << S5_FLAG_SHIFT]
    );
}

#[test]
fn restart_rearms_completion() {
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let bus = open(&spi, &dma, &flags, SampleRate::Hz44100);
    let samples = [0i16; 10];

    let Ok(transfer) = bus.start(&samples) else {
        panic!("start failed");
    };
    dma.preset(dma_offset::HISR, flag::TC << S5_FLAG_SHIFT);
    on_dma_interrupt(&DmaStreamRegs::new(&dma, DataBusPins::DMA_STREAM), &flags);
    assert!(transfer.is_complete());
    dma.preset(dma_offset::HISR, 0);

    let Ok(bus) = transfer.stop() else {
        panic!("stop failed");
    };
    let Ok(again) = bus.start(&samples) else {
        panic!("restart failed");
    };
    assert!(!again.is_complete());
    assert_eq!(flags.completions(), 1);
}
