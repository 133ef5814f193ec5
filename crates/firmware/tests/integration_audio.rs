//! Audio integration tests — codec bring-up on the wire and the codec path
//! under the playback engine.
// Integration test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::large_stack_arrays,
)]
//!
//! The control bus is `embedded-hal-mock`'s I2C mock, so every byte the
//! WM8994 driver sends is checked in order. The data bus runs on simulated
//! SPI/DMA register blocks.
//!
//! Run with: cargo test -p firmware --test integration_audio

use std::cell::Cell;

use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use firmware::audio::codec::wm8994::registers::{self, I2C_ADDR};
use firmware::audio::{CodecError, CodecPath, CodecState, Wm8994};
use firmware::bus::{on_dma_interrupt, I2sBus, I2sBusConfig, StreamFlags};
use firmware::regs::dma::{cr, flag, offset as dma_offset};
use firmware::regs::DmaStreamRegs;
use platform::audio_config::{CodecPowerPin, DataBusPins};
use platform::mocks::{RecordingPins, SimRegisters};
use platform::{
    AudioError, AudioOutput, LoopMode, PinState, PlayerConfig, RegisterAccess, SampleRate, TrackId,
    VolumePercent,
};
use playback::{PlaybackEngine, PlaybackEvent, PlaybackState};

const S5_CR: usize = dma_offset::STREAM0 + dma_offset::STREAM_STRIDE * 5 + dma_offset::CR;
const S5_NDTR: usize = dma_offset::STREAM0 + dma_offset::STREAM_STRIDE * 5 + dma_offset::NDTR;

type Path<'buf, 'f> = CodecPath<'buf, 'f, I2cMock, NoopDelay, &'f SimRegisters, &'f SimRegisters>;

fn write(reg: u16, value: u16) -> I2cTransaction {
    I2cTransaction::write(I2C_ADDR, registers::write_frame(reg, value).to_vec())
}

fn identify(chip_id: [u8; 2]) -> Vec<I2cTransaction> {
    vec![
        I2cTransaction::write(I2C_ADDR, vec![0x00]),
        I2cTransaction::read(I2C_ADDR, chip_id.to_vec()),
    ]
}

fn volume_writes(register: u16) -> Vec<I2cTransaction> {
    vec![
        write(registers::REG_LEFT_OUTPUT_VOLUME, register),
        write(registers::REG_RIGHT_OUTPUT_VOLUME, register),
    ]
}

/// Full bring-up as seen on the wire.
fn bring_up(aif2: u16, volume_register: u16) -> Vec<I2cTransaction> {
    let mut t = identify([0x89, 0x94]);
    t.extend([
        write(0x0000, 0x0000),
        write(0x0001, 0x1003),
        write(0x0002, 0x0000),
        write(0x0003, 0x0000),
        write(0x0300, 0x0000),
        write(0x0301, aif2),
    ]);
    t.extend(volume_writes(volume_register));
    t.extend([write(0x002D, 0x0001), write(0x002E, 0x0001)]);
    t
}

fn data_bus<'f>(
    spi: &'f SimRegisters,
    dma: &'f SimRegisters,
    flags: &'f StreamFlags,
    pins: &mut RecordingPins,
) -> I2sBus<'f, &'f SimRegisters, &'f SimRegisters> {
    I2sBus::open(spi, dma, flags, pins, I2sBusConfig::new(SampleRate::Hz44100).with_timeout_loops(8))
        .unwrap()
}

/// DMA block whose stream 5 keeps reporting EN while `pinned` is set.
#[derive(Default)]
struct PinnedStream {
    sim: SimRegisters,
    pinned: Cell<bool>,
}

impl RegisterAccess for PinnedStream {
    fn read(&self, offset: usize) -> u32 {
        let value = self.sim.peek(offset);
        if offset == S5_CR && self.pinned.get() {
            value | cr::EN
        } else {
            value
        }
    }

    fn write(&self, offset: usize, value: u32) {
        self.sim.write(offset, value);
    }
}

fn complete_transfer(dma: &SimRegisters, flags: &StreamFlags) {
    dma.preset(dma_offset::HISR, flag::TC << 6);
    on_dma_interrupt(&DmaStreamRegs::new(dma, DataBusPins::DMA_STREAM), flags);
    dma.preset(dma_offset::HISR, 0);
}

// ============================================================================
// WM8994 bring-up
// ============================================================================

#[test]
fn bring_up_bytes_match_register_map() {
    let frames = bring_up(0x4000, 0x00D9);
    // Write frames carry the register's high byte, then the value big-endian.
    assert_eq!(registers::write_frame(0x0001, 0x1003), [0x00, 0x10, 0x03]);
    assert_eq!(registers::write_frame(0x0301, 0x4000), [0x03, 0x40, 0x00]);
    assert_eq!(frames.len(), 2 + 10);
}

#[test]
fn codec_init_sends_exact_sequence() {
    let mut i2c = I2cMock::new(&bring_up(0x4000, 0x00D9));
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    codec.init(&mut pins).unwrap();

    assert_eq!(codec.state(), CodecState::Ready);
    assert_eq!(pins.level_of(CodecPowerPin::PIN), Some(PinState::High));
    i2c.done();
}

#[test]
fn codec_init_at_96k_doubles_interface_rate() {
    let mut i2c = I2cMock::new(&bring_up(0x8000, 0x00D9));
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz96000);

    codec.init(&mut pins).unwrap();
    i2c.done();
}

#[test]
fn init_when_ready_is_silent() {
    let mut i2c = I2cMock::new(&bring_up(0x4000, 0x00D9));
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    codec.init(&mut pins).unwrap();
    codec.init(&mut pins).unwrap();
    i2c.done();
}

#[test]
fn identity_mismatch_fails_bring_up() {
    let mut i2c = I2cMock::new(&identify([0x12, 0x34]));
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    assert_eq!(codec.init(&mut pins), Err(CodecError::IdentityMismatch(0x1234)));
    assert_eq!(codec.state(), CodecState::Failed);
    assert_eq!(codec.ensure_ready(), Err(CodecError::Failed));
    i2c.done();
}

#[test]
fn bus_error_mid_bring_up_fails() {
    let mut t = identify([0x89, 0x94]);
    t.push(write(0x0000, 0x0000).with_error(ErrorKind::Other));
    let mut i2c = I2cMock::new(&t);
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    assert_eq!(codec.init(&mut pins), Err(CodecError::Bus(ErrorKind::Other)));
    assert_eq!(codec.state(), CodecState::Failed);
    i2c.done();
}

#[test]
fn volume_before_bring_up_is_stored_only() {
    let mut i2c = I2cMock::new(&bring_up(0x4000, 0x00FF));
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    codec.set_volume(VolumePercent::MAX).unwrap();
    codec.init(&mut pins).unwrap();
    assert_eq!(codec.volume(), VolumePercent::MAX);
    i2c.done();
}

#[test]
fn volume_after_bring_up_writes_both_channels() {
    let mut t = bring_up(0x4000, 0x00D9);
    // 30 % → (30 × 127 + 50) / 100 = 38 → 0x26 | unmute
    t.extend(volume_writes(0x00A6));
    let mut i2c = I2cMock::new(&t);
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    codec.init(&mut pins).unwrap();
    codec.set_volume(VolumePercent::new(30)).unwrap();
    i2c.done();
}

#[test]
fn deinit_powers_down_and_drops_supply() {
    let mut t = bring_up(0x4000, 0x00D9);
    t.push(write(0x0001, 0x0000));
    let mut i2c = I2cMock::new(&t);
    let mut pins = RecordingPins::new();
    let mut codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);

    codec.init(&mut pins).unwrap();
    codec.deinit(&mut pins).unwrap();
    assert_eq!(codec.state(), CodecState::Uninitialized);
    assert_eq!(pins.level_of(CodecPowerPin::PIN), Some(PinState::Low));
    i2c.done();
}

// ============================================================================
// Codec path
// ============================================================================

#[test]
fn failed_bring_up_surfaces_as_configuration() {
    let samples = [0i16; 64];
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let mut i2c = I2cMock::new(&identify([0x00, 0x00]));
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let mut path: Path<'_, '_> = CodecPath::new(codec, data_bus(&spi, &dma, &flags, &mut pins));

    assert_eq!(path.init(&mut pins), Err(AudioError::Configuration));
    assert_eq!(path.start(&samples), Err(AudioError::Configuration));
    assert_eq!(dma.peek(S5_CR) & cr::EN, 0, "nothing may stream");
    i2c.done();
}

#[test]
fn start_before_init_is_invalid_state() {
    let samples = [0i16; 4];
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let none: [I2cTransaction; 0] = [];
    let mut i2c = I2cMock::new(&none);
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let mut path: Path<'_, '_> = CodecPath::new(codec, data_bus(&spi, &dma, &flags, &mut pins));

    assert_eq!(path.start(&samples), Err(AudioError::InvalidState));
    i2c.done();
}

#[test]
fn codec_path_session_lifecycle() {
    let samples = [0i16; 200];
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let mut i2c = I2cMock::new(&bring_up(0x4000, 0x00D9));
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let mut path: Path<'_, '_> = CodecPath::new(codec, data_bus(&spi, &dma, &flags, &mut pins));
    path.init(&mut pins).unwrap();

    assert_eq!(path.pause(), Err(AudioError::InvalidState), "nothing to pause");
    assert_eq!(path.start(&[]), Err(AudioError::NoSource));

    path.start(&samples).unwrap();
    assert!(path.is_playing());
    dma.preset(S5_NDTR, 150);
    assert_eq!(path.position(), 50);

    path.pause().unwrap();
    assert!(!path.is_playing());
    assert_eq!(path.pause(), Err(AudioError::InvalidState));
    assert_eq!(path.position(), 50);
    path.resume().unwrap();
    assert_eq!(path.resume(), Err(AudioError::InvalidState));

    complete_transfer(&dma, &flags);
    assert!(path.is_finished());
    assert_eq!(path.position(), 200);
    assert_eq!(path.completions(), 1);

    path.stop().unwrap();
    assert!(!path.is_finished());
    assert_eq!(path.position(), 0);
    assert_eq!(dma.peek(S5_CR) & cr::EN, 0);
    i2c.done();
}

#[test]
fn sample_rate_change_rejected_while_streaming() {
    let samples = [0i16; 16];
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let mut t = bring_up(0x4000, 0x00D9);
    t.push(write(0x0301, 0x8000));
    let mut i2c = I2cMock::new(&t);
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let mut path: Path<'_, '_> = CodecPath::new(codec, data_bus(&spi, &dma, &flags, &mut pins));
    path.init(&mut pins).unwrap();

    path.start(&samples).unwrap();
    assert_eq!(path.set_sample_rate(SampleRate::Hz96000), Err(AudioError::InvalidState));
    path.stop().unwrap();
    path.set_sample_rate(SampleRate::Hz96000).unwrap();
    i2c.done();
}

#[test]
fn codec_path_keeps_session_when_stop_times_out() {
    let samples = [0i16; 64];
    let (spi, dma, flags) = (SimRegisters::new(), PinnedStream::default(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let mut i2c = I2cMock::new(&bring_up(0x4000, 0x00D9));
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let bus = I2sBus::open(
        &spi,
        &dma,
        &flags,
        &mut pins,
        I2sBusConfig::new(SampleRate::Hz44100).with_timeout_loops(4),
    )
    .unwrap();
    let mut path = CodecPath::new(codec, bus);
    path.init(&mut pins).unwrap();

    path.start(&samples).unwrap();
    dma.sim.preset(S5_NDTR, 40);
    dma.pinned.set(true);
    let stopped = path.stop();
    let position = path.position();
    let rate_change = path.set_sample_rate(SampleRate::Hz48000);
    let restarted = path.start(&samples);
    dma.pinned.set(false);

    assert_eq!(stopped, Err(AudioError::Timeout));
    // The session, and with it the borrow of `samples`, is still live.
    assert_eq!(position, 24);
    assert_eq!(rate_change, Err(AudioError::InvalidState));
    assert_eq!(restarted, Err(AudioError::Timeout));

    path.stop().unwrap();
    assert_eq!(path.position(), 0);
    assert_eq!(dma.sim.peek(S5_CR) & cr::EN, 0);
    i2c.done();
}

// ============================================================================
// Engine over the codec path
// ============================================================================

#[test]
fn engine_plays_buffer_to_completion_over_codec() {
    let samples = [0i16; 400];
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let mut t = bring_up(0x4000, 0x00D9);
    // `play` applies the engine's volume before starting the stream.
    t.extend(volume_writes(0x00D9));
    let mut i2c = I2cMock::new(&t);
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let mut path: Path<'_, '_> = CodecPath::new(codec, data_bus(&spi, &dma, &flags, &mut pins));
    path.init(&mut pins).unwrap();

    let config = PlayerConfig::new();
    let mut engine = PlaybackEngine::new(path, &config);
    engine.load(TrackId(3), &samples).unwrap();
    engine.play().unwrap();
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert_eq!(engine.poll(), Ok(None));

    complete_transfer(&dma, &flags);
    assert_eq!(
        engine.poll(),
        Ok(Some(PlaybackEvent::TrackFinished {
            track: TrackId(3),
            loop_mode: LoopMode::Off,
            shuffle: false,
        }))
    );
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert_eq!(engine.position(), 0);
    assert_eq!(dma.peek(S5_CR) & cr::EN, 0);
    i2c.done();
}

#[test]
fn engine_loop_one_restarts_codec_stream() {
    let samples = [0i16; 32];
    let (spi, dma, flags) = (SimRegisters::new(), SimRegisters::new(), StreamFlags::new());
    let mut pins = RecordingPins::new();
    let mut t = bring_up(0x4000, 0x00D9);
    t.extend(volume_writes(0x00D9));
    let mut i2c = I2cMock::new(&t);
    let codec = Wm8994::new(i2c.clone(), NoopDelay::new(), VolumePercent::DEFAULT, SampleRate::Hz44100);
    let mut path: Path<'_, '_> = CodecPath::new(codec, data_bus(&spi, &dma, &flags, &mut pins));
    path.init(&mut pins).unwrap();

    let config = PlayerConfig::new().with_loop_mode(LoopMode::One);
    let mut engine = PlaybackEngine::new(path, &config);
    engine.load(TrackId(0), &samples).unwrap();
    engine.play().unwrap();

    complete_transfer(&dma, &flags);
    assert_eq!(engine.poll(), Ok(Some(PlaybackEvent::TrackRestarted(TrackId(0)))));
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert!(!engine.output().is_finished());
    assert_ne!(dma.peek(S5_CR) & cr::EN, 0);
    assert_eq!(engine.output().completions(), 1);
    i2c.done();
}
