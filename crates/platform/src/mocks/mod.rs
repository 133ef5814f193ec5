//! Mock implementations for testing
//!
//! This module provides host-side stand-ins for the platform capabilities:
//! a simulated register file, a pin configurator that records every call,
//! and an audio output that records the commands it receives.

#![cfg(any(test, feature = "std"))]

use core::cell::{Cell, RefCell};

use crate::audio::AudioOutput;
use crate::audio_types::VolumePercent;
use crate::error::AudioError;
use crate::gpio::{PinConfig, PinConfigurator, PinId, PinState, Port};
use crate::mmio::RegisterAccess;

/// Number of 32-bit registers modelled by [`SimRegisters`].
pub const SIM_REGISTER_COUNT: usize = 64;

/// Simulated peripheral register block.
///
/// Plain memory: a write is read back unchanged. Every write is also appended
/// to a log so tests can assert on the exact programming order. Offsets past
/// the modelled range read as zero and are only logged.
pub struct SimRegisters {
    cells: [Cell<u32>; SIM_REGISTER_COUNT],
    log: RefCell<heapless::Vec<(usize, u32), 512>>,
}

impl SimRegisters {
    /// All registers zero, empty log.
    pub fn new() -> Self {
        Self {
            cells: core::array::from_fn(|_| Cell::new(0)),
            log: RefCell::new(heapless::Vec::new()),
        }
    }

    /// Set a register without recording it (hardware-side change).
    pub fn preset(&self, offset: usize, value: u32) {
        if let Some(cell) = self.cells.get(offset / 4) {
            cell.set(value);
        }
    }

    /// Current value of a register.
    pub fn peek(&self, offset: usize) -> u32 {
        self.cells.get(offset / 4).map_or(0, Cell::get)
    }

    /// Every `(offset, value)` written so far, oldest first.
    pub fn writes(&self) -> heapless::Vec<(usize, u32), 512> {
        self.log.borrow().clone()
    }

    /// Values written to one register, oldest first.
    pub fn writes_to(&self, offset: usize) -> heapless::Vec<u32, 512> {
        self.log
            .borrow()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Forget recorded writes, keep register contents.
    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterAccess for SimRegisters {
    fn read(&self, offset: usize) -> u32 {
        self.peek(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        self.preset(offset, value);
        // A full log only drops further entries.
        let _ = self.log.borrow_mut().push((offset, value));
    }
}

/// One call received by [`RecordingPins`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    /// `enable_port`
    EnablePort(Port),
    /// `configure`
    Configure(PinId, PinConfig),
    /// `write`
    Write(PinId, PinState),
}

/// Pin configurator that records calls instead of touching GPIO.
#[derive(Default)]
pub struct RecordingPins {
    events: heapless::Vec<PinEvent, 64>,
}

impl RecordingPins {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, oldest first.
    pub fn events(&self) -> &[PinEvent] {
        &self.events
    }

    /// Configuration last applied to `pin`, if any.
    pub fn config_of(&self, pin: PinId) -> Option<PinConfig> {
        self.events.iter().rev().find_map(|e| match e {
            PinEvent::Configure(p, cfg) if *p == pin => Some(*cfg),
            _ => None,
        })
    }

    /// Level last driven on `pin`, if any.
    pub fn level_of(&self, pin: PinId) -> Option<PinState> {
        self.events.iter().rev().find_map(|e| match e {
            PinEvent::Write(p, state) if *p == pin => Some(*state),
            _ => None,
        })
    }
}

impl PinConfigurator for RecordingPins {
    fn enable_port(&mut self, port: Port) {
        let _ = self.events.push(PinEvent::EnablePort(port));
    }

    fn configure(&mut self, pin: PinId, config: PinConfig) {
        let _ = self.events.push(PinEvent::Configure(pin, config));
    }

    fn write(&mut self, pin: PinId, state: PinState) {
        let _ = self.events.push(PinEvent::Write(pin, state));
    }
}

/// One command received by [`MockOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    /// `start` with the buffer length in samples
    Start(usize),
    /// `pause`
    Pause,
    /// `resume`
    Resume,
    /// `stop`
    Stop,
    /// `set_volume`
    SetVolume(u8),
}

/// Audio output that records commands and plays nothing.
///
/// Position and end-of-buffer are driven by the test through
/// [`advance`](MockOutput::advance).
#[derive(Default)]
pub struct MockOutput<'buf> {
    source: Option<&'buf [i16]>,
    position: u32,
    volume: Option<VolumePercent>,
    fail_next: Option<AudioError>,
    calls: heapless::Vec<OutputCall, 64>,
}

impl<'buf> MockOutput<'buf> {
    /// Idle output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next command fail with `error`.
    pub fn fail_next(&mut self, error: AudioError) {
        self.fail_next = Some(error);
    }

    /// Pretend `samples` more samples were delivered, capped at the buffer end.
    pub fn advance(&mut self, samples: u32) {
        let len = self.source_len();
        self.position = self.position.saturating_add(samples).min(len);
    }

    /// Buffer currently held, if any.
    pub fn source(&self) -> Option<&'buf [i16]> {
        self.source
    }

    /// Last volume applied.
    pub fn volume(&self) -> Option<VolumePercent> {
        self.volume
    }

    /// Commands received so far, oldest first.
    pub fn calls(&self) -> &[OutputCall] {
        &self.calls
    }

    fn source_len(&self) -> u32 {
        self.source
            .map_or(0, |s| u32::try_from(s.len()).unwrap_or(u32::MAX))
    }

    fn record(&mut self, call: OutputCall) -> Result<(), AudioError> {
        let _ = self.calls.push(call);
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<'buf> AudioOutput<'buf> for MockOutput<'buf> {
    fn start(&mut self, source: &'buf [i16]) -> Result<(), AudioError> {
        self.record(OutputCall::Start(source.len()))?;
        self.source = Some(source);
        self.position = 0;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.record(OutputCall::Pause)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.record(OutputCall::Resume)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.record(OutputCall::Stop)?;
        self.source = None;
        self.position = 0;
        Ok(())
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), AudioError> {
        self.record(OutputCall::SetVolume(volume.get()))?;
        self.volume = Some(volume);
        Ok(())
    }

    fn position(&self) -> u32 {
        self.position
    }

    fn is_finished(&self) -> bool {
        self.source.is_some() && self.position >= self.source_len()
    }
}
