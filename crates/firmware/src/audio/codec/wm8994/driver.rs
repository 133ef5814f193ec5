//! WM8994 bring-up and control driver.
//!
//! Uses the blocking `embedded_hal::i2c::I2c` and `embedded_hal::delay::DelayNs`
//! traits, so it runs on [`ControlBus`](crate::bus::ControlBus) on target and
//! on `embedded-hal-mock` in tests.
//!
//! # Bring-up
//!
//! ```text
//! Uninitialized ─power pin─► read CHIP_ID ─0x89xx─► Identified
//!   ─reset, 10 ms─► Reset ─PM1..3, 100 ms─► PoweredUp
//!   ─AIF1, AIF2─► InterfaceConfigured ─volume, mixers─► Ready
//! ```
//!
//! Any failure lands in `Failed`. The driver then refuses every operation
//! that would touch the chip until [`Wm8994::init`] is run again.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use platform::audio_config::CodecPowerPin;
use platform::{AudioError, PinConfig, PinConfigurator, PinState, SampleRate, VolumePercent};

use super::registers::*;
use crate::bus::StreamError;

/// Bring-up progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecState {
    /// Not brought up, or shut down with `deinit`
    Uninitialized,
    /// Identity register matched
    Identified,
    /// Software reset issued
    Reset,
    /// Bias and reference up
    PoweredUp,
    /// Serial format and rate programmed
    InterfaceConfigured,
    /// Volume and routing set; ready to play
    Ready,
    /// Bring-up failed; re-run `init`
    Failed,
}

/// Codec failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// The control bus reported an error
    Bus(ErrorKind),
    /// The identity register did not hold a WM8994 family code
    IdentityMismatch(u16),
    /// A previous bring-up failed
    Failed,
    /// Bring-up has not completed
    NotReady,
    /// The operation needs the audio stream idle
    Busy,
    /// The audio-data bus reported an error
    Stream(StreamError),
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "codec bus error: {kind}"),
            Self::IdentityMismatch(id) => write!(f, "codec identity mismatch: {id:#06x}"),
            Self::Failed => f.write_str("codec bring-up failed"),
            Self::NotReady => f.write_str("codec not initialised"),
            Self::Busy => f.write_str("codec busy streaming"),
            Self::Stream(e) => write!(f, "codec stream error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

impl From<StreamError> for CodecError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<CodecError> for AudioError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Bus(_) | CodecError::Stream(StreamError::Timeout) => Self::Timeout,
            CodecError::IdentityMismatch(_)
            | CodecError::Failed
            | CodecError::Stream(StreamError::InvalidLength) => Self::Configuration,
            CodecError::NotReady | CodecError::Busy => Self::InvalidState,
        }
    }
}

/// WM8994 codec on a control bus.
pub struct Wm8994<I2C, D> {
    i2c: I2C,
    delay: D,
    state: CodecState,
    volume: VolumePercent,
    sample_rate: SampleRate,
}

impl<I2C: I2c, D: DelayNs> Wm8994<I2C, D> {
    /// Create an uninitialised driver. Nothing is sent until [`init`](Self::init).
    pub fn new(i2c: I2C, delay: D, volume: VolumePercent, sample_rate: SampleRate) -> Self {
        Self {
            i2c,
            delay,
            state: CodecState::Uninitialized,
            volume,
            sample_rate,
        }
    }

    /// Power the chip and run the full bring-up.
    ///
    /// Returns immediately when already `Ready`. From any other state,
    /// including `Failed`, the sequence starts over.
    pub fn init<P: PinConfigurator>(&mut self, pins: &mut P) -> Result<(), CodecError> {
        if self.state == CodecState::Ready {
            return Ok(());
        }
        #[cfg(feature = "defmt")]
        defmt::info!("Initialising WM8994 codec");

        self.state = CodecState::Uninitialized;
        pins.enable_port(CodecPowerPin::PIN.port);
        pins.configure(CodecPowerPin::PIN, PinConfig::output());
        pins.write(CodecPowerPin::PIN, PinState::High);

        match self.bring_up() {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::info!("WM8994 ready at {} Hz", self.sample_rate.hz());
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("WM8994 bring-up failed in {}: {}", self.state, e);
                self.state = CodecState::Failed;
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> Result<(), CodecError> {
        let chip_id = self.read_register(REG_CHIP_ID)?;
        if !is_wm8994(chip_id) {
            return Err(CodecError::IdentityMismatch(chip_id));
        }
        self.state = CodecState::Identified;

        self.write_register(REG_SOFTWARE_RESET, SOFTWARE_RESET)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        self.state = CodecState::Reset;

        self.write_register(REG_POWER_MANAGEMENT_1, PM1_BIAS_VMID)?;
        self.write_register(REG_POWER_MANAGEMENT_2, POWER_OFF)?;
        self.write_register(REG_POWER_MANAGEMENT_3, POWER_OFF)?;
        self.delay.delay_ms(POWER_SETTLE_MS);
        self.state = CodecState::PoweredUp;

        self.write_register(REG_AUDIO_INTERFACE_1, AIF1_I2S_16BIT)?;
        self.write_register(REG_AUDIO_INTERFACE_2, aif2_for(self.sample_rate))?;
        self.state = CodecState::InterfaceConfigured;

        self.write_volume()?;
        self.write_register(REG_OUTPUT_MIXER_1, MIXER_DAC_TO_OUTPUT)?;
        self.write_register(REG_OUTPUT_MIXER_2, MIXER_DAC_TO_OUTPUT)?;
        self.state = CodecState::Ready;
        Ok(())
    }

    /// Power the chip down and release the power pin.
    ///
    /// The chip is only written to when it was `Ready`; the pin is driven low
    /// regardless and the driver returns to `Uninitialized`.
    pub fn deinit<P: PinConfigurator>(&mut self, pins: &mut P) -> Result<(), CodecError> {
        let result = if self.state == CodecState::Ready {
            self.write_register(REG_POWER_MANAGEMENT_1, POWER_OFF)
        } else {
            Ok(())
        };
        pins.write(CodecPowerPin::PIN, PinState::Low);
        self.state = CodecState::Uninitialized;
        result
    }

    /// Read a 16-bit register: pointer write, gap, two-byte read.
    pub fn read_register(&mut self, reg: u16) -> Result<u16, CodecError> {
        let mut value = [0u8; 2];
        self.i2c
            .write(I2C_ADDR, &[register_pointer(reg)])
            .map_err(|e| CodecError::Bus(e.kind()))?;
        self.delay.delay_us(READ_GAP_US);
        self.i2c
            .read(I2C_ADDR, &mut value)
            .map_err(|e| CodecError::Bus(e.kind()))?;
        Ok(u16::from_be_bytes(value))
    }

    /// Write a 16-bit register.
    pub fn write_register(&mut self, reg: u16, value: u16) -> Result<(), CodecError> {
        self.i2c
            .write(I2C_ADDR, &write_frame(reg, value))
            .map_err(|e| CodecError::Bus(e.kind()))
    }

    fn write_volume(&mut self) -> Result<(), CodecError> {
        let value = volume_register(self.volume);
        self.write_register(REG_LEFT_OUTPUT_VOLUME, value)?;
        self.write_register(REG_RIGHT_OUTPUT_VOLUME, value)
    }

    /// Store `volume` and, when `Ready`, write it to both output channels.
    ///
    /// Before bring-up the value is applied by `init`.
    pub fn set_volume(&mut self, volume: VolumePercent) -> Result<(), CodecError> {
        self.volume = volume;
        match self.state {
            CodecState::Ready => self.write_volume(),
            _ => Ok(()),
        }
    }

    /// Store `rate` and, when `Ready`, reprogram the interface clocking.
    pub fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), CodecError> {
        self.sample_rate = rate;
        match self.state {
            CodecState::Ready => self.write_register(REG_AUDIO_INTERFACE_2, aif2_for(rate)),
            _ => Ok(()),
        }
    }

    /// `Ok` when the chip may be used for playback.
    pub fn ensure_ready(&self) -> Result<(), CodecError> {
        match self.state {
            CodecState::Ready => Ok(()),
            CodecState::Failed => Err(CodecError::Failed),
            _ => Err(CodecError::NotReady),
        }
    }

    /// Current bring-up state.
    pub fn state(&self) -> CodecState {
        self.state
    }

    /// Stored volume.
    pub fn volume(&self) -> VolumePercent {
        self.volume
    }

    /// Stored sample rate.
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Hand back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}
