//! Codec-backed audio path: WM8994 control plus the I2S/DMA stream.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use platform::{AudioError, AudioOutput, PinConfigurator, RegisterAccess, SampleRate, VolumePercent};

use super::wm8994::{CodecError, CodecState, Wm8994};
use crate::bus::{I2sBus, StreamFlags, Transfer};

/// Where the data bus is in its session.
enum Stream<'buf, 'f, S: RegisterAccess, D: RegisterAccess> {
    Idle(I2sBus<'f, S, D>),
    Active {
        transfer: Transfer<'buf, 'f, S, D>,
        paused: bool,
    },
    /// Only seen inside a method while the bus is moved between states.
    Detached,
}

/// [`AudioOutput`] over a WM8994 and the I2S3 data bus.
///
/// The codec must be brought up with [`init`](Self::init) before the first
/// `start`; after a failed bring-up every `start` fails with
/// [`AudioError::Configuration`].
pub struct CodecPath<'buf, 'f, I2C, Dl, S: RegisterAccess, D: RegisterAccess> {
    codec: Wm8994<I2C, Dl>,
    stream: Stream<'buf, 'f, S, D>,
    flags: &'f StreamFlags,
}

impl<'buf, 'f, I2C, Dl, S, D> CodecPath<'buf, 'f, I2C, Dl, S, D>
where
    I2C: I2c,
    Dl: DelayNs,
    S: RegisterAccess,
    D: RegisterAccess,
{
    /// Pair a codec driver with an idle data bus.
    pub fn new(codec: Wm8994<I2C, Dl>, bus: I2sBus<'f, S, D>) -> Self {
        let flags = bus.flags();
        Self {
            codec,
            stream: Stream::Idle(bus),
            flags,
        }
    }

    /// Bring the codec up.
    ///
    /// Every bring-up failure is reported as `Configuration`; the precise
    /// cause is logged and kept in [`codec`](Self::codec)'s state.
    pub fn init<P: PinConfigurator>(&mut self, pins: &mut P) -> Result<(), AudioError> {
        self.codec.init(pins).map_err(|_| AudioError::Configuration)
    }

    /// Stop streaming and power the codec down.
    pub fn deinit<P: PinConfigurator>(&mut self, pins: &mut P) -> Result<(), AudioError> {
        let stopped = self.stop();
        self.codec.deinit(pins)?;
        stopped
    }

    /// Change the frame rate on both the data bus and the codec.
    ///
    /// Rejected with `InvalidState` while a buffer is streaming.
    pub fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), AudioError> {
        match &mut self.stream {
            Stream::Idle(bus) => bus.set_sample_rate(rate),
            Stream::Active { .. } | Stream::Detached => return Err(CodecError::Busy.into()),
        }
        self.codec.set_sample_rate(rate)?;
        Ok(())
    }

    /// `true` while samples are flowing (not paused, not finished).
    pub fn is_playing(&self) -> bool {
        match &self.stream {
            Stream::Active { transfer, paused } => !*paused && !transfer.is_complete(),
            _ => false,
        }
    }

    /// Stored volume.
    pub fn volume(&self) -> VolumePercent {
        self.codec.volume()
    }

    /// Buffers completed since power-up.
    pub fn completions(&self) -> u32 {
        self.flags.completions()
    }

    /// Codec bring-up state.
    pub fn codec_state(&self) -> CodecState {
        self.codec.state()
    }

    /// Borrow the codec driver.
    pub fn codec(&self) -> &Wm8994<I2C, Dl> {
        &self.codec
    }

    fn halt(&mut self) -> Result<(), AudioError> {
        match core::mem::replace(&mut self.stream, Stream::Detached) {
            Stream::Active { transfer, paused } => match transfer.stop() {
                Ok(bus) => {
                    self.stream = Stream::Idle(bus);
                    Ok(())
                }
                Err(failed) => {
                    // Still streaming from the caller's buffer.
                    self.stream = Stream::Active {
                        transfer: failed.transfer,
                        paused,
                    };
                    Err(CodecError::from(failed.error).into())
                }
            },
            other => {
                self.stream = other;
                Ok(())
            }
        }
    }
}

impl<'buf, 'f, I2C, Dl, S, D> AudioOutput<'buf> for CodecPath<'buf, 'f, I2C, Dl, S, D>
where
    I2C: I2c,
    Dl: DelayNs,
    S: RegisterAccess,
    D: RegisterAccess,
{
    fn start(&mut self, source: &'buf [i16]) -> Result<(), AudioError> {
        self.codec.ensure_ready()?;
        if source.is_empty() {
            return Err(AudioError::NoSource);
        }
        self.halt()?;
        let Stream::Idle(bus) = core::mem::replace(&mut self.stream, Stream::Detached) else {
            return Err(AudioError::InvalidState);
        };
        match bus.start(source) {
            Ok(transfer) => {
                self.stream = Stream::Active {
                    transfer,
                    paused: false,
                };
                Ok(())
            }
            Err(failed) => {
                self.stream = Stream::Idle(failed.bus);
                Err(CodecError::from(failed.error).into())
            }
        }
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        match &mut self.stream {
            Stream::Active { transfer, paused } if !*paused => {
                transfer.pause();
                *paused = true;
                Ok(())
            }
            _ => Err(AudioError::InvalidState),
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        match &mut self.stream {
            Stream::Active { transfer, paused } if *paused => {
                transfer.resume();
                *paused = false;
                Ok(())
            }
            _ => Err(AudioError::InvalidState),
        }
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.halt()
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), AudioError> {
        self.codec.set_volume(volume)?;
        Ok(())
    }

    fn position(&self) -> u32 {
        match &self.stream {
            Stream::Active { transfer, .. } => transfer.position(),
            _ => 0,
        }
    }

    fn is_finished(&self) -> bool {
        match &self.stream {
            Stream::Active { transfer, .. } => transfer.is_complete(),
            _ => false,
        }
    }
}
