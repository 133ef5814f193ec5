//! Audio output abstraction

use crate::audio_types::VolumePercent;
use crate::error::AudioError;

/// An audio path that plays a caller-owned PCM buffer.
///
/// Implemented by the codec path (audio-data bus + DMA) and the software PWM
/// path. The buffer is borrowed for `'buf`: the path keeps referring to it
/// until [`stop`](AudioOutput::stop) returns, and the borrow checker keeps the
/// owner from mutating or dropping it for that long.
pub trait AudioOutput<'buf> {
    /// Start playing `source` from its first sample.
    fn start(&mut self, source: &'buf [i16]) -> Result<(), AudioError>;

    /// Suspend sample delivery without discarding the session.
    fn pause(&mut self) -> Result<(), AudioError>;

    /// Continue a paused session.
    fn resume(&mut self) -> Result<(), AudioError>;

    /// End the session and release the buffer.
    fn stop(&mut self) -> Result<(), AudioError>;

    /// Apply an output volume.
    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), AudioError>;

    /// Samples delivered in the current session.
    fn position(&self) -> u32;

    /// `true` once the whole buffer has been delivered.
    fn is_finished(&self) -> bool;
}

impl<'buf, T: AudioOutput<'buf> + ?Sized> AudioOutput<'buf> for &mut T {
    fn start(&mut self, source: &'buf [i16]) -> Result<(), AudioError> {
        (**self).start(source)
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        (**self).pause()
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        (**self).resume()
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        (**self).stop()
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), AudioError> {
        (**self).set_volume(volume)
    }

    fn position(&self) -> u32 {
        (**self).position()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}
