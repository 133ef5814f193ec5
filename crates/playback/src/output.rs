//! Device-profile dispatch.
//!
//! A board is built either with the codec path or with the PWM path. The
//! binary picks one at start-up and hands the engine a [`ProfileOutput`], so
//! the state machine is monomorphised once regardless of profile.

use platform::{AudioError, AudioOutput, AudioProfile, VolumePercent};

/// The audio path selected by the device profile.
pub enum ProfileOutput<C, P> {
    /// Codec-backed path.
    Codec(C),
    /// PWM-backed path.
    Pwm(P),
}

impl<C, P> ProfileOutput<C, P> {
    /// Which profile this output implements.
    pub fn profile(&self) -> AudioProfile {
        match self {
            Self::Codec(_) => AudioProfile::Codec,
            Self::Pwm(_) => AudioProfile::Pwm,
        }
    }
}

impl<'buf, C, P> AudioOutput<'buf> for ProfileOutput<C, P>
where
    C: AudioOutput<'buf>,
    P: AudioOutput<'buf>,
{
    fn start(&mut self, source: &'buf [i16]) -> Result<(), AudioError> {
        match self {
            Self::Codec(c) => c.start(source),
            Self::Pwm(p) => p.start(source),
        }
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        match self {
            Self::Codec(c) => c.pause(),
            Self::Pwm(p) => p.pause(),
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        match self {
            Self::Codec(c) => c.resume(),
            Self::Pwm(p) => p.resume(),
        }
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        match self {
            Self::Codec(c) => c.stop(),
            Self::Pwm(p) => p.stop(),
        }
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), AudioError> {
        match self {
            Self::Codec(c) => c.set_volume(volume),
            Self::Pwm(p) => p.set_volume(volume),
        }
    }

    fn position(&self) -> u32 {
        match self {
            Self::Codec(c) => c.position(),
            Self::Pwm(p) => p.position(),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Self::Codec(c) => c.is_finished(),
            Self::Pwm(p) => p.is_finished(),
        }
    }
}
