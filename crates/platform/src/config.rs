//! Player configuration surface.
//!
//! Everything a device variant may choose at build or boot time:
//! the audio profile, output sample rate, and the initial volume, loop mode
//! and shuffle setting handed to the playback state machine.

use crate::audio_types::{AudioProfile, LoopMode, SampleRate, VolumePercent};
use crate::error::AudioError;

/// The application name
pub const APP_NAME: &str = "F4 Audio Player";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boot-time player configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayerConfig {
    /// Which audio path to drive.
    pub profile: AudioProfile,
    /// Output sample rate.
    pub sample_rate: SampleRate,
    /// Volume applied before the first `play`.
    pub initial_volume: VolumePercent,
    /// Loop mode at power-on.
    pub loop_mode: LoopMode,
    /// Shuffle at power-on.
    pub shuffle: bool,
}

impl PlayerConfig {
    /// Codec path, 44.1 kHz, volume 70, loop off, shuffle off.
    pub const fn new() -> Self {
        Self {
            profile: AudioProfile::Codec,
            sample_rate: SampleRate::Hz44100,
            initial_volume: VolumePercent::DEFAULT,
            loop_mode: LoopMode::Off,
            shuffle: false,
        }
    }

    /// Select the audio path.
    #[must_use]
    pub const fn with_profile(mut self, profile: AudioProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Select the sample rate.
    #[must_use]
    pub const fn with_sample_rate(mut self, sample_rate: SampleRate) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the initial volume (clamped to 100).
    #[must_use]
    pub const fn with_volume(mut self, volume: u8) -> Self {
        self.initial_volume = VolumePercent::new(volume);
        self
    }

    /// Set the initial loop mode.
    #[must_use]
    pub const fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Set the initial shuffle flag.
    #[must_use]
    pub const fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Check cross-field constraints.
    ///
    /// The PWM path services one interrupt per sample and is limited to
    /// 48 kHz.
    pub const fn validate(&self) -> Result<(), AudioError> {
        match (self.profile, self.sample_rate) {
            (AudioProfile::Pwm, SampleRate::Hz96000) => Err(AudioError::Configuration),
            _ => Ok(()),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::new()
    }
}
