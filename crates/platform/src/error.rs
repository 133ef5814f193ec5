//! Caller-facing audio error taxonomy.
//!
//! Driver crates keep precise error types of their own and convert into
//! [`AudioError`] at the [`AudioOutput`](crate::audio::AudioOutput) boundary.
//! Out-of-range volume is not an error: it is clamped by
//! [`VolumePercent`](crate::audio_types::VolumePercent).

/// Audio subsystem errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    /// A hardware status bit never asserted within its polling budget.
    Timeout,
    /// Unsupported selector or rate, or a failed codec bring-up.
    ///
    /// Bring-up failures are permanent for the peripheral instance until the
    /// caller re-runs bring-up.
    Configuration,
    /// The operation is not valid in the current playback state.
    InvalidState,
    /// `play` was requested with no source loaded.
    NoSource,
}

#[cfg(feature = "std")]
impl std::error::Error for AudioError {}

impl core::fmt::Display for AudioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "Hardware did not respond in time"),
            Self::Configuration => write!(f, "Audio hardware configuration error"),
            Self::InvalidState => write!(f, "Operation invalid in current state"),
            Self::NoSource => write!(f, "No audio source loaded"),
        }
    }
}
