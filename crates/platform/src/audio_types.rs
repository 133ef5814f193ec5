//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `VolumePercent`: clamps 0–100 before anything reaches a register
//! - `VolumeCode`: WM8994 output volume encoding, derived from VolumePercent only
//! - `SampleRate`: only the rates the clock tree can derive
//! - `LoopMode` / `TrackId` / `AudioProfile`: playback configuration surface

use crate::error::AudioError;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── VolumePercent ────────────────────────────────────────────────────────────

/// Volume as a percentage, clamped to 0–100.
///
/// Wraps a `u8` with the invariant `0 <= value <= 100`.
/// Construct with [`VolumePercent::new`] (clamping) or
/// [`VolumePercent::try_new`] (fallible, strict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct VolumePercent(u8);

impl VolumePercent {
    /// Full scale.
    pub const MAX: Self = Self(100);

    /// Power-on default volume.
    pub const DEFAULT: Self = Self(70);

    /// Create a `VolumePercent`, clamping values above 100 to 100.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Create a `VolumePercent`, returning an error if `value > 100`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `value > 100`.
    pub fn try_new(value: u8) -> Result<Self, OutOfRangeError> {
        if value > 100 {
            Err(OutOfRangeError {
                value: u32::from(value),
                min: 0,
                max: 100,
            })
        } else {
            Ok(Self(value))
        }
    }

    /// Return the inner volume value (0–100).
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for VolumePercent {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── VolumeCode ───────────────────────────────────────────────────────────────

/// WM8994 output volume register value.
///
/// Bit 7 is the unmute bit, bits 6:0 the linear volume code 0–127.
/// This type can only be constructed from a [`VolumePercent`], so the
/// mapping `round(volume × 127 / 100)` is applied in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct VolumeCode(u8);

impl VolumeCode {
    /// Unmute bit.
    pub const UNMUTE: u8 = 0x80;

    /// Mask of the 7-bit volume field.
    pub const LEVEL_MASK: u8 = 0x7F;

    /// Convert a `VolumePercent` to the hardware volume code.
    ///
    /// - 0%   → code 0
    /// - 50%  → code 64
    /// - 100% → code 127
    #[must_use]
    pub const fn from_volume(vol: VolumePercent) -> Self {
        // (v * 127 + 50) / 100 rounds half up; max 12 750, fits u16.
        #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
        let code = ((vol.get() as u16 * 127 + 50) / 100) as u8;
        Self(code)
    }

    /// The 7-bit level, 0–127.
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Full register value: unmute bit plus level.
    #[must_use]
    pub const fn register_value(self) -> u16 {
        (Self::UNMUTE | (self.0 & Self::LEVEL_MASK)) as u16
    }
}

// ── SampleRate ───────────────────────────────────────────────────────────────

/// Output sample rate.
///
/// Only the rates the audio-data bus prescaler and the codec interface are
/// configured for are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    /// 44.1 kHz (CD)
    #[default]
    Hz44100,
    /// 48 kHz
    Hz48000,
    /// 96 kHz
    Hz96000,
}

impl SampleRate {
    /// Every supported rate, ascending.
    pub const ALL: [Self; 3] = [Self::Hz44100, Self::Hz48000, Self::Hz96000];

    /// Parse a rate in Hz.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Configuration`] for any rate other than
    /// 44 100, 48 000, or 96 000 Hz.
    pub const fn from_hz(hz: u32) -> Result<Self, AudioError> {
        match hz {
            44_100 => Ok(Self::Hz44100),
            48_000 => Ok(Self::Hz48000),
            96_000 => Ok(Self::Hz96000),
            _ => Err(AudioError::Configuration),
        }
    }

    /// Rate in Hz.
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz44100 => 44_100,
            Self::Hz48000 => 48_000,
            Self::Hz96000 => 96_000,
        }
    }
}

// ── LoopMode ─────────────────────────────────────────────────────────────────

/// Repeat behaviour applied at a track boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopMode {
    /// Stop after the last track.
    #[default]
    Off,
    /// Wrap around to the first track.
    All,
    /// Repeat the current track.
    One,
}

impl LoopMode {
    /// Next mode in the cycle off → all → one → off.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

// ── AudioProfile ─────────────────────────────────────────────────────────────

/// Which audio path a device variant is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioProfile {
    /// External WM8994-class codec fed over the audio-data bus.
    #[default]
    Codec,
    /// Software PWM on a single timer pin, for variants without a codec.
    Pwm,
}

// ── TrackId ──────────────────────────────────────────────────────────────────

/// Identifier of the loaded track, assigned by the playlist collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct TrackId(pub u16);
