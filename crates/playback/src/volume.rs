//! Volume control mapping for the WM8994 codec and the PWM path.
//!
//! The WM8994 output volume registers take a 7-bit linear code plus an
//! unmute bit:
//!
//! | `volume` | Code | Register |
//! |----------|------|----------|
//! | 0%       | 0    | `0x0080` |
//! | 50%      | 64   | `0x00C0` |
//! | 70%      | 89   | `0x00D9` |
//! | 100%     | 127  | `0x00FF` |
//!
//! The PWM path scales samples by `volume / 100` instead; see
//! [`scale_sample`].

use platform::audio_types::{VolumeCode, VolumePercent};

/// Volume change applied by one press of a volume button.
pub const VOLUME_STEP: u8 = 5;

/// Map a [`VolumePercent`] to the WM8994 [`VolumeCode`].
///
/// ```text
/// code = round(volume_percent * 127 / 100)
/// ```
pub fn volume_to_code(volume: VolumePercent) -> VolumeCode {
    VolumeCode::from_volume(volume)
}

/// One step louder, saturating at 100.
pub fn step_up(volume: VolumePercent) -> VolumePercent {
    VolumePercent::new(volume.get().saturating_add(VOLUME_STEP))
}

/// One step quieter, saturating at 0.
pub fn step_down(volume: VolumePercent) -> VolumePercent {
    VolumePercent::new(volume.get().saturating_sub(VOLUME_STEP))
}

/// Scale a sample by `volume / 100`, truncating toward zero.
///
/// The result always fits `i16`: the factor never exceeds 1.
pub fn scale_sample(sample: i16, volume: VolumePercent) -> i16 {
    // |sample| * 100 ≤ 3 276 800, no i32 overflow; division by a non-zero constant.
    #[allow(clippy::arithmetic_side_effects)]
    let scaled = i32::from(sample) * i32::from(volume.get()) / 100;
    i16::try_from(scaled).unwrap_or(if scaled < 0 { i16::MIN } else { i16::MAX })
}
