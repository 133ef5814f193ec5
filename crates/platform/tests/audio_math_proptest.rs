//! Property-based tests for audio domain math.
//! Verifies invariants hold for ALL valid inputs, not just fixed examples.

#![allow(clippy::arithmetic_side_effects)]

use platform::audio_types::{SampleRate, VolumeCode, VolumePercent};

proptest::proptest! {
    /// VolumePercent::new never panics for any u8 input (clamps to 100).
    #[test]
    fn volume_percent_new_never_exceeds_100(pct in 0u8..=255u8) {
        let v = VolumePercent::new(pct);
        assert!(v.get() <= 100);
        if pct > 100 {
            assert_eq!(v.get(), 100);
        } else {
            assert_eq!(v.get(), pct);
        }
    }

    /// The volume code is round(v × 127 / 100) for every v in range.
    #[test]
    fn volume_code_is_rounded_linear_map(pct in 0u8..=100u8) {
        let code = VolumeCode::from_volume(VolumePercent::new(pct)).level();
        let exact = f64::from(pct) * 127.0 / 100.0;
        let expected = (exact + 0.5).floor();
        assert_eq!(f64::from(code), expected, "volume {} → code {}", pct, code);
        assert!(code <= 127);
    }

    /// Higher volume → higher or equal code.
    #[test]
    fn volume_code_is_monotone(a in 0u8..=100u8, b in 0u8..=100u8) {
        let ca = VolumeCode::from_volume(VolumePercent::new(a)).level();
        let cb = VolumeCode::from_volume(VolumePercent::new(b)).level();
        if a <= b {
            assert!(ca <= cb, "volume {} → {} but volume {} → {}", a, ca, b, cb);
        }
    }

    /// SampleRate::from_hz never panics and accepts only the recognized rates.
    #[test]
    fn sample_rate_from_hz_accepts_only_known(hz in 0u32..=u32::MAX) {
        match SampleRate::from_hz(hz) {
            Ok(rate) => assert_eq!(rate.hz(), hz),
            Err(_) => assert!(![44_100, 48_000, 96_000].contains(&hz)),
        }
    }
}
