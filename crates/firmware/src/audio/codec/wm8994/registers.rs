//! WM8994 register map and bring-up values.
//!
//! Register addresses are 16 bits. On the control bus a register is named by
//! its high address byte only:
//!
//! ```text
//! write:  [addr >> 8] [value >> 8] [value & 0xFF]
//! read:   [addr >> 8]  …10 µs…  → [value >> 8] [value & 0xFF]
//! ```

use platform::audio_config::I2cAddresses;
use platform::{SampleRate, VolumeCode, VolumePercent};

/// 7-bit control bus address.
pub const I2C_ADDR: u8 = I2cAddresses::WM8994_CODEC;

// ── Register addresses ──────────────────────────────────────────────────────

/// Chip identity (read) / software reset (write)
pub const REG_CHIP_ID: u16 = 0x0000;
/// Software reset (write any value)
pub const REG_SOFTWARE_RESET: u16 = 0x0000;
/// Power management 1: bias, VMID
pub const REG_POWER_MANAGEMENT_1: u16 = 0x0001;
/// Power management 2
pub const REG_POWER_MANAGEMENT_2: u16 = 0x0002;
/// Power management 3
pub const REG_POWER_MANAGEMENT_3: u16 = 0x0003;
/// Left output volume
pub const REG_LEFT_OUTPUT_VOLUME: u16 = 0x001C;
/// Right output volume
pub const REG_RIGHT_OUTPUT_VOLUME: u16 = 0x001D;
/// Output mixer 1
pub const REG_OUTPUT_MIXER_1: u16 = 0x002D;
/// Output mixer 2
pub const REG_OUTPUT_MIXER_2: u16 = 0x002E;
/// Audio interface 1: format and word length
pub const REG_AUDIO_INTERFACE_1: u16 = 0x0300;
/// Audio interface 2: rate-dependent clocking
pub const REG_AUDIO_INTERFACE_2: u16 = 0x0301;

// ── Values ──────────────────────────────────────────────────────────────────

/// High byte of [`REG_CHIP_ID`] for the WM8994 family.
pub const CHIP_FAMILY: u8 = 0x89;
/// Value written to [`REG_SOFTWARE_RESET`].
pub const SOFTWARE_RESET: u16 = 0x0000;
/// Bias and VMID enabled.
pub const PM1_BIAS_VMID: u16 = 0x1003;
/// Everything in the block off.
pub const POWER_OFF: u16 = 0x0000;
/// I2S format, 16-bit words.
pub const AIF1_I2S_16BIT: u16 = 0x0000;
/// Interface clocking for 44.1 kHz and 48 kHz.
pub const AIF2_RATE_BASE: u16 = 0x4000;
/// Interface clocking for 96 kHz.
pub const AIF2_RATE_DOUBLE: u16 = 0x8000;
/// DAC routed to the output mixer.
pub const MIXER_DAC_TO_OUTPUT: u16 = 0x0001;

/// Settle time after software reset (ms).
pub const RESET_SETTLE_MS: u32 = 10;
/// Settle time after bias/VMID power-up (ms).
pub const POWER_SETTLE_MS: u32 = 100;
/// Gap between the register pointer write and the value read (µs).
pub const READ_GAP_US: u32 = 10;

/// Audio interface 2 value for `rate`.
pub const fn aif2_for(rate: SampleRate) -> u16 {
    match rate {
        SampleRate::Hz44100 | SampleRate::Hz48000 => AIF2_RATE_BASE,
        SampleRate::Hz96000 => AIF2_RATE_DOUBLE,
    }
}

/// Output volume register value for `volume`: unmute bit plus 7-bit level.
pub const fn volume_register(volume: VolumePercent) -> u16 {
    VolumeCode::from_volume(volume).register_value()
}

/// Bytes sent to write `value` to `reg`.
pub const fn write_frame(reg: u16, value: u16) -> [u8; 3] {
    [register_pointer(reg), (value >> 8) as u8, (value & 0xFF) as u8]
}

/// Byte that selects `reg` before a read.
pub const fn register_pointer(reg: u16) -> u8 {
    (reg >> 8) as u8
}

/// `true` when `chip_id` belongs to the WM8994 family.
pub const fn is_wm8994(chip_id: u16) -> bool {
    (chip_id >> 8) as u8 == CHIP_FAMILY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_frame_is_pointer_then_big_endian_value() {
        assert_eq!(write_frame(REG_POWER_MANAGEMENT_1, 0x1003), [0x00, 0x10, 0x03]);
        assert_eq!(write_frame(REG_AUDIO_INTERFACE_2, 0x4000), [0x03, 0x40, 0x00]);
    }

    #[test]
    fn identity_accepts_whole_family() {
        assert!(is_wm8994(0x8994));
        assert!(is_wm8994(0x8900));
        assert!(is_wm8994(0x89FF));
        assert!(!is_wm8994(0x8800));
        assert!(!is_wm8994(0x0089));
    }

    #[test]
    fn aif2_doubles_at_96k() {
        assert_eq!(aif2_for(SampleRate::Hz44100), 0x4000);
        assert_eq!(aif2_for(SampleRate::Hz48000), 0x4000);
        assert_eq!(aif2_for(SampleRate::Hz96000), 0x8000);
    }

    #[test]
    fn volume_register_has_unmute_bit() {
        assert_eq!(volume_register(VolumePercent::new(0)), 0x0080);
        assert_eq!(volume_register(VolumePercent::new(100)), 0x00FF);
        assert_eq!(volume_register(VolumePercent::DEFAULT), 0x00D9);
    }
}
