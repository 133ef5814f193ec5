//! Audio peripheral wiring for the STM32F407 audio board.
//!
//! # Codec path
//!
//! | Function        | Peripheral  | Pin  | AF  |
//! |-----------------|-------------|------|-----|
//! | Control SCL     | I2C1        | PB6  | AF4 |
//! | Control SDA     | I2C1        | PB7  | AF4 |
//! | I2S3 MCLK       | SPI3        | PC7  | AF6 |
//! | I2S3 CK         | SPI3        | PC10 | AF6 |
//! | I2S3 SD         | SPI3        | PC12 | AF6 |
//! | I2S3 WS         | SPI3        | PA4  | AF6 |
//! | Codec power     | GPIO output | PD4  | -   |
//!
//! DMA1 Stream 5, Channel 0 (SPI3_TX), memory → peripheral, 16-bit elements.
//!
//! # PWM path
//!
//! | Function        | Peripheral  | Pin  | AF  |
//! |-----------------|-------------|------|-----|
//! | Carrier output  | TIM2_CH1    | PA0  | AF1 |
//! | Sample tick     | TIM3 update | -    | -   |

use crate::gpio::{PinId, Port};

/// I2C addresses of audio peripherals.
///
/// All addresses are 7-bit (the embedded-hal convention).
pub struct I2cAddresses;

impl I2cAddresses {
    /// WM8994 codec control address (CS/ADDR pin low).
    ///
    /// Wire address: 0x34 (write) / 0x35 (read).
    pub const WM8994_CODEC: u8 = 0x1A;
}

/// Control bus wiring.
pub struct ControlBusPins;

impl ControlBusPins {
    /// Control bus index the codec is on (I2C1).
    pub const CODEC_BUS: u8 = 1;
    /// SCL
    pub const SCL: PinId = PinId::new(Port::B, 6);
    /// SDA
    pub const SDA: PinId = PinId::new(Port::B, 7);
    /// Alternate function for I2C1 on PB6/PB7.
    pub const AF: u8 = 4;
    /// Default bus clock in Hz.
    pub const DEFAULT_CLOCK_HZ: u32 = 100_000;
}

/// Audio-data bus wiring.
pub struct DataBusPins;

impl DataBusPins {
    /// Master clock out.
    pub const MCLK: PinId = PinId::new(Port::C, 7);
    /// Bit clock.
    pub const CK: PinId = PinId::new(Port::C, 10);
    /// Serial data.
    pub const SD: PinId = PinId::new(Port::C, 12);
    /// Word select (left/right clock).
    pub const WS: PinId = PinId::new(Port::A, 4);
    /// Alternate function for SPI3/I2S3 on these pins.
    pub const AF: u8 = 6;
    /// DMA1 stream serving SPI3_TX.
    pub const DMA_STREAM: u8 = 5;
    /// DMA channel selector for SPI3_TX on that stream.
    pub const DMA_CHANNEL: u8 = 0;
    /// NVIC priority of the DMA completion interrupt.
    pub const IRQ_PRIORITY: u8 = 5;
}

/// Codec supply control.
pub struct CodecPowerPin;

impl CodecPowerPin {
    /// Active-high power enable.
    pub const PIN: PinId = PinId::new(Port::D, 4);
}

/// Software PWM wiring.
pub struct PwmPins;

impl PwmPins {
    /// Carrier output (TIM2 channel 1).
    pub const OUT: PinId = PinId::new(Port::A, 0);
    /// Alternate function for TIM2_CH1 on PA0.
    pub const AF: u8 = 1;
    /// Carrier period in timer ticks (auto-reload = period − 1).
    ///
    /// 84 MHz / 21 = 4 MHz carrier. Duty values span 0..=20.
    pub const CARRIER_PERIOD: u16 = 21;
    /// NVIC priority of the sample-tick interrupt (highest).
    pub const IRQ_PRIORITY: u8 = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_address_is_0x1a() {
        assert_eq!(I2cAddresses::WM8994_CODEC, 0x1A);
        assert!(I2cAddresses::WM8994_CODEC < 0x80, "must be a 7-bit address");
    }

    #[test]
    fn control_bus_on_i2c1_pb6_pb7() {
        assert_eq!(ControlBusPins::CODEC_BUS, 1);
        assert_eq!(ControlBusPins::SCL, PinId::new(Port::B, 6));
        assert_eq!(ControlBusPins::SDA, PinId::new(Port::B, 7));
    }

    #[test]
    fn data_bus_pins_share_af6() {
        assert_eq!(DataBusPins::AF, 6);
        assert_eq!(DataBusPins::WS.port, Port::A);
    }

    #[test]
    fn pwm_period_leaves_a_midpoint() {
        assert!(PwmPins::CARRIER_PERIOD > 1);
    }
}
