//! Clock configuration for the STM32F407 audio board.
//!
//! Every divider computed by the audio drivers is derived from the bus clocks
//! documented here. The clock tree itself is brought up by the firmware boot
//! code before any driver is opened.
//!
//! ```text
//! HSI 16 MHz → PLL (M=16, N=336, P=2) → SYSCLK 168 MHz
//!   AHB  /1 → 168 MHz
//!   APB1 /4 →  42 MHz  (I2C1–3, SPI3/I2S3)   timers ×2 → 84 MHz (TIM2, TIM3)
//!   APB2 /2 →  84 MHz
//! ```
//!
//! # Sources
//!
//! - STM32F407 Reference Manual (RM0090): §6.2 (clock tree), §6.3.3 (PLLCFGR)

/// System core clock in Hz.
pub const SYSCLK_HZ: u32 = 168_000_000;

/// APB1 peripheral clock in Hz (control bus and audio-data bus kernel clock).
pub const APB1_PCLK_HZ: u32 = 42_000_000;

/// APB2 peripheral clock in Hz.
pub const APB2_PCLK_HZ: u32 = 84_000_000;

/// APB1 timer clock in Hz.
///
/// With an APB1 prescaler other than 1 the timer kernel clock is doubled.
pub const APB1_TIMER_CLK_HZ: u32 = 84_000_000;

/// Flash wait states required at [`SYSCLK_HZ`] and 3.3 V supply.
pub const FLASH_WAIT_STATES: u8 = 5;

/// PLL input divider (HSI 16 MHz → 1 MHz VCO input).
pub const PLL_M: u32 = 16;

/// PLL multiplier (1 MHz → 336 MHz VCO).
pub const PLL_N: u32 = 336;

/// PLL main output divider (336 MHz → 168 MHz).
pub const PLL_P: u32 = 2;

/// PLL 48 MHz domain divider (336 MHz → 48 MHz).
pub const PLL_Q: u32 = 7;

/// Clock domain a peripheral is fed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// APB1 peripheral clock.
    Apb1,
    /// APB1 timer clock (2 × APB1).
    Apb1Timer,
    /// AHB1 bus clock.
    Ahb1,
}

/// A peripheral and the clock domain its dividers are computed from.
pub struct ClockRequirement {
    /// Short identifier for the peripheral (e.g. `"I2C1"`).
    pub peripheral: &'static str,
    /// The clock domain feeding the peripheral.
    pub required_source: ClockSource,
    /// Frequency the drivers assume for that domain.
    pub assumed_hz: u32,
}

/// Clock assumptions of every audio peripheral.
///
/// Checked by unit tests so a change to the clock tree shows up as a failing
/// divider expectation rather than as a wrong bit rate on the wire.
pub const AUDIO_CLOCK_REQUIREMENTS: &[ClockRequirement] = &[
    ClockRequirement {
        peripheral: "I2C1",
        required_source: ClockSource::Apb1,
        assumed_hz: APB1_PCLK_HZ,
    },
    ClockRequirement {
        peripheral: "SPI3",
        required_source: ClockSource::Apb1,
        assumed_hz: APB1_PCLK_HZ,
    },
    ClockRequirement {
        peripheral: "DMA1",
        required_source: ClockSource::Ahb1,
        assumed_hz: SYSCLK_HZ,
    },
    ClockRequirement {
        peripheral: "TIM2",
        required_source: ClockSource::Apb1Timer,
        assumed_hz: APB1_TIMER_CLK_HZ,
    },
    ClockRequirement {
        peripheral: "TIM3",
        required_source: ClockSource::Apb1Timer,
        assumed_hz: APB1_TIMER_CLK_HZ,
    },
];
