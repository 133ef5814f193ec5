//! Clock divider calculations for the audio buses and the PWM sample timer.
//!
//! Every divider is computed from the bus clocks in
//! [`platform::clock_config`] when a bus is opened and stays fixed until the
//! bus is opened again.
//!
//! # Control bus (I2C v1)
//!
//!   Standard mode (f ≤ 100 kHz):  CCR = pclk / (2 × f)
//!   Fast mode     (f > 100 kHz):  CCR = pclk / (3 × f), F/S = 1, DUTY = 0
//!
//!   TRISE = pclk_MHz × t_rise_max + 1
//!     t_rise_max = 1000 ns (standard) / 300 ns (fast)
//!
//!   At pclk = 42 MHz:
//!     100 kHz → CCR 210, TRISE 43
//!     400 kHz → CCR 35,  TRISE 13
//!
//! # Audio-data bus (I2S, 16-bit stereo)
//!
//!   I2SDIV + ODD / 2 = pclk / (2 × 32 × 2 × Fs)
//!
//!   The divider is kept to the nearest half step:
//!     tmp    = round(pclk / (64 × Fs))
//!     ODD    = tmp & 1
//!     I2SDIV = (tmp − ODD) / 2         (2 ≤ I2SDIV ≤ 255)
//!
//!   At pclk = 42 MHz:
//!     44 100 Hz → I2SDIV 7, ODD 1
//!     48 000 Hz → I2SDIV 7, ODD 0
//!     96 000 Hz → I2SDIV 3, ODD 1
//!
//! # PWM sample timer
//!
//!   ARR = round(timer_clk / Fs) − 1, PSC = 0
//!
//! References:
//! - STM32F407 RM0090 Rev 19, §27.6.8 (I2C_CCR), §27.6.9 (I2C_TRISE)
//! - STM32F407 RM0090 Rev 19, §28.4.4 (I2S clock generator)

use platform::clock_config::{APB1_PCLK_HZ, APB1_TIMER_CLK_HZ};
use platform::SampleRate;

/// Highest standard-mode control bus clock (Hz).
pub const STANDARD_MODE_MAX_HZ: u32 = 100_000;

/// Highest fast-mode control bus clock (Hz).
pub const FAST_MODE_MAX_HZ: u32 = 400_000;

/// Maximum SCL rise time in standard mode (ns).
pub const STANDARD_RISE_NS: u32 = 1000;

/// Maximum SCL rise time in fast mode (ns).
pub const FAST_RISE_NS: u32 = 300;

/// Smallest CCR accepted in standard mode (RM0090 §27.6.8).
pub const CCR_MIN_STANDARD: u16 = 4;

/// Smallest CCR accepted in fast mode.
pub const CCR_MIN_FAST: u16 = 1;

/// Largest value of the 12-bit CCR field.
pub const CCR_MAX: u16 = 0x0FFF;

/// Smallest legal I2SDIV.
pub const I2S_DIV_MIN: u8 = 2;

/// `pclk / (I2S_FRAME_DIVISOR × Fs)` is the I2S divider in half steps.
pub const I2S_FRAME_DIVISOR: u32 = 64;

/// Control bus timing derived from a requested bus clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlBusTiming {
    /// CCR clock-control value
    pub ccr: u16,
    /// Fast-mode select (F/S bit)
    pub fast_mode: bool,
    /// TRISE rise-time compensation
    pub trise: u8,
    /// CR2.FREQ: peripheral clock in MHz
    pub freq_mhz: u8,
}

/// Audio-data bus prescaler derived from a sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sPrescaler {
    /// Linear prescaler I2SDIV
    pub div: u8,
    /// ODD factor bit
    pub odd: bool,
}

impl I2sPrescaler {
    /// Divider in half steps: `2 × I2SDIV + ODD`.
    #[allow(clippy::arithmetic_side_effects)] // ≤ 511
    pub fn half_steps(self) -> u32 {
        u32::from(self.div) * 2 + u32::from(self.odd)
    }
}

/// Compute control bus timing for `clock_hz` on a `pclk_hz` kernel clock.
///
/// Requests above [`FAST_MODE_MAX_HZ`] are treated as fast mode at the
/// requested rate; the CCR floor keeps the divider legal.
#[allow(clippy::arithmetic_side_effects)] // divisors are non-zero after max(1)
pub fn control_bus_timing(pclk_hz: u32, clock_hz: u32) -> ControlBusTiming {
    let clock_hz = clock_hz.max(1);
    let fast_mode = clock_hz > STANDARD_MODE_MAX_HZ;
    let (raw_ccr, ccr_min, rise_ns) = if fast_mode {
        (pclk_hz / (3 * clock_hz), CCR_MIN_FAST, FAST_RISE_NS)
    } else {
        (pclk_hz / (2 * clock_hz), CCR_MIN_STANDARD, STANDARD_RISE_NS)
    };
    let ccr = u16::try_from(raw_ccr).unwrap_or(CCR_MAX).clamp(ccr_min, CCR_MAX);

    let freq_mhz = pclk_hz / 1_000_000;
    let trise = (u64::from(freq_mhz) * u64::from(rise_ns) / 1000) + 1;

    ControlBusTiming {
        ccr,
        fast_mode,
        trise: u8::try_from(trise).unwrap_or(u8::MAX),
        freq_mhz: u8::try_from(freq_mhz).unwrap_or(u8::MAX),
    }
}

/// Compute control bus timing on the board's APB1 clock.
pub fn control_bus_timing_apb1(clock_hz: u32) -> ControlBusTiming {
    control_bus_timing(APB1_PCLK_HZ, clock_hz)
}

/// Compute the I2S prescaler for `rate` on a `pclk_hz` kernel clock.
#[allow(clippy::arithmetic_side_effects)] // sample rates are non-zero constants
pub fn i2s_prescaler(pclk_hz: u32, rate: SampleRate) -> I2sPrescaler {
    let fs = rate.hz();
    // Fixed point with one decimal digit, then round.
    let tmp = ((pclk_hz / I2S_FRAME_DIVISOR) * 10 / fs + 5) / 10;
    let odd = tmp & 1;
    let div = (tmp - odd) / 2;
    let div = u8::try_from(div).unwrap_or(u8::MAX).max(I2S_DIV_MIN);
    I2sPrescaler { div, odd: odd == 1 }
}

/// Compute the I2S prescaler on the board's APB1 clock.
pub fn i2s_prescaler_apb1(rate: SampleRate) -> I2sPrescaler {
    i2s_prescaler(APB1_PCLK_HZ, rate)
}

/// Auto-reload value that makes a timer on `timer_clk_hz` overflow at `rate`.
#[allow(clippy::arithmetic_side_effects)] // rate is non-zero; result ≥ 1 before the −1
pub fn sample_timer_reload(timer_clk_hz: u32, rate: SampleRate) -> u32 {
    let fs = rate.hz();
    let ticks = (timer_clk_hz + fs / 2) / fs;
    ticks.max(1) - 1
}

/// Sample timer auto-reload on the board's APB1 timer clock.
pub fn sample_timer_reload_apb1(rate: SampleRate) -> u32 {
    sample_timer_reload(APB1_TIMER_CLK_HZ, rate)
}
