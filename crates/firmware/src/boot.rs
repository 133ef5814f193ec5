//! Clock tree bring-up for the STM32F407 audio board.
//!
//! Initialization order (must be respected):
//!   1. HSI on and ready (it is the PLL source)
//!   2. Flash wait states for 168 MHz, prefetch and caches on
//!   3. Bus prescalers: AHB /1, APB1 /4, APB2 /2
//!   4. PLL from HSI (M=16, N=336, P=2, Q=7), wait for lock
//!   5. Switch SYSCLK to the PLL, wait for the switch to be reported
//!
//! Raising the wait states before the switch keeps flash reads valid at every
//! intermediate frequency. Every wait is bounded; a stuck ready flag is
//! reported as a [`BootError`] instead of hanging the core.

use platform::clock_config::{FLASH_WAIT_STATES, PLL_M, PLL_N, PLL_P, PLL_Q};
use platform::RegisterAccess;

use crate::regs::rcc::{apb1, cfgr, cr, flash_acr, offset, pllcfgr};
use crate::regs::RccRegs;

/// Ordered list of clock bring-up steps, for documentation and testing.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. HSI: enable and wait for HSIRDY",
    "2. Flash: 5 wait states, prefetch, I-cache, D-cache",
    "3. Prescalers: AHB /1, APB1 /4 (42 MHz), APB2 /2 (84 MHz)",
    "4. PLL: HSI/16*336/2 = 168 MHz, wait for PLLRDY",
    "5. SYSCLK: switch to PLL, wait for SWS",
];

/// Polling bound for each ready flag.
pub const DEFAULT_TIMEOUT_LOOPS: u32 = 100_000;

/// Clock bring-up failure: which ready flag never appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootError {
    /// HSIRDY stayed clear
    HsiTimeout,
    /// PLLRDY stayed clear
    PllTimeout,
    /// SWS never reported the PLL
    SwitchTimeout,
}

impl core::fmt::Display for BootError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HsiTimeout => f.write_str("HSI did not become ready"),
            Self::PllTimeout => f.write_str("PLL did not lock"),
            Self::SwitchTimeout => f.write_str("system clock switch to PLL not confirmed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BootError {}

/// PLLCFGR value for the board clock tree.
pub const fn pll_config() -> u32 {
    pllcfgr::hsi(PLL_M, PLL_N, PLL_P, PLL_Q)
}

fn wait_for(mut ready: impl FnMut() -> bool, loops: u32, error: BootError) -> Result<(), BootError> {
    for _ in 0..loops.max(1) {
        if ready() {
            return Ok(());
        }
    }
    Err(error)
}

/// Bring the core to 168 MHz with APB1 at 42 MHz.
///
/// `flash` is the flash interface register block (ACR at offset 0).
pub fn configure_clock_tree<R: RegisterAccess, F: RegisterAccess>(
    rcc: &RccRegs<R>,
    flash: &F,
    timeout_loops: u32,
) -> Result<(), BootError> {
    let regs = rcc.raw();

    regs.set_bits(offset::CR, cr::HSION);
    wait_for(|| regs.bits_set(offset::CR, cr::HSIRDY), timeout_loops, BootError::HsiTimeout)?;

    rcc.enable_apb1(apb1::PWREN);

    flash.modify(flash_acr::OFFSET, |v| {
        (v & !flash_acr::LATENCY_MASK)
            | u32::from(FLASH_WAIT_STATES)
            | flash_acr::PRFTEN
            | flash_acr::ICEN
            | flash_acr::DCEN
    });

    // HPRE (bits 7:4) stays 0 for AHB /1.
    regs.modify(offset::CFGR, |v| {
        (v & !(0xF << 4) & !(0b111 << 10) & !(0b111 << 13)) | cfgr::PPRE1_DIV4 | cfgr::PPRE2_DIV2
    });

    regs.clear_bits(offset::CR, cr::PLLON);
    regs.write(offset::PLLCFGR, pll_config());
    regs.set_bits(offset::CR, cr::PLLON);
    wait_for(|| regs.bits_set(offset::CR, cr::PLLRDY), timeout_loops, BootError::PllTimeout)?;

    regs.modify(offset::CFGR, |v| (v & !cfgr::SW_MASK) | cfgr::SW_PLL);
    wait_for(
        || (regs.read(offset::CFGR) >> cfgr::SWS_SHIFT) & cfgr::SW_MASK == cfgr::SW_PLL,
        timeout_loops,
        BootError::SwitchTimeout,
    )?;

    #[cfg(feature = "defmt")]
    defmt::info!("clock tree up: SYSCLK 168 MHz, APB1 42 MHz");
    Ok(())
}
