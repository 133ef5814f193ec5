//! Blocking delay by spinning on the core clock.
//!
//! Used for the codec's settle times and the control-bus read gap, where a
//! timer-backed delay would cost a peripheral for a few bring-up waits.

use embedded_hal::delay::DelayNs;
use platform::clock_config::SYSCLK_HZ;

/// Spin delay calibrated to a core clock.
///
/// Waits at least the requested time; interrupts taken during the spin only
/// make it longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusyDelay {
    core_clock_hz: u32,
}

impl BusyDelay {
    /// Delay for a core running at `core_clock_hz`.
    pub const fn new(core_clock_hz: u32) -> Self {
        Self { core_clock_hz }
    }

    /// Core cycles covering `ns`, rounded up.
    pub fn cycles_for_ns(&self, ns: u32) -> u32 {
        let cycles = u64::from(ns)
            .saturating_mul(u64::from(self.core_clock_hz))
            .div_ceil(1_000_000_000);
        u32::try_from(cycles).unwrap_or(u32::MAX)
    }
}

impl Default for BusyDelay {
    fn default() -> Self {
        Self::new(SYSCLK_HZ)
    }
}

impl DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = self.cycles_for_ns(ns);
        if cycles == 0 {
            return;
        }
        #[cfg(feature = "hardware")]
        cortex_m::asm::delay(cycles);
        #[cfg(not(feature = "hardware"))]
        for _ in 0..cycles {
            core::hint::spin_loop();
        }
    }
}
