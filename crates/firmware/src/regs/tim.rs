//! General-purpose timer registers (TIM2–TIM5).

use platform::RegisterAccess;

/// Register offsets.
pub mod offset {
    /// Control register 1
    pub const CR1: usize = 0x00;
    /// DMA/interrupt enable
    pub const DIER: usize = 0x0C;
    /// Status register
    pub const SR: usize = 0x10;
    /// Event generation
    pub const EGR: usize = 0x14;
    /// Capture/compare mode 1
    pub const CCMR1: usize = 0x18;
    /// Capture/compare enable
    pub const CCER: usize = 0x20;
    /// Counter
    pub const CNT: usize = 0x24;
    /// Prescaler
    pub const PSC: usize = 0x28;
    /// Auto-reload
    pub const ARR: usize = 0x2C;
    /// Capture/compare 1
    pub const CCR1: usize = 0x34;
}

/// CR1 bits.
pub mod cr1 {
    /// Counter enable
    pub const CEN: u32 = 1 << 0;
    /// Auto-reload preload enable
    pub const ARPE: u32 = 1 << 7;
}

/// Update interrupt enable (DIER) / flag (SR) / generate (EGR).
pub const UPDATE: u32 = 1 << 0;

/// CCMR1 channel 1 fields.
pub mod ccmr1 {
    /// Output compare 1 preload enable
    pub const OC1PE: u32 = 1 << 3;
    /// Output compare 1 mode: PWM mode 1
    pub const OC1M_PWM1: u32 = 0b110 << 4;
    /// Channel 1 mode fields
    pub const OC1_MASK: u32 = 0xFF;
}

/// CCER channel 1 output enable.
pub const CCER_CC1E: u32 = 1 << 0;

/// One timer.
pub struct TimerRegs<R> {
    regs: R,
}

impl<R: RegisterAccess> TimerRegs<R> {
    /// Wrap a register block.
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Underlying register access.
    pub fn raw(&self) -> &R {
        &self.regs
    }

    /// Give the register access back.
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Program prescaler and auto-reload, then latch them with an update event.
    pub fn set_period(&self, psc: u16, arr: u32) {
        self.regs.write(offset::PSC, u32::from(psc));
        self.regs.write(offset::ARR, arr);
        self.regs.write(offset::EGR, UPDATE);
        self.clear_update();
    }

    /// Channel 1 in PWM mode 1 with preload, output enabled.
    pub fn configure_pwm_ch1(&self) {
        self.regs.modify(offset::CCMR1, |v| {
            (v & !ccmr1::OC1_MASK) | ccmr1::OC1M_PWM1 | ccmr1::OC1PE
        });
        self.regs.set_bits(offset::CCER, CCER_CC1E);
        self.regs.set_bits(offset::CR1, cr1::ARPE);
    }

    /// Channel 1 compare value (duty).
    pub fn set_ccr1(&self, value: u32) {
        self.regs.write(offset::CCR1, value);
    }

    /// Current channel 1 compare value.
    pub fn ccr1(&self) -> u32 {
        self.regs.read(offset::CCR1)
    }

    /// Start or stop the counter.
    pub fn set_running(&self, on: bool) {
        if on {
            self.regs.set_bits(offset::CR1, cr1::CEN);
        } else {
            self.regs.clear_bits(offset::CR1, cr1::CEN);
        }
    }

    /// `true` while the counter runs.
    pub fn is_running(&self) -> bool {
        self.regs.bits_set(offset::CR1, cr1::CEN)
    }

    /// Enable or disable the update interrupt.
    pub fn set_update_interrupt(&self, on: bool) {
        if on {
            self.regs.set_bits(offset::DIER, UPDATE);
        } else {
            self.regs.clear_bits(offset::DIER, UPDATE);
        }
    }

    /// `true` when the update flag is pending.
    pub fn update_pending(&self) -> bool {
        self.regs.bits_set(offset::SR, UPDATE)
    }

    /// Clear the update flag (rc_w0).
    pub fn clear_update(&self) {
        self.regs.write(offset::SR, !UPDATE & 0xFFFF);
    }
}
