//! Board glue: the GPIO configurator and peripheral clock gating.
//!
//! The audio drivers only see [`PinConfigurator`]; [`GpioBank`] is the
//! register-level implementation the hardware binary hands them.

use platform::{Mmio, PinConfig, PinConfigurator, PinId, PinMode, PinState, Port, RegisterAccess};

use crate::bus::ControlBusId;
use crate::regs::gpio::mode;
use crate::regs::rcc::{ahb1, apb1};
use crate::regs::{base, GpioRegs, RccRegs};

/// Ports A–E.
pub const PORT_COUNT: usize = 5;

/// Base address of a GPIO port block.
#[allow(clippy::arithmetic_side_effects)] // index ≤ 4, stride 0x400
pub const fn gpio_base(port: Port) -> usize {
    base::GPIOA + port.index() as usize * base::GPIO_STRIDE
}

/// GPIO ports A–E plus the RCC block that clocks them.
pub struct GpioBank<R> {
    rcc: RccRegs<R>,
    ports: [GpioRegs<R>; PORT_COUNT],
}

impl<R: RegisterAccess> GpioBank<R> {
    /// Wrap the RCC block and one register block per port, A first.
    pub fn new(rcc: R, ports: [R; PORT_COUNT]) -> Self {
        Self {
            rcc: RccRegs::new(rcc),
            ports: ports.map(GpioRegs::new),
        }
    }

    /// RCC block, for enabling the audio peripheral clocks.
    pub fn rcc(&self) -> &RccRegs<R> {
        &self.rcc
    }

    fn port(&self, port: Port) -> Option<&GpioRegs<R>> {
        self.ports.get(usize::from(port.index()))
    }
}

impl GpioBank<Mmio> {
    /// Bank over the on-chip GPIO and RCC blocks.
    ///
    /// # Safety
    ///
    /// The caller must be the only owner of the GPIO ports and of the RCC
    /// enable registers for the lifetime of the bank.
    pub unsafe fn steal() -> Self {
        // SAFETY: fixed RM0090 addresses; exclusivity is the caller's contract.
        unsafe {
            Self::new(
                Mmio::new(base::RCC),
                [Port::A, Port::B, Port::C, Port::D, Port::E].map(|p| Mmio::new(gpio_base(p))),
            )
        }
    }
}

impl<R: RegisterAccess> PinConfigurator for GpioBank<R> {
    fn enable_port(&mut self, port: Port) {
        self.rcc.enable_ahb1(ahb1::gpio(port.index()));
    }

    fn configure(&mut self, pin: PinId, config: PinConfig) {
        let Some(regs) = self.port(pin.port) else {
            return;
        };
        let n = pin.number;
        // AF selection goes in before the pin is switched to alternate mode.
        let mode_bits = match config.mode {
            PinMode::Input => mode::INPUT,
            PinMode::Output => mode::OUTPUT,
            PinMode::Alternate(af) => {
                regs.set_alternate(n, af);
                mode::ALTERNATE
            }
            PinMode::Analog => mode::ANALOG,
        };
        regs.set_output_type(n, config.output_type);
        regs.set_speed(n, config.speed);
        regs.set_pull(n, config.pull);
        regs.set_mode(n, mode_bits);
    }

    fn write(&mut self, pin: PinId, state: PinState) {
        if let Some(regs) = self.port(pin.port) {
            regs.set_level(pin.number, state == PinState::High);
        }
    }
}

/// Clock the peripherals both audio paths use: DMA1, SPI3, TIM2, TIM3 and
/// the codec's control bus.
pub fn enable_audio_clocks<R: RegisterAccess>(rcc: &RccRegs<R>, control_bus: ControlBusId) {
    rcc.enable_ahb1(ahb1::DMA1EN);
    rcc.enable_apb1(apb1::SPI3EN | apb1::TIM2EN | apb1::TIM3EN | control_bus.apb1_enable_bit());
}
