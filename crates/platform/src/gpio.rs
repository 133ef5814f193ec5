//! GPIO configuration capability.
//!
//! Pin-level setup (mode, output type, speed, pull, alternate function) is an
//! external collaborator: the audio drivers consume it through
//! [`PinConfigurator`] and never touch GPIO registers themselves.

/// GPIO port letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// GPIOA
    A,
    /// GPIOB
    B,
    /// GPIOC
    C,
    /// GPIOD
    D,
    /// GPIOE
    E,
}

impl Port {
    /// Zero-based port index (A = 0).
    pub const fn index(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
            Self::E => 4,
        }
    }
}

/// One pin: port plus pin number 0–15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    /// Port the pin belongs to.
    pub port: Port,
    /// Pin number within the port (0–15).
    pub number: u8,
}

impl PinId {
    /// Create a pin identifier.
    pub const fn new(port: Port, number: u8) -> Self {
        Self { port, number }
    }
}

/// Pin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Digital input
    Input,
    /// General-purpose output
    Output,
    /// Alternate function `AFn` (0–15)
    Alternate(u8),
    /// Analog
    Analog,
}

/// Output driver type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputType {
    /// Push-pull
    PushPull,
    /// Open-drain (required for the control bus lines)
    OpenDrain,
}

/// Output slew rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// Low speed
    Low,
    /// Medium speed
    Medium,
    /// Fast speed
    Fast,
    /// High speed
    High,
}

/// Internal pull resistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// No pull
    None,
    /// Pull-up
    Up,
    /// Pull-down
    Down,
}

/// Full pin configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// Pin function
    pub mode: PinMode,
    /// Output driver type
    pub output_type: OutputType,
    /// Slew rate
    pub speed: Speed,
    /// Pull resistor
    pub pull: Pull,
}

impl PinConfig {
    /// Alternate function, push-pull, high speed, no pull.
    ///
    /// Used for the audio-data bus and PWM carrier pins.
    pub const fn alternate_push_pull(af: u8) -> Self {
        Self {
            mode: PinMode::Alternate(af),
            output_type: OutputType::PushPull,
            speed: Speed::High,
            pull: Pull::None,
        }
    }

    /// Alternate function, open-drain, high speed, pull-up.
    ///
    /// Used for the control bus SCL/SDA lines.
    pub const fn alternate_open_drain(af: u8) -> Self {
        Self {
            mode: PinMode::Alternate(af),
            output_type: OutputType::OpenDrain,
            speed: Speed::High,
            pull: Pull::Up,
        }
    }

    /// Push-pull output, low speed, no pull.
    pub const fn output() -> Self {
        Self {
            mode: PinMode::Output,
            output_type: OutputType::PushPull,
            speed: Speed::Low,
            pull: Pull::None,
        }
    }
}

/// Logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// Pin configuration capability consumed by the bus drivers.
pub trait PinConfigurator {
    /// Enable the clock of a GPIO port.
    fn enable_port(&mut self, port: Port);

    /// Apply `config` to `pin`.
    fn configure(&mut self, pin: PinId, config: PinConfig);

    /// Drive an output pin.
    fn write(&mut self, pin: PinId, state: PinState);
}

impl<T: PinConfigurator + ?Sized> PinConfigurator for &mut T {
    fn enable_port(&mut self, port: Port) {
        (**self).enable_port(port);
    }

    fn configure(&mut self, pin: PinId, config: PinConfig) {
        (**self).configure(pin, config);
    }

    fn write(&mut self, pin: PinId, state: PinState) {
        (**self).write(pin, state);
    }
}
