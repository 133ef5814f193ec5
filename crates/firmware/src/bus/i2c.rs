//! Polled I2C master for the codec control bus.
//!
//! Implements [`embedded_hal::i2c::I2c`] on the STM32F4 I2C v1 peripheral.
//! Every status poll is bounded by [`ControlBusConfig::timeout_loops`]; a
//! device that never answers produces [`I2cError::Timeout`] instead of a hang,
//! and the bus is released with a STOP condition.
//!
//! # Transaction framing
//!
//! ```text
//! START → addr|W → byte … byte → (START → addr|R → byte … byte/NACK) → STOP
//! ```
//!
//! Adjacent operations of the same direction share one address phase; a
//! change of direction issues a repeated START.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use platform::audio_config::ControlBusPins;
use platform::{PinConfig, PinConfigurator, PinId, Port, RegisterAccess};

use crate::audio::clock_math::{self, ControlBusTiming};
use crate::regs::i2c::{cr1, sr1, sr2};
use crate::regs::{base, I2cRegs};

/// Delay between the register-address write and the value read in
/// [`ControlBus::write_then_read`].
pub const WRITE_READ_GAP_US: u32 = 10;

/// Default poll budget for one status wait.
pub const DEFAULT_TIMEOUT_LOOPS: u32 = 1_000_000;

/// Control bus selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlBusId {
    /// I2C1 on PB6/PB7
    I2c1,
    /// I2C2 on PB10/PB11
    I2c2,
    /// I2C3 on PA8/PC9
    I2c3,
}

impl ControlBusId {
    /// Bus for a 1-based index; `None` when out of range.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::I2c1),
            2 => Some(Self::I2c2),
            3 => Some(Self::I2c3),
            _ => None,
        }
    }

    /// Register block base address.
    pub const fn base_address(self) -> usize {
        match self {
            Self::I2c1 => base::I2C1,
            Self::I2c2 => base::I2C2,
            Self::I2c3 => base::I2C3,
        }
    }

    /// `(SCL, SDA)` pins.
    pub const fn pins(self) -> (PinId, PinId) {
        match self {
            Self::I2c1 => (ControlBusPins::SCL, ControlBusPins::SDA),
            Self::I2c2 => (PinId::new(Port::B, 10), PinId::new(Port::B, 11)),
            Self::I2c3 => (PinId::new(Port::A, 8), PinId::new(Port::C, 9)),
        }
    }

    /// RCC APB1ENR bit for this peripheral.
    pub const fn apb1_enable_bit(self) -> u32 {
        use crate::regs::rcc::apb1;
        match self {
            Self::I2c1 => apb1::I2C1EN,
            Self::I2c2 => apb1::I2C2EN,
            Self::I2c3 => apb1::I2C3EN,
        }
    }
}

/// Control bus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlBusConfig {
    /// SCL frequency in Hz
    pub clock_hz: u32,
    /// Iterations a single status wait may spin before giving up
    pub timeout_loops: u32,
}

impl ControlBusConfig {
    /// Settings for `clock_hz` with the default poll budget.
    pub const fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            timeout_loops: DEFAULT_TIMEOUT_LOOPS,
        }
    }

    /// Override the poll budget.
    pub const fn with_timeout_loops(mut self, loops: u32) -> Self {
        self.timeout_loops = loops;
        self
    }
}

impl Default for ControlBusConfig {
    fn default() -> Self {
        Self::new(ControlBusPins::DEFAULT_CLOCK_HZ)
    }
}

/// Transaction step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cPhase {
    /// Waiting for the bus to go idle or for SB after START
    Start,
    /// Waiting for ADDR after the address byte
    Address,
    /// Waiting for TXE before a data byte
    Transmit,
    /// Waiting for BTF after the last data byte
    ByteTransferFinished,
    /// Waiting for RXNE
    Receive,
}

impl I2cPhase {
    /// Short name for log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Address => "address",
            Self::Transmit => "transmit",
            Self::ByteTransferFinished => "byte transfer finished",
            Self::Receive => "receive",
        }
    }
}

/// Control bus failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// A status flag never asserted within the poll budget
    Timeout(I2cPhase),
    /// The device did not acknowledge
    Nack(NoAcknowledgeSource),
    /// Another master won arbitration
    ArbitrationLost,
    /// Misplaced START or STOP detected
    Bus,
}

impl core::fmt::Display for I2cError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout(phase) => write!(f, "I2C timeout during {}", phase.as_str()),
            Self::Nack(source) => write!(f, "I2C no acknowledge ({source})"),
            Self::ArbitrationLost => f.write_str("I2C arbitration lost"),
            Self::Bus => f.write_str("I2C bus error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for I2cError {}

impl i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Other,
            Self::Nack(source) => ErrorKind::NoAcknowledge(*source),
            Self::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Self::Bus => ErrorKind::Bus,
        }
    }
}

/// Direction of one address phase.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Write,
    Read,
}

/// I2C master on one STM32F4 I2C peripheral.
pub struct ControlBus<R, D> {
    regs: I2cRegs<R>,
    delay: D,
    id: ControlBusId,
    timing: ControlBusTiming,
    timeout_loops: u32,
}

impl<R: RegisterAccess, D: DelayNs> ControlBus<R, D> {
    /// Configure pins and clock timing and enable the peripheral.
    ///
    /// The peripheral clock must already be enabled in RCC.
    pub fn open<P: PinConfigurator>(
        id: ControlBusId,
        regs: R,
        delay: D,
        pins: &mut P,
        config: ControlBusConfig,
    ) -> Self {
        let (scl, sda) = id.pins();
        for pin in [scl, sda] {
            pins.enable_port(pin.port);
            pins.configure(pin, PinConfig::alternate_open_drain(ControlBusPins::AF));
        }

        let regs = I2cRegs::new(regs);
        let timing = clock_math::control_bus_timing_apb1(config.clock_hz);

        // Reset clears a bus left mid-transaction by a previous owner.
        regs.set_cr1(cr1::SWRST);
        regs.clear_cr1(cr1::SWRST | cr1::PE);
        regs.set_freq_mhz(timing.freq_mhz);
        regs.set_timing(timing.ccr, timing.fast_mode, timing.trise);
        regs.set_cr1(cr1::PE | cr1::ENGC | cr1::ACK);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "control bus {} open: {} Hz, CCR {}, TRISE {}",
            id,
            config.clock_hz,
            timing.ccr,
            timing.trise
        );

        Self {
            regs,
            delay,
            id,
            timing,
            timeout_loops: config.timeout_loops.max(1),
        }
    }

    /// Open a bus by 1-based index.
    ///
    /// Returns `None` without touching any hardware when `index` does not
    /// name a bus; `regs_for` is only called for a valid index.
    pub fn open_by_index<P, F>(
        index: u8,
        regs_for: F,
        delay: D,
        pins: &mut P,
        config: ControlBusConfig,
    ) -> Option<Self>
    where
        P: PinConfigurator,
        F: FnOnce(ControlBusId) -> R,
    {
        let id = ControlBusId::from_index(index)?;
        Some(Self::open(id, regs_for(id), delay, pins, config))
    }

    /// Which bus this is.
    pub fn id(&self) -> ControlBusId {
        self.id
    }

    /// Timing programmed at open.
    pub fn timing(&self) -> ControlBusTiming {
        self.timing
    }

    /// `true` while the bus lines are busy.
    pub fn is_busy(&self) -> bool {
        self.regs.sr2() & sr2::BUSY != 0
    }

    /// Write `sub_register`, wait [`WRITE_READ_GAP_US`], then read `read`.
    ///
    /// Two separate transactions, each ending in STOP.
    pub fn write_then_read(
        &mut self,
        address: u8,
        sub_register: &[u8],
        read: &mut [u8],
    ) -> Result<(), I2cError> {
        self.transfer(address, &mut [Operation::Write(sub_register)])?;
        self.delay.delay_us(WRITE_READ_GAP_US);
        self.transfer(address, &mut [Operation::Read(read)])
    }

    /// Disable the peripheral and hand back its parts.
    pub fn release(self) -> (R, D) {
        self.regs.clear_cr1(cr1::PE);
        let Self { regs, delay, .. } = self;
        (regs.into_inner(), delay)
    }

    /// Spin until every bit of `mask` is set in SR1 or an error flag shows.
    fn wait_sr1(&self, mask: u32, phase: I2cPhase) -> Result<(), I2cError> {
        for _ in 0..self.timeout_loops {
            let status = self.regs.sr1();
            if status & sr1::ERRORS != 0 {
                self.regs.clear_sr1(status & sr1::ERRORS);
                return Err(Self::decode_error(status, phase));
            }
            if status & mask == mask {
                return Ok(());
            }
        }
        Err(I2cError::Timeout(phase))
    }

    fn decode_error(status: u32, phase: I2cPhase) -> I2cError {
        if status & sr1::ARLO != 0 {
            I2cError::ArbitrationLost
        } else if status & sr1::AF != 0 {
            let source = if phase == I2cPhase::Address {
                NoAcknowledgeSource::Address
            } else {
                NoAcknowledgeSource::Data
            };
            I2cError::Nack(source)
        } else {
            I2cError::Bus
        }
    }

    fn wait_idle(&self) -> Result<(), I2cError> {
        for _ in 0..self.timeout_loops {
            if !self.is_busy() {
                return Ok(());
            }
        }
        Err(I2cError::Timeout(I2cPhase::Start))
    }

    /// START (or repeated START), address byte, clear ADDR unless asked not to.
    fn address(&self, address: u8, direction: Direction, clear_addr: bool) -> Result<(), I2cError> {
        self.regs.set_cr1(cr1::START);
        self.wait_sr1(sr1::SB, I2cPhase::Start)?;
        let rw = u8::from(direction == Direction::Read);
        self.regs.write_dr((address << 1) | rw);
        self.wait_sr1(sr1::ADDR, I2cPhase::Address)?;
        if clear_addr {
            self.clear_addr();
        }
        Ok(())
    }

    /// SR1 was read by the wait; reading SR2 completes the clear sequence.
    fn clear_addr(&self) {
        let _ = self.regs.sr2();
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), I2cError> {
        for &byte in bytes {
            self.wait_sr1(sr1::TXE, I2cPhase::Transmit)?;
            self.regs.write_dr(byte);
        }
        Ok(())
    }

    /// Receive into `buffer`. `last_run` means no further read follows
    /// without a new address phase, so the final byte is NACKed and
    /// `finish` (STOP or START) is requested in time.
    ///
    /// With three or more bytes left the NACK is armed while byte N-2 sits
    /// in DR and N-1 in the shift register, so it lands on byte N.
    fn read_bytes(&self, buffer: &mut [u8], last_run: bool, finish: u32) -> Result<(), I2cError> {
        let len = buffer.len();
        for (i, slot) in buffer.iter_mut().enumerate() {
            if last_run && i.saturating_add(3) == len {
                self.wait_sr1(sr1::BTF, I2cPhase::Receive)?;
                self.regs.clear_cr1(cr1::ACK);
                *slot = self.regs.read_dr();
                self.wait_sr1(sr1::BTF, I2cPhase::Receive)?;
                self.regs.set_cr1(finish);
            } else if last_run && len < 3 && i.saturating_add(2) == len {
                // Short tail continuing an earlier read: best effort.
                self.wait_sr1(sr1::RXNE, I2cPhase::Receive)?;
                self.regs.clear_cr1(cr1::ACK);
                *slot = self.regs.read_dr();
                self.regs.set_cr1(finish);
            } else {
                self.wait_sr1(sr1::RXNE, I2cPhase::Receive)?;
                *slot = self.regs.read_dr();
            }
        }
        Ok(())
    }

    /// Two-byte read straight after the address phase, ADDR still set.
    ///
    /// POS moves the NACK onto the byte behind the one in DR; both bytes are
    /// in once BTF shows, and `finish` goes out before either is read.
    fn read_pair(&self, buffer: &mut [u8], finish: u32) -> Result<(), I2cError> {
        self.regs.clear_cr1(cr1::ACK);
        self.regs.set_cr1(cr1::POS);
        self.clear_addr();
        self.wait_sr1(sr1::BTF, I2cPhase::Receive)?;
        self.regs.set_cr1(finish);
        for slot in buffer.iter_mut() {
            *slot = self.regs.read_dr();
        }
        self.regs.clear_cr1(cr1::POS);
        Ok(())
    }

    fn transfer(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), I2cError> {
        self.wait_idle()?;
        let result = self.run_operations(address, operations);
        if result.is_err() {
            if !matches!(result, Err(I2cError::ArbitrationLost)) {
                self.regs.set_cr1(cr1::STOP);
            }
            #[cfg(feature = "defmt")]
            if let Err(e) = result {
                defmt::warn!("control bus {}: {} at {=u8:#x}", self.id, e, address);
            }
        }
        self.regs.clear_cr1(cr1::POS);
        self.regs.set_cr1(cr1::ACK);
        result
    }

    fn run_operations(&self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), I2cError> {
        let count = operations.len();
        let mut previous: Option<Direction> = None;
        // STOP ends the transaction unless it already went out with the
        // final NACKed read byte.
        let mut stop_sent = false;

        for index in 0..count {
            let next_direction = operations.get(index.saturating_add(1)).map(direction_of);
            let is_last = index.saturating_add(1) == count;
            let Some(op) = operations.get_mut(index) else {
                break;
            };
            let direction = direction_of(op);
            let new_phase = previous != Some(direction);
            previous = Some(direction);

            match op {
                Operation::Write(bytes) => {
                    if new_phase {
                        self.address(address, Direction::Write, true)?;
                    }
                    self.write_bytes(bytes)?;
                    if next_direction != Some(Direction::Write) {
                        self.wait_sr1(sr1::BTF, I2cPhase::ByteTransferFinished)?;
                    }
                }
                Operation::Read(buffer) => {
                    let last_run = next_direction != Some(Direction::Read);
                    let finish = if is_last { cr1::STOP } else { cr1::START };
                    let len = buffer.len();
                    let single = new_phase && last_run && len == 1;
                    let pair = new_phase && last_run && len == 2;
                    if new_phase {
                        self.regs.set_cr1(cr1::ACK);
                        self.address(address, Direction::Read, !(single || pair))?;
                    }
                    if single {
                        // NACK and STOP/START must be armed before ADDR clears.
                        self.regs.clear_cr1(cr1::ACK);
                        self.clear_addr();
                        self.regs.set_cr1(finish);
                    }
                    if pair {
                        self.read_pair(buffer, finish)?;
                    } else {
                        self.read_bytes(buffer, last_run, finish)?;
                    }
                    if last_run && is_last && len > 0 {
                        stop_sent = true;
                    }
                }
            }
        }

        if !stop_sent {
            self.regs.set_cr1(cr1::STOP);
        }
        Ok(())
    }
}

fn direction_of(op: &Operation<'_>) -> Direction {
    match op {
        Operation::Read(_) => Direction::Read,
        Operation::Write(_) => Direction::Write,
    }
}

impl<R, D> i2c::ErrorType for ControlBus<R, D> {
    type Error = I2cError;
}

impl<R: RegisterAccess, D: DelayNs> i2c::I2c for ControlBus<R, D> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        self.transfer(address, operations)
    }
}
