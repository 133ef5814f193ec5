//! F4 Audio Player Firmware
//!
//! Audio playback firmware for the STM32F407 with a WM8994 codec and a
//! software-PWM fallback output.
//!
//! # Architecture
//!
//! This firmware follows a layered architecture:
//!
//! ```text
//! Application Layer (main.rs: boot, ISRs, demo loop)
//!         ↓
//! Feature Layer (playback crate: state machine, volume mapping)
//!         ↓
//! Audio paths (audio::CodecPath, audio::PwmPath)
//!         ↓
//! Bus drivers (bus::ControlBus, bus::I2sBus) and timers
//!         ↓
//! Typed register blocks (regs) over platform::RegisterAccess
//! ```
//!
//! # Features
//!
//! - `hardware` - Build the STM32F407 binary (cortex-m, defmt-rtt, panic-probe)
//! - `pwm-profile` - Boot the binary on the PWM path instead of the codec
//! - `std` - `std::error::Error` impls and host mocks (for testing)
//! - `defmt` - `defmt::Format` derives and driver logging
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::unused_self)]

pub mod audio;
pub mod board;
pub mod boot;
pub mod bus;
pub mod delay;
pub mod regs;

// Re-export key types
pub use audio::{CodecPath, PwmConfig, PwmPath, PwmShared, Wm8994};
pub use board::GpioBank;
pub use bus::{ControlBus, ControlBusConfig, ControlBusId, I2sBus, I2sBusConfig, StreamFlags};
pub use delay::BusyDelay;
