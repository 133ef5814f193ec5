//! Hardware Abstraction Layer (HAL) for the F4 audio player
//!
//! This crate provides the capabilities the audio subsystem is built on,
//! enabling development and testing without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: drivers, ISRs, boot)
//!         ↓
//! Feature Layer (playback state machine)
//!         ↓
//! Platform HAL (this crate - traits, newtypes, board constants)
//!         ↓
//! Silicon (memory-mapped registers via `mmio::Mmio`)
//! ```
//!
//! # Capabilities
//!
//! - [`RegisterAccess`] - 32-bit register block access; [`Mmio`] is the only volatile implementation
//! - [`PinConfigurator`] - GPIO mode/pull/alternate-function setup
//! - [`AudioOutput`] - an audio path that plays a borrowed PCM buffer
//!
//! # Features
//!
//! - `std`: Host mocks and `std::error::Error` impls (for testing)
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{AudioError, AudioOutput, VolumePercent};
//!
//! fn quiet<'a, O: AudioOutput<'a>>(out: &mut O) -> Result<(), AudioError> {
//!     out.set_volume(VolumePercent::new(20))
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio;
pub mod audio_config;
pub mod audio_types;
pub mod clock_config;
pub mod config;
pub mod error;
pub mod gpio;
pub mod mmio;

pub mod mocks;

pub use audio::AudioOutput;
pub use audio_types::{
    AudioProfile, LoopMode, OutOfRangeError, SampleRate, TrackId, VolumeCode, VolumePercent,
};
pub use config::PlayerConfig;
pub use error::AudioError;
pub use gpio::{OutputType, PinConfig, PinConfigurator, PinId, PinMode, PinState, Port, Pull, Speed};
pub use mmio::{Mmio, RegisterAccess};
