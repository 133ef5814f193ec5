//! Playback control — state machine, volume mapping, profile dispatch
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]

pub mod engine;
pub mod output;
pub mod volume;

pub use engine::{PlaybackEngine, PlaybackEvent, PlaybackState};
pub use output::ProfileOutput;
