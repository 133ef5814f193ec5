//! Codec-backed audio path.
//!
//! - `wm8994/` — register map and bring-up driver
//! - [`path`] — [`CodecPath`], the [`platform::AudioOutput`] that combines the
//!   codec with the I2S/DMA data bus

pub mod path;
pub mod wm8994;

pub use path::CodecPath;
pub use wm8994::{CodecError, CodecState, Wm8994};
