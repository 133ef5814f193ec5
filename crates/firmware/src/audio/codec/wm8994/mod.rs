//! Wolfson WM8994 audio codec.
//!
//! - [`registers`] holds the register map and the bring-up values.
//! - [`driver`] runs the identify → reset → power-up → interface bring-up
//!   over any [`embedded_hal::i2c::I2c`] bus.

pub mod driver;
pub mod registers;

pub use driver::{CodecError, CodecState, Wm8994};
