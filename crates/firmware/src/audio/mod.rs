//! Audio output paths.
//!
//! Vertically sliced: one sub-module per output path, plus the shared clock
//! arithmetic and the tone generators used by the demo loop.
//!
//! - `codec/` — WM8994 control driver and [`CodecPath`] (I2S3 + DMA)
//! - `pwm` — [`PwmPath`]: TIM2 carrier, TIM3 sample tick
//!
//! Application code targets [`platform::AudioOutput`]; the concrete path is
//! chosen once at boot from the [`platform::AudioProfile`].

pub mod clock_math;
pub mod codec;
pub mod pwm;
pub mod tone;

pub use codec::{CodecError, CodecPath, CodecState, Wm8994};
pub use pwm::{on_sample_tick, pwm_duty, PwmConfig, PwmPath, PwmShared};
