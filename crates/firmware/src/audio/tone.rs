//! Test-tone generators.
//!
//! Fill a caller-owned buffer with one waveform; interleaved frames repeat
//! the same sample on every channel.

use platform::SampleRate;

const TWO_PI: f32 = core::f32::consts::TAU;

/// Fill `buffer` with a full-scale sine at `frequency_hz`.
///
/// `sample[i] = sin(2π · f · i / Fs) × 32767`, with `i` counted in frames.
pub fn sine_wave(buffer: &mut [i16], rate: SampleRate, frequency_hz: f32, channels: usize) {
    let fs = rate.hz() as f32;
    for (frame, samples) in buffer.chunks_mut(channels.max(1)).enumerate() {
        let phase = TWO_PI * frequency_hz * frame as f32 / fs;
        let value = (libm::sinf(phase) * 32767.0) as i16;
        samples.fill(value);
    }
}

/// Fill `buffer` with a full-scale square wave at `frequency_hz`.
///
/// The first half of each period is `i16::MAX`, the second `i16::MIN`.
pub fn square_wave(buffer: &mut [i16], rate: SampleRate, frequency_hz: f32, channels: usize) {
    let fs = rate.hz() as f32;
    for (frame, samples) in buffer.chunks_mut(channels.max(1)).enumerate() {
        let cycles = frequency_hz * frame as f32 / fs;
        let phase = cycles - libm::floorf(cycles);
        samples.fill(if phase < 0.5 { i16::MAX } else { i16::MIN });
    }
}
