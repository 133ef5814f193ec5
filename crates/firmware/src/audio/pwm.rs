//! Software PWM audio path.
//!
//! Two timers cooperate:
//!
//! ```text
//! TIM2 (84 MHz / 21 = 4 MHz carrier) ──CH1──► PA0 ──RC filter──► jack
//!        ▲ CCR1 = duty
//!        │
//! TIM3 update @ Fs ──► on_sample_tick(): next sample → duty
//! ```
//!
//! The foreground only flips flags in [`PwmShared`]; [`on_sample_tick`] does
//! the per-sample work from the TIM3 interrupt and never blocks.

use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicU16, AtomicU32, AtomicU8, Ordering};

use platform::audio_config::PwmPins;
use platform::clock_config::APB1_TIMER_CLK_HZ;
use platform::{
    AudioError, AudioOutput, PinConfig, PinConfigurator, PlayerConfig, RegisterAccess,
    SampleRate, VolumePercent,
};
use playback::volume::scale_sample;

use crate::audio::clock_math;
use crate::regs::TimerRegs;

/// PWM path settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConfig {
    /// Carrier period in timer ticks; duty spans `0..carrier_period`
    pub carrier_period: u16,
    /// Sample tick rate
    pub sample_rate: SampleRate,
    /// Kernel clock of both timers (Hz)
    pub timer_clock_hz: u32,
}

impl PwmConfig {
    /// Board defaults at `sample_rate`.
    pub const fn new(sample_rate: SampleRate) -> Self {
        Self {
            carrier_period: PwmPins::CARRIER_PERIOD,
            sample_rate,
            timer_clock_hz: APB1_TIMER_CLK_HZ,
        }
    }

    /// Board defaults at the player's configured rate.
    pub const fn from_player(config: &PlayerConfig) -> Self {
        Self::new(config.sample_rate)
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self::new(SampleRate::default())
    }
}

/// Duty value for `sample` at `volume` on a carrier of `period` ticks.
///
/// ```text
/// duty = (sample × volume / 100 + 32768) × period / 65536,  clamped to [0, period − 1]
/// ```
///
/// Monotonic in `sample`; `0` maps to the midpoint.
pub fn pwm_duty(sample: i16, volume: VolumePercent, period: u16) -> u16 {
    let Some(max) = period.checked_sub(1) else {
        return 0;
    };
    let scaled = scale_sample(sample, volume);
    let offset = u32::from(u16::from_ne_bytes(scaled.to_ne_bytes()) ^ 0x8000);
    // offset ≤ 65 535, period ≤ 65 535: the product fits u32.
    #[allow(clippy::arithmetic_side_effects)]
    let duty = offset * u32::from(period) / 65_536;
    u16::try_from(duty).unwrap_or(max).min(max)
}

/// Silence: the carrier midpoint.
pub const fn silence_duty(period: u16) -> u16 {
    period / 2
}

/// State shared between the sample-tick interrupt and [`PwmPath`].
///
/// Every field is one atomic word so neither side can observe a torn value.
pub struct PwmShared {
    buffer: AtomicPtr<i16>,
    len: AtomicU32,
    index: AtomicU32,
    playing: AtomicBool,
    paused: AtomicBool,
    finished: AtomicBool,
    volume: AtomicU8,
    period: AtomicU16,
    claimed: AtomicBool,
}

impl PwmShared {
    /// Idle state, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            buffer: AtomicPtr::new(ptr::null_mut()),
            len: AtomicU32::new(0),
            index: AtomicU32::new(0),
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            volume: AtomicU8::new(VolumePercent::DEFAULT.get()),
            period: AtomicU16::new(PwmPins::CARRIER_PERIOD),
            claimed: AtomicBool::new(false),
        }
    }

    /// Samples consumed by the interrupt in the current session.
    pub fn index(&self) -> u32 {
        self.index.load(Ordering::Acquire)
    }

    /// `true` once the interrupt ran past the end of the buffer.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn volume(&self) -> VolumePercent {
        VolumePercent::new(self.volume.load(Ordering::Relaxed))
    }

    fn period(&self) -> u16 {
        self.period.load(Ordering::Relaxed)
    }

    /// Publish a new session. `playing` goes last so the interrupt never
    /// sees it set with a stale buffer.
    fn arm(&self, samples: &[i16]) {
        self.playing.store(false, Ordering::Release);
        self.buffer
            .store(samples.as_ptr().cast_mut(), Ordering::Relaxed);
        self.len
            .store(u32::try_from(samples.len()).unwrap_or(u32::MAX), Ordering::Relaxed);
        self.index.store(0, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);
        self.finished.store(false, Ordering::Relaxed);
        self.playing.store(true, Ordering::Release);
    }

    /// End the session. `playing` goes first so the interrupt stops reading
    /// before the buffer is forgotten.
    fn disarm(&self) {
        self.playing.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Relaxed);
        self.finished.store(false, Ordering::Relaxed);
        self.index.store(0, Ordering::Relaxed);
        self.len.store(0, Ordering::Relaxed);
        self.buffer.store(ptr::null_mut(), Ordering::Release);
    }
}

impl Default for PwmShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample-tick interrupt body.
///
/// Call from the TIM3 handler. Acknowledges the update event, then either
/// writes the next duty value or marks the session finished.
pub fn on_sample_tick<C: RegisterAccess, T: RegisterAccess>(
    shared: &PwmShared,
    carrier: &TimerRegs<C>,
    tick: &TimerRegs<T>,
) {
    tick.clear_update();
    if !shared.playing.load(Ordering::Acquire) || shared.paused.load(Ordering::Acquire) {
        return;
    }
    let index = shared.index.load(Ordering::Relaxed);
    let len = shared.len.load(Ordering::Relaxed);
    let buffer = shared.buffer.load(Ordering::Acquire);
    if index >= len || buffer.is_null() {
        shared.playing.store(false, Ordering::Release);
        shared.finished.store(true, Ordering::Release);
        return;
    }
    // SAFETY: `buffer`/`len` were published by `PwmShared::arm` from a slice
    // borrowed by the owning `PwmPath` for its session; the path clears
    // `playing` before that borrow ends, and this handler runs to completion
    // before the foreground resumes. `index < len`, so the read is in bounds.
    let sample = unsafe { buffer.add(index as usize).read() };
    shared.index.store(index.saturating_add(1), Ordering::Release);
    let duty = pwm_duty(sample, shared.volume(), shared.period());
    carrier.set_ccr1(u32::from(duty));
}

/// [`AudioOutput`] that plays a buffer through the PWM carrier.
///
/// Owns both timers for its lifetime. Dropping it silences the output and
/// stops the sample tick. Leaking it with `mem::forget` keeps `shared`
/// claimed and armed, so the tick interrupt goes on reading the buffer after
/// its borrow ends.
pub struct PwmPath<'buf, 's, C: RegisterAccess, T: RegisterAccess> {
    carrier: TimerRegs<C>,
    tick: TimerRegs<T>,
    shared: &'s PwmShared,
    config: PwmConfig,
    session: Option<&'buf [i16]>,
}

impl<'buf, 's, C: RegisterAccess, T: RegisterAccess> PwmPath<'buf, 's, C, T> {
    /// Configure the output pin and both timers and start the carrier.
    ///
    /// # Errors
    ///
    /// `InvalidState` when another path already owns `shared`.
    pub fn open<P: PinConfigurator>(
        carrier: C,
        tick: T,
        shared: &'s PwmShared,
        pins: &mut P,
        config: PwmConfig,
    ) -> Result<Self, AudioError> {
        if shared.claimed.swap(true, Ordering::AcqRel) {
            return Err(AudioError::InvalidState);
        }
        shared.disarm();
        shared.period.store(config.carrier_period, Ordering::Relaxed);

        pins.enable_port(PwmPins::OUT.port);
        pins.configure(PwmPins::OUT, PinConfig::alternate_push_pull(PwmPins::AF));

        let carrier = TimerRegs::new(carrier);
        carrier.set_period(0, u32::from(config.carrier_period.saturating_sub(1)));
        carrier.configure_pwm_ch1();
        carrier.set_ccr1(u32::from(silence_duty(config.carrier_period)));
        carrier.set_running(true);

        let tick = TimerRegs::new(tick);
        let reload = clock_math::sample_timer_reload(config.timer_clock_hz, config.sample_rate);
        tick.set_period(0, reload);
        tick.set_update_interrupt(true);
        tick.set_running(true);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "PWM path open: period {}, tick ARR {} ({} Hz)",
            config.carrier_period,
            reload,
            config.sample_rate.hz()
        );

        Ok(Self {
            carrier,
            tick,
            shared,
            config,
            session: None,
        })
    }

    /// Settings the path was opened with.
    pub fn config(&self) -> PwmConfig {
        self.config
    }

    /// Length of the loaded buffer in samples; zero when idle.
    pub fn duration(&self) -> u32 {
        self.session
            .map_or(0, |s| u32::try_from(s.len()).unwrap_or(u32::MAX))
    }

    /// Playback time of the current position in milliseconds.
    pub fn elapsed_ms(&self) -> u32 {
        let samples = u64::from(self.shared.index());
        let ms = samples
            .saturating_mul(1000)
            .checked_div(u64::from(self.config.sample_rate.hz()))
            .unwrap_or(0);
        u32::try_from(ms).unwrap_or(u32::MAX)
    }

    /// Stored volume.
    pub fn volume(&self) -> VolumePercent {
        self.shared.volume()
    }

    /// `true` while samples are being output (not paused, not finished).
    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire) && !self.shared.paused.load(Ordering::Acquire)
    }

    /// Current carrier duty value.
    pub fn duty(&self) -> u32 {
        self.carrier.ccr1()
    }

    fn silence(&self) {
        self.carrier
            .set_ccr1(u32::from(silence_duty(self.config.carrier_period)));
    }
}

impl<'buf, C: RegisterAccess, T: RegisterAccess> AudioOutput<'buf> for PwmPath<'buf, '_, C, T> {
    fn start(&mut self, source: &'buf [i16]) -> Result<(), AudioError> {
        if source.is_empty() {
            return Err(AudioError::NoSource);
        }
        self.session = Some(source);
        self.shared.arm(source);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        if self.session.is_none() || self.shared.paused.load(Ordering::Acquire) {
            return Err(AudioError::InvalidState);
        }
        self.shared.paused.store(true, Ordering::Release);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.session.is_none() || !self.shared.paused.load(Ordering::Acquire) {
            return Err(AudioError::InvalidState);
        }
        self.shared.paused.store(false, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.shared.disarm();
        self.session = None;
        self.silence();
        Ok(())
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), AudioError> {
        self.shared.volume.store(volume.get(), Ordering::Relaxed);
        Ok(())
    }

    fn position(&self) -> u32 {
        if self.session.is_some() {
            self.shared.index()
        } else {
            0
        }
    }

    fn is_finished(&self) -> bool {
        self.session.is_some() && self.shared.is_finished()
    }
}

impl<C: RegisterAccess, T: RegisterAccess> Drop for PwmPath<'_, '_, C, T> {
    fn drop(&mut self) {
        self.shared.disarm();
        self.tick.set_update_interrupt(false);
        self.tick.set_running(false);
        self.silence();
        self.shared.claimed.store(false, Ordering::Release);
    }
}
