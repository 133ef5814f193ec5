//! Playback state machine.
//!
//! `PlaybackEngine` is the single source of truth for what should currently be
//! audible. It is `no_std` and allocation-free, and it drives hardware only
//! through the [`AudioOutput`] trait, so the whole state machine runs on the
//! host against [`platform::mocks::MockOutput`].
//!
//! ```text
//!            play                 pause
//!  Stopped ───────► Playing ◄──────────► Paused
//!     ▲               │       resume       │
//!     └───── stop ────┴────────────────────┘
//! ```
//!
//! Track advance (which buffer plays next) belongs to the playlist owner.
//! The engine only reports the track boundary through [`PlaybackEngine::poll`],
//! together with the loop and shuffle settings in force at that moment.

use platform::{AudioError, AudioOutput, LoopMode, PlayerConfig, TrackId, VolumePercent};

use crate::volume;

/// Current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// Nothing audible; position is zero.
    Stopped,
    /// Samples are flowing to the active output.
    Playing,
    /// Sample delivery is suspended; position is preserved.
    Paused,
}

impl PlaybackState {
    /// `true` while a session is open (playing or paused).
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// `true` only while paused. Implies [`is_playing`](Self::is_playing).
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }
}

/// Track-boundary notification returned by [`PlaybackEngine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackEvent {
    /// The buffer played out and the engine is now stopped.
    ///
    /// The playlist owner decides what to load next from `loop_mode` and
    /// `shuffle`.
    TrackFinished {
        /// Track that just ended
        track: TrackId,
        /// Loop mode at the boundary
        loop_mode: LoopMode,
        /// Shuffle flag at the boundary
        shuffle: bool,
    },
    /// Loop mode `One`: the same buffer was re-armed from its first sample.
    TrackRestarted(TrackId),
}

/// Playback state machine over an audio output.
///
/// The loaded buffer is borrowed for `'buf`; it stays borrowed until the
/// engine is dropped or another buffer is loaded, so the owner cannot reuse
/// it while the output may still be reading it.
pub struct PlaybackEngine<'buf, O> {
    output: O,
    state: PlaybackState,
    source: Option<(TrackId, &'buf [i16])>,
    volume: VolumePercent,
    loop_mode: LoopMode,
    shuffle: bool,
}

impl<'buf, O: AudioOutput<'buf>> PlaybackEngine<'buf, O> {
    /// Create a stopped engine with the configured initial settings.
    ///
    /// Does not touch the output; the volume is applied on the first `play`.
    pub fn new(output: O, config: &PlayerConfig) -> Self {
        Self {
            output,
            state: PlaybackState::Stopped,
            source: None,
            volume: config.initial_volume,
            loop_mode: config.loop_mode,
            shuffle: config.shuffle,
        }
    }

    /// Load `samples` as the current track.
    ///
    /// An open session on the previous track is stopped first.
    pub fn load(&mut self, track: TrackId, samples: &'buf [i16]) -> Result<(), AudioError> {
        if self.state.is_playing() {
            self.stop()?;
        }
        self.source = Some((track, samples));
        Ok(())
    }

    /// Start playback of the loaded track.
    ///
    /// Transitions:
    /// - `Stopped → Playing` (from the first sample)
    /// - `Paused  → Playing` (same as [`resume`](Self::resume))
    /// - `Playing → —`       returns `Err(InvalidState)`
    ///
    /// # Errors
    ///
    /// `NoSource` when nothing is loaded (state unchanged), `InvalidState`
    /// when already playing, or the output's own error (state unchanged).
    pub fn play(&mut self) -> Result<(), AudioError> {
        let Some((_, samples)) = self.source else {
            return Err(AudioError::NoSource);
        };
        match self.state {
            PlaybackState::Playing => Err(AudioError::InvalidState),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopped => {
                self.output.set_volume(self.volume)?;
                self.output.start(samples)?;
                self.state = PlaybackState::Playing;
                #[cfg(feature = "defmt")]
                defmt::info!("playback: started, {} samples", samples.len());
                Ok(())
            }
        }
    }

    /// Suspend playback, preserving the position.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless currently `Playing`.
    pub fn pause(&mut self) -> Result<(), AudioError> {
        if self.state != PlaybackState::Playing {
            return Err(AudioError::InvalidState);
        }
        self.output.pause()?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    /// Continue a paused session.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless currently `Paused`.
    pub fn resume(&mut self) -> Result<(), AudioError> {
        if self.state != PlaybackState::Paused {
            return Err(AudioError::InvalidState);
        }
        self.output.resume()?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// End the session and reset the position to zero.
    ///
    /// Stopping an already-stopped engine is a no-op. The engine is
    /// `Stopped` afterwards even when the output reports an error.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        if self.state == PlaybackState::Stopped {
            return Ok(());
        }
        self.state = PlaybackState::Stopped;
        self.output.stop()
    }

    /// Set the volume, clamped to 100. Valid in every state.
    pub fn set_volume(&mut self, volume: u8) -> Result<(), AudioError> {
        self.volume = VolumePercent::new(volume);
        self.output.set_volume(self.volume)
    }

    /// Raise the volume by one step.
    pub fn volume_up(&mut self) -> Result<(), AudioError> {
        self.set_volume(volume::step_up(self.volume).get())
    }

    /// Lower the volume by one step.
    pub fn volume_down(&mut self) -> Result<(), AudioError> {
        self.set_volume(volume::step_down(self.volume).get())
    }

    /// Advance the loop mode off → all → one → off. Takes effect at the next
    /// track boundary.
    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        self.loop_mode = self.loop_mode.next();
        self.loop_mode
    }

    /// Flip shuffle. Takes effect at the next track boundary.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// Check the output for end-of-buffer. Call from the foreground loop.
    ///
    /// Returns `None` while the track is still playing, paused, or stopped.
    pub fn poll(&mut self) -> Result<Option<PlaybackEvent>, AudioError> {
        if self.state != PlaybackState::Playing || !self.output.is_finished() {
            return Ok(None);
        }
        let Some((track, samples)) = self.source else {
            return Ok(None);
        };
        self.state = PlaybackState::Stopped;
        self.output.stop()?;
        if self.loop_mode == LoopMode::One {
            self.output.start(samples)?;
            self.state = PlaybackState::Playing;
            return Ok(Some(PlaybackEvent::TrackRestarted(track)));
        }
        Ok(Some(PlaybackEvent::TrackFinished {
            track,
            loop_mode: self.loop_mode,
            shuffle: self.shuffle,
        }))
    }

    /// Samples delivered in the current session; zero when stopped.
    pub fn position(&self) -> u32 {
        if self.state == PlaybackState::Stopped {
            0
        } else {
            self.output.position()
        }
    }

    /// Current [`PlaybackState`].
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current volume.
    pub fn volume(&self) -> VolumePercent {
        self.volume
    }

    /// Current loop mode.
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Current shuffle flag.
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Identifier of the loaded track.
    pub fn track(&self) -> Option<TrackId> {
        self.source.map(|(track, _)| track)
    }

    /// Borrow the output.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Borrow the output mutably (e.g. to run its interrupt bookkeeping).
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Stop and hand back the output.
    pub fn into_output(mut self) -> O {
        // A failing stop still leaves the output in the caller's hands.
        let _ = self.stop();
        self.output
    }
}
