//! Mock audio output.

use tracing::debug;

use super::Shared;
use crate::{PlatformError, Result, traits::AudioOutput, types::PlaybackState};

/// A call recorded by [`MockAudio`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCall {
    Play { looping: bool, volume: f32 },
    SetVolume(f32),
    Pause,
    Resume(f32),
    Stop,
}

#[derive(Debug, Default)]
struct AudioState {
    playback: PlaybackState,
    volume: f32,
    looping: bool,
    unavailable: bool,
    calls: Vec<AudioCall>,
}

/// Mock [`AudioOutput`] that records every call.
///
/// # Examples
///
/// ```
/// use dawnlock_platform::mock::MockAudio;
/// use dawnlock_platform::traits::AudioOutput;
///
/// #[tokio::main]
/// async fn main() -> dawnlock_platform::Result<()> {
///     let (mut audio, handle) = MockAudio::new();
///
///     audio.play(true, 0.05).await?;
///     audio.set_volume(0.07).await?;
///
///     assert!(handle.is_playing());
///     assert!((handle.volume() - 0.07).abs() < f32::EPSILON);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockAudio {
    state: Shared<AudioState>,
}

impl MockAudio {
    /// Create an idle mock output.
    pub fn new() -> (Self, MockAudioHandle) {
        let state = Shared::new(AudioState::default());
        (
            Self {
                state: state.clone(),
            },
            MockAudioHandle { state },
        )
    }
}

impl AudioOutput for MockAudio {
    async fn play(&mut self, looping: bool, volume: f32) -> Result<()> {
        let mut state = self.state.lock();
        let volume = volume.clamp(0.0, 1.0);
        state.calls.push(AudioCall::Play { looping, volume });
        if state.unavailable {
            return Err(PlatformError::resource_unavailable(
                "audio",
                "alarm sound could not be loaded",
            ));
        }
        debug!(looping, volume, "Mock audio playing");
        state.playback = PlaybackState::Playing;
        state.looping = looping;
        state.volume = volume;
        Ok(())
    }

    async fn set_volume(&mut self, volume: f32) -> Result<()> {
        let mut state = self.state.lock();
        let volume = volume.clamp(0.0, 1.0);
        state.calls.push(AudioCall::SetVolume(volume));
        if state.playback == PlaybackState::Stopped {
            return Err(PlatformError::resource_unavailable("audio", "not playing"));
        }
        state.volume = volume;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(AudioCall::Pause);
        if state.playback == PlaybackState::Playing {
            state.playback = PlaybackState::Paused;
        }
        Ok(())
    }

    async fn resume(&mut self, volume: f32) -> Result<()> {
        let mut state = self.state.lock();
        let volume = volume.clamp(0.0, 1.0);
        state.calls.push(AudioCall::Resume(volume));
        if state.playback == PlaybackState::Stopped {
            return Err(PlatformError::resource_unavailable("audio", "not loaded"));
        }
        state.playback = PlaybackState::Playing;
        state.volume = volume;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(AudioCall::Stop);
        state.playback = PlaybackState::Stopped;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playback == PlaybackState::Playing
    }
}

/// Handle for observing and controlling a [`MockAudio`].
#[derive(Debug, Clone)]
pub struct MockAudioHandle {
    state: Shared<AudioState>,
}

impl MockAudioHandle {
    /// Make subsequent `play` calls fail as if the sound were missing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Current playback state.
    pub fn playback(&self) -> PlaybackState {
        self.state.lock().playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback() == PlaybackState::Playing
    }

    /// Volume of the current (or last) playback.
    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn is_looping(&self) -> bool {
        self.state.lock().looping
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<AudioCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&AudioCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }
}
