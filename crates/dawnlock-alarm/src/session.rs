//! Ringing session state machine.
//!
//! The [`SessionController`] exclusively owns the sound, the vibrator and
//! the session timers. Periodic behavior is never a free-running task: the
//! fade-in loop, the watchdog and the one-shot grace resume are timers owned
//! by the controller, surfaced as [`SessionTick`] messages by
//! [`SessionController::next_tick`] and applied by
//! [`SessionController::handle_tick`]. Stopping the session drops every timer,
//! so nothing can fire into a finished session.
//!
//! # States
//!
//! - `Idle`: No session has run yet
//! - `Ringing`: Sound, vibration, fade-in and watchdog active
//! - `Paused`: Grace period after the first unlock, sound paused
//! - `Stopped`: Session over, resources released
//!
//! # Valid Transitions
//!
//! - Idle → Ringing
//! - Ringing → Paused → Ringing (grace resume)
//! - Ringing | Paused → Stopped
//! - Stopped → Ringing (next trigger)
//!
//! # Examples
//!
//! ```
//! use dawnlock_alarm::session::{SessionMachine, SessionState};
//!
//! let mut machine = SessionMachine::new();
//! machine.transition_to(SessionState::Ringing).unwrap();
//! assert!(machine.transition_to(SessionState::Idle).is_err());
//! assert_eq!(machine.current_state(), SessionState::Ringing);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use dawnlock_core::{Error, Result, SessionId, VibrationPattern};
use dawnlock_platform::{AudioOutput, Presenter, Vibrator};
use dawnlock_storage::{PreferenceStore, Preferences};
use serde::{Deserialize, Serialize};
use tokio::time::{self, Duration, Instant, Interval, Sleep};
use tracing::{debug, info, trace, warn};

use crate::config::SessionTiming;
use crate::error::AlarmResult;
use crate::ticker::{next_interval, next_sleep, periodic};

/// Maximum number of state transitions to keep in history.
const MAX_HISTORY_SIZE: usize = 64;

/// States of the ringing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session has started.
    #[default]
    Idle,

    /// Sound and vibration active, volume fading in.
    Ringing,

    /// Grace period: sound paused until the resume timer fires.
    Paused,

    /// Session ended, resources released.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Idle => "Idle",
            SessionState::Ringing => "Ringing",
            SessionState::Paused => "Paused",
            SessionState::Stopped => "Stopped",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check whether a transition to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Idle, Ringing)
                | (Ringing, Paused)
                | (Paused, Ringing)
                | (Ringing, Stopped)
                | (Paused, Stopped)
                | (Stopped, Ringing)
        )
    }

    /// Sound or grace period in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Ringing | SessionState::Paused)
    }
}

/// Record of one state transition.
#[derive(Debug, Clone, Copy)]
pub struct SessionTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub timestamp: Instant,
}

impl SessionTransition {
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time since the transition.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Transition rules and bounded history of the session.
#[derive(Debug)]
pub struct SessionMachine {
    current_state: SessionState,
    state_entered_at: Instant,
    history: VecDeque<SessionTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.current_state
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Transitions recorded so far, oldest first.
    pub fn history(&self) -> &VecDeque<SessionTransition> {
        &self.history
    }

    /// Move to `new_state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] when the rules forbid the
    /// move; the machine is left unchanged.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<SessionTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = SessionTransition::new(self.current_state, new_state);
        self.current_state = new_state;
        self.state_entered_at = transition.timestamp;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// A session timer that elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    /// Raise the volume one step.
    Fade,
    /// Re-present the dismissal surface if nobody interacted.
    Watchdog,
    /// The grace period ended.
    GraceResume,
}

/// Point-in-time view of the session, published by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub state: SessionState,
    pub volume: f32,
    pub audio_acquired: bool,
}

/// Owner of the ringing session.
pub struct SessionController<A, V, P> {
    audio: A,
    vibrator: V,
    presenter: P,
    timing: SessionTiming,
    pattern: VibrationPattern,
    machine: SessionMachine,
    session_id: Option<SessionId>,
    volume: f32,
    audio_acquired: bool,
    grace_used: bool,
    fade: Option<Interval>,
    watchdog: Option<Interval>,
    grace_resume: Option<Pin<Box<Sleep>>>,
}

impl<A, V, P> SessionController<A, V, P>
where
    A: AudioOutput,
    V: Vibrator,
    P: Presenter,
{
    /// Create an idle controller.
    ///
    /// # Errors
    ///
    /// Fails when the configured vibration pattern is invalid.
    pub fn new(audio: A, vibrator: V, presenter: P, timing: SessionTiming) -> AlarmResult<Self> {
        let pattern = timing.vibration_pattern()?;
        Ok(Self {
            audio,
            vibrator,
            presenter,
            volume: timing.initial_volume,
            timing,
            pattern,
            machine: SessionMachine::new(),
            session_id: None,
            audio_acquired: false,
            grace_used: false,
            fade: None,
            watchdog: None,
            grace_resume: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.machine.current_state()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn history(&self) -> &VecDeque<SessionTransition> {
        self.machine.history()
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.state(),
            volume: self.volume,
            audio_acquired: self.audio_acquired,
        }
    }

    /// Enter `Ringing`: durable marker, looped sound, vibration, fade-in,
    /// presentation and watchdog.
    ///
    /// A second call while a session is active is ignored. Sound,
    /// vibration and presentation failures are logged and the session
    /// continues with whatever feedback remains.
    pub async fn start<S: PreferenceStore>(&mut self, prefs: &Preferences<S>) -> AlarmResult<()> {
        if self.is_active() {
            debug!(state = %self.state(), "Session already active, start ignored");
            return Ok(());
        }

        self.machine.transition_to(SessionState::Ringing)?;
        let session_id = SessionId::new();
        self.session_id = Some(session_id);
        self.grace_used = false;
        self.volume = self.timing.initial_volume;
        info!(session = %session_id, "Alarm session started");

        if let Err(e) = prefs.set_ringing(true).await {
            warn!(error = %e, "Failed to persist ringing marker");
        }

        match self.audio.play(true, self.volume).await {
            Ok(()) => {
                self.audio_acquired = true;
                self.fade = Some(periodic(self.timing.fade_interval()));
            }
            Err(e) => {
                warn!(error = %e, "Alarm sound unavailable, continuing with vibration only");
                self.audio_acquired = false;
            }
        }

        if let Err(e) = self.vibrator.vibrate(&self.pattern).await {
            warn!(error = %e, "Vibration failed");
        }

        self.present().await;
        self.watchdog = Some(periodic(self.timing.watchdog_interval()));

        Ok(())
    }

    /// Enter the grace period: halt the fade-in, pause the sound and arm
    /// the one-shot resume timer.
    ///
    /// Honored once per session and only while `Ringing`. Returns whether
    /// the pause was engaged.
    pub async fn pause_for_grace(&mut self) -> AlarmResult<bool> {
        if self.state() != SessionState::Ringing || self.grace_used {
            debug!(state = %self.state(), grace_used = self.grace_used, "Grace pause ignored");
            return Ok(false);
        }

        self.grace_used = true;
        self.fade = None;
        if self.audio.is_playing()
            && let Err(e) = self.audio.pause().await
        {
            warn!(error = %e, "Failed to pause alarm sound");
        }

        self.machine.transition_to(SessionState::Paused)?;
        self.grace_resume = Some(Box::pin(time::sleep(self.timing.grace_period())));
        info!(grace = ?self.timing.grace_period(), "Grace period started");

        Ok(true)
    }

    /// Wait for the next session timer.
    ///
    /// Pending forever when no timer is armed. Cancel-safe.
    pub async fn next_tick(&mut self) -> SessionTick {
        tokio::select! {
            _ = next_interval(self.fade.as_mut()) => SessionTick::Fade,
            _ = next_interval(self.watchdog.as_mut()) => SessionTick::Watchdog,
            _ = next_sleep(self.grace_resume.as_mut()) => SessionTick::GraceResume,
        }
    }

    /// Apply an elapsed timer.
    pub async fn handle_tick<S: PreferenceStore>(
        &mut self,
        tick: SessionTick,
        prefs: &Preferences<S>,
    ) -> AlarmResult<()> {
        if tick == SessionTick::GraceResume {
            self.grace_resume = None;
        }
        if !self.is_active() {
            trace!(?tick, state = %self.state(), "Tick after session end ignored");
            return Ok(());
        }

        match tick {
            SessionTick::Fade => self.fade_step().await,
            SessionTick::Watchdog => {
                if !prefs.interacted().await? {
                    debug!("Watchdog re-presenting dismissal surface");
                    self.present().await;
                }
            }
            SessionTick::GraceResume => self.resume_after_grace().await?,
        }

        Ok(())
    }

    /// The device was unlocked while the session may be active.
    pub async fn on_unlocked<S: PreferenceStore>(&mut self, prefs: &Preferences<S>) -> AlarmResult<()> {
        if self.is_active() && !prefs.interacted().await? {
            debug!("Unlocked without interaction, re-presenting dismissal surface");
            self.present().await;
        }
        Ok(())
    }

    /// Enter `Stopped`: clear the ringing marker, release sound and
    /// vibration, drop every timer.
    ///
    /// Returns `false` when no session was active, in which case nothing is
    /// released a second time.
    pub async fn stop<S: PreferenceStore>(&mut self, prefs: &Preferences<S>) -> AlarmResult<bool> {
        if !self.is_active() {
            debug!(state = %self.state(), "Stop ignored, no active session");
            return Ok(false);
        }

        self.fade = None;
        self.watchdog = None;
        self.grace_resume = None;
        self.machine.transition_to(SessionState::Stopped)?;

        if self.audio_acquired {
            if let Err(e) = self.audio.stop().await {
                warn!(error = %e, "Failed to stop alarm sound");
            }
            self.audio_acquired = false;
        }
        if let Err(e) = self.vibrator.cancel().await {
            warn!(error = %e, "Failed to cancel vibration");
        }

        if let Some(id) = self.session_id {
            info!(session = %id, "Alarm session stopped");
        }
        prefs.set_ringing(false).await?;

        Ok(true)
    }

    async fn fade_step(&mut self) {
        if !self.audio.is_playing() {
            debug!("Sound not playing, fade-in halted");
            self.fade = None;
            return;
        }

        self.volume = (self.volume + self.timing.fade_step).min(self.timing.max_volume);
        trace!(volume = self.volume, "Fade-in step");
        if let Err(e) = self.audio.set_volume(self.volume).await {
            warn!(error = %e, "Failed to raise volume");
        }

        if self.volume >= self.timing.max_volume {
            debug!("Maximum volume reached, fade-in complete");
            self.fade = None;
        }
    }

    async fn resume_after_grace(&mut self) -> AlarmResult<()> {
        if self.state() != SessionState::Paused {
            return Ok(());
        }

        if self.audio_acquired {
            self.volume = self.timing.max_volume;
            if let Err(e) = self.audio.resume(self.volume).await {
                warn!(error = %e, "Failed to resume alarm sound");
            }
        }
        self.machine.transition_to(SessionState::Ringing)?;
        info!(volume = self.volume, "Grace period over, sound resumed");

        Ok(())
    }

    async fn present(&mut self) {
        if let Err(e) = self.presenter.present().await {
            warn!(error = %e, "Failed to present dismissal surface");
        }
    }
}

impl<A, V, P> fmt::Debug for SessionController<A, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.machine.current_state())
            .field("session_id", &self.session_id)
            .field("volume", &self.volume)
            .field("audio_acquired", &self.audio_acquired)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dawnlock_platform::mock::{
        AudioCall, MockAudio, MockAudioHandle, MockPresenter, MockPresenterHandle, MockVibrator,
        MockVibratorHandle,
    };
    use dawnlock_platform::PlaybackState;
    use dawnlock_storage::MemoryPreferenceStore;
    use rstest::rstest;

    type Controller = SessionController<MockAudio, MockVibrator, MockPresenter>;

    struct Fixture {
        session: Controller,
        prefs: Preferences<MemoryPreferenceStore>,
        audio: MockAudioHandle,
        vibrator: MockVibratorHandle,
        presenter: MockPresenterHandle,
    }

    fn fixture() -> Fixture {
        let (audio, audio_handle) = MockAudio::new();
        let (vibrator, vibrator_handle) = MockVibrator::new();
        let (presenter, presenter_handle) = MockPresenter::new();
        let session =
            SessionController::new(audio, vibrator, presenter, SessionTiming::default()).unwrap();
        Fixture {
            session,
            prefs: Preferences::new(MemoryPreferenceStore::new()),
            audio: audio_handle,
            vibrator: vibrator_handle,
            presenter: presenter_handle,
        }
    }

    async fn drive(f: &mut Fixture) -> SessionTick {
        let tick = f.session.next_tick().await;
        f.session.handle_tick(tick, &f.prefs).await.unwrap();
        tick
    }

    #[rstest]
    #[case(SessionState::Idle, SessionState::Ringing, true)]
    #[case(SessionState::Ringing, SessionState::Paused, true)]
    #[case(SessionState::Paused, SessionState::Ringing, true)]
    #[case(SessionState::Paused, SessionState::Stopped, true)]
    #[case(SessionState::Stopped, SessionState::Ringing, true)]
    #[case(SessionState::Idle, SessionState::Stopped, false)]
    #[case(SessionState::Idle, SessionState::Paused, false)]
    #[case(SessionState::Stopped, SessionState::Paused, false)]
    #[case(SessionState::Ringing, SessionState::Idle, false)]
    fn test_transition_rules(
        #[case] from: SessionState,
        #[case] to: SessionState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(&to), allowed);
    }

    #[test]
    fn test_invalid_transition_leaves_machine_unchanged() {
        let mut machine = SessionMachine::new();
        let err = machine.transition_to(SessionState::Paused).unwrap_err();

        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(machine.current_state(), SessionState::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = SessionMachine::new();
        machine.transition_to(SessionState::Ringing).unwrap();
        for _ in 0..MAX_HISTORY_SIZE {
            machine.transition_to(SessionState::Paused).unwrap();
            machine.transition_to(SessionState::Ringing).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        assert_eq!(machine.history().back().unwrap().to, SessionState::Ringing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_acquires_everything() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();

        assert_eq!(f.session.state(), SessionState::Ringing);
        assert!(f.prefs.is_ringing().await.unwrap());
        assert_eq!(
            f.audio.calls(),
            vec![AudioCall::Play {
                looping: true,
                volume: 0.05
            }]
        );
        assert!(f.vibrator.is_vibrating());
        assert_eq!(f.presenter.present_count(), 1);
        assert!(f.session.session_id().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_ignored() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();
        let id = f.session.session_id();
        f.session.start(&f.prefs).await.unwrap();

        assert_eq!(f.session.session_id(), id);
        assert_eq!(f.audio.count(|c| matches!(c, AudioCall::Play { .. })), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_failure_keeps_session_ringing() {
        let mut f = fixture();
        f.audio.set_unavailable(true);

        f.session.start(&f.prefs).await.unwrap();

        assert_eq!(f.session.state(), SessionState::Ringing);
        assert!(f.vibrator.is_vibrating());
        assert_eq!(f.presenter.present_count(), 1);
        assert!(!f.session.snapshot().audio_acquired);
        // Only the watchdog is armed.
        assert_eq!(drive(&mut f).await, SessionTick::Watchdog);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_reaches_max_then_stops() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();
        f.prefs.set_interacted(true).await.unwrap();

        let mut fades = 0;
        while f.session.volume() < 1.0 {
            if drive(&mut f).await == SessionTick::Fade {
                fades += 1;
            }
        }

        assert_eq!(fades, 48);
        assert_eq!(f.audio.volume(), 1.0);
        // The fade loop is gone; only the watchdog keeps ticking.
        for _ in 0..3 {
            assert_eq!(drive(&mut f).await, SessionTick::Watchdog);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_presents_until_interaction() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();

        time::sleep(Duration::from_millis(5_500)).await;
        loop {
            if drive(&mut f).await == SessionTick::Watchdog {
                break;
            }
        }
        assert_eq!(f.presenter.present_count(), 2);

        f.prefs.set_interacted(true).await.unwrap();
        loop {
            if drive(&mut f).await == SessionTick::Watchdog {
                break;
            }
        }
        assert_eq!(f.presenter.present_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_unlocked_presents_when_uninteracted() {
        let mut f = fixture();
        f.session.on_unlocked(&f.prefs).await.unwrap();
        assert_eq!(f.presenter.present_count(), 0);

        f.session.start(&f.prefs).await.unwrap();
        f.session.on_unlocked(&f.prefs).await.unwrap();
        assert_eq!(f.presenter.present_count(), 2);

        f.prefs.set_interacted(true).await.unwrap();
        f.session.on_unlocked(&f.prefs).await.unwrap();
        assert_eq!(f.presenter.present_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_pause_then_resume_at_max() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();
        f.prefs.set_interacted(true).await.unwrap();

        assert!(f.session.pause_for_grace().await.unwrap());
        assert_eq!(f.session.state(), SessionState::Paused);
        assert_eq!(f.audio.playback(), PlaybackState::Paused);

        let start = Instant::now();
        while drive(&mut f).await != SessionTick::GraceResume {}

        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(f.session.state(), SessionState::Ringing);
        assert_eq!(f.audio.playback(), PlaybackState::Playing);
        assert_eq!(f.audio.volume(), 1.0);
        assert!(!f.session.pause_for_grace().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_pause_requires_ringing() {
        let mut f = fixture();
        assert!(!f.session.pause_for_grace().await.unwrap());
        assert_eq!(f.session.state(), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_once() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();

        assert!(f.session.stop(&f.prefs).await.unwrap());
        assert!(!f.session.stop(&f.prefs).await.unwrap());

        assert_eq!(f.session.state(), SessionState::Stopped);
        assert!(!f.prefs.is_ringing().await.unwrap());
        assert_eq!(f.audio.count(|c| *c == AudioCall::Stop), 1);
        assert_eq!(f.vibrator.cancel_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_grace_drops_resume() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();
        f.session.pause_for_grace().await.unwrap();
        f.session.stop(&f.prefs).await.unwrap();

        let next = time::timeout(Duration::from_secs(120), f.session.next_tick()).await;
        assert!(next.is_err());
        assert_eq!(f.audio.count(|c| matches!(c, AudioCall::Resume(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_after_stop_is_ignored() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();
        f.session.stop(&f.prefs).await.unwrap();
        let presents = f.presenter.present_count();

        f.session
            .handle_tick(SessionTick::Watchdog, &f.prefs)
            .await
            .unwrap();
        f.session.handle_tick(SessionTick::Fade, &f.prefs).await.unwrap();

        assert_eq!(f.presenter.present_count(), presents);
        assert_eq!(f.audio.count(|c| matches!(c, AudioCall::SetVolume(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop_opens_new_session() {
        let mut f = fixture();
        f.session.start(&f.prefs).await.unwrap();
        let first = f.session.session_id();
        f.session.stop(&f.prefs).await.unwrap();
        f.session.start(&f.prefs).await.unwrap();

        assert_ne!(f.session.session_id(), first);
        assert_eq!(f.session.volume(), 0.05);
        assert!(f.session.pause_for_grace().await.unwrap());
    }
}
