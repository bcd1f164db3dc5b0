//! Platform service trait definitions.
//!
//! This module defines the contract between the alarm lifecycle and the host
//! it runs on. Each trait covers one capability: arming exact wall-clock
//! triggers, observing and dismissing the keyguard, playing the alarm sound,
//! driving the vibrator, showing the dismissal window and reading NFC tags.
//! The alarm crate is generic over these traits so mock services (see
//! [`crate::mock`]) and real host bindings are interchangeable.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use dawnlock_core::{TriggerId, VibrationPattern};
use tokio::sync::watch;

use crate::error::Result;
use crate::types::{LockStatus, TagScan};

/// Exact wall-clock trigger service.
///
/// A trigger armed for an instant fires at that instant even when the host
/// is idle. Arming an identity that is already armed replaces the previous
/// instant; there is never more than one pending instant per identity.
pub trait ExactTimer: Send + Sync {
    /// Whether the host currently allows exact triggers.
    ///
    /// Hosts may revoke this at any time; callers check before every arm.
    fn can_schedule_exact(&self) -> bool;

    /// Arm (or re-arm) the trigger `id` for `at`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::PermissionDenied` if exact triggers are not
    /// allowed.
    async fn arm(&mut self, id: TriggerId, at: DateTime<FixedOffset>) -> Result<()>;

    /// Cancel the trigger `id`. Cancelling an unarmed identity succeeds.
    async fn cancel(&mut self, id: TriggerId) -> Result<()>;

    /// The instant `id` is armed for, if any.
    fn pending(&self, id: TriggerId) -> Option<DateTime<FixedOffset>>;
}

/// Keyguard state and unlock requests.
pub trait LockScreen: Send + Sync {
    /// Current keyguard state.
    fn status(&self) -> LockStatus;

    /// Whether the keyguard is currently engaged.
    fn is_locked(&self) -> bool {
        self.status().is_locked()
    }

    /// Subscribe to keyguard changes.
    ///
    /// The receiver observes every transition after the call; the current
    /// value is available immediately through `borrow()`.
    fn subscribe(&self) -> watch::Receiver<LockStatus>;

    /// Ask the host to show its unlock prompt.
    ///
    /// Returns once the request is accepted. A successful unlock is reported
    /// through [`subscribe`](Self::subscribe), never through the return value.
    async fn request_unlock(&mut self) -> Result<()>;
}

/// Looping alarm sound output.
///
/// Volumes are linear in `0.0..=1.0`; implementations clamp out-of-range
/// values.
pub trait AudioOutput: Send + Sync {
    /// Acquire the output and start playback at `volume`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::ResourceUnavailable` if the sound cannot be
    /// loaded or audio focus is refused.
    async fn play(&mut self, looping: bool, volume: f32) -> Result<()>;

    /// Change the volume of the current playback.
    async fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Silence playback, keeping the output acquired.
    async fn pause(&mut self) -> Result<()>;

    /// Restart a paused playback at `volume`.
    async fn resume(&mut self, volume: f32) -> Result<()>;

    /// Stop playback and release the output.
    async fn stop(&mut self) -> Result<()>;

    /// Whether sound is currently audible.
    fn is_playing(&self) -> bool;
}

/// Vibration motor.
pub trait Vibrator: Send + Sync {
    /// Start the waveform described by `pattern`.
    async fn vibrate(&mut self, pattern: &VibrationPattern) -> Result<()>;

    /// Stop any running waveform.
    async fn cancel(&mut self) -> Result<()>;
}

/// Host window that shows the dismissal surface.
pub trait Presenter: Send + Sync {
    /// Bring the dismissal surface to the foreground.
    ///
    /// Presenting while already visible is a no-op on the host side.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::PermissionDenied` if the host refuses to draw
    /// over other windows.
    async fn present(&mut self) -> Result<()>;

    /// Remove the dismissal surface.
    async fn hide(&mut self) -> Result<()>;

    /// Wake the display and keep it on for `duration`.
    async fn force_screen_on(&mut self, duration: Duration) -> Result<()>;
}

/// NFC tag reader.
pub trait TagReader: Send + Sync {
    /// Start delivering tag reads.
    async fn enable(&mut self) -> Result<()>;

    /// Stop delivering tag reads. Tags presented while disabled are dropped.
    async fn disable(&mut self) -> Result<()>;

    /// Whether reads are being delivered.
    fn is_enabled(&self) -> bool;

    /// Wait for the next tag read.
    ///
    /// Cancel-safe: dropping the future before it completes loses no scan.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Disconnected` if the reader has shut down.
    async fn read_tag(&mut self) -> Result<TagScan>;
}

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// [`Clock`] backed by the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}
