//! Mock vibration motor.

use dawnlock_core::VibrationPattern;

use super::Shared;
use crate::{PlatformError, Result, traits::Vibrator};

#[derive(Debug, Default)]
struct VibratorState {
    active: Option<VibrationPattern>,
    missing: bool,
    start_count: usize,
    cancel_count: usize,
}

/// Mock [`Vibrator`].
#[derive(Debug)]
pub struct MockVibrator {
    state: Shared<VibratorState>,
}

impl MockVibrator {
    pub fn new() -> (Self, MockVibratorHandle) {
        let state = Shared::new(VibratorState::default());
        (
            Self {
                state: state.clone(),
            },
            MockVibratorHandle { state },
        )
    }
}

impl Vibrator for MockVibrator {
    async fn vibrate(&mut self, pattern: &VibrationPattern) -> Result<()> {
        let mut state = self.state.lock();
        if state.missing {
            return Err(PlatformError::resource_unavailable("vibrator", "no motor"));
        }
        state.active = Some(pattern.clone());
        state.start_count += 1;
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.active = None;
        state.cancel_count += 1;
        Ok(())
    }
}

/// Handle for observing a [`MockVibrator`].
#[derive(Debug, Clone)]
pub struct MockVibratorHandle {
    state: Shared<VibratorState>,
}

impl MockVibratorHandle {
    /// Simulate a host without a vibration motor.
    pub fn set_missing(&self, missing: bool) {
        self.state.lock().missing = missing;
    }

    pub fn is_vibrating(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Pattern currently running.
    pub fn pattern(&self) -> Option<VibrationPattern> {
        self.state.lock().active.clone()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().start_count
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancel_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vibrate_and_cancel() {
        let (mut vibrator, handle) = MockVibrator::new();

        vibrator.vibrate(&VibrationPattern::default()).await.unwrap();
        assert!(handle.is_vibrating());
        assert_eq!(
            handle.pattern().unwrap().timings_ms(),
            &[0, 1_000, 1_000][..]
        );

        vibrator.cancel().await.unwrap();
        assert!(!handle.is_vibrating());
        assert_eq!(handle.start_count(), 1);
        assert_eq!(handle.cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_motor() {
        let (mut vibrator, handle) = MockVibrator::new();
        handle.set_missing(true);

        assert!(vibrator.vibrate(&VibrationPattern::default()).await.is_err());
        assert!(!handle.is_vibrating());
    }
}
