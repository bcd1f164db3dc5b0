//! Mock exact-trigger service.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use dawnlock_core::TriggerId;
use tracing::debug;

use super::Shared;
use crate::{Capability, PlatformError, Result, traits::ExactTimer};

#[derive(Debug)]
struct TimerState {
    exact_allowed: bool,
    armed: HashMap<TriggerId, DateTime<FixedOffset>>,
    arm_count: usize,
    cancel_count: usize,
}

/// Mock [`ExactTimer`] that records armed triggers instead of firing them.
///
/// Firing is driven by whoever owns the runtime (a test or the simulator),
/// typically by reading [`MockTimerHandle::armed`] and delivering the trigger.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use dawnlock_core::TriggerId;
/// use dawnlock_platform::mock::MockTimer;
/// use dawnlock_platform::traits::ExactTimer;
///
/// #[tokio::main]
/// async fn main() -> dawnlock_platform::Result<()> {
///     let (mut timer, handle) = MockTimer::new();
///     let at = DateTime::parse_from_rfc3339("2025-03-11T07:00:00+01:00").unwrap();
///
///     timer.arm(TriggerId::WAKE, at).await?;
///     assert_eq!(handle.armed(TriggerId::WAKE), Some(at));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTimer {
    state: Shared<TimerState>,
}

impl MockTimer {
    /// Create a mock timer with exact triggers allowed.
    pub fn new() -> (Self, MockTimerHandle) {
        let state = Shared::new(TimerState {
            exact_allowed: true,
            armed: HashMap::new(),
            arm_count: 0,
            cancel_count: 0,
        });
        (
            Self {
                state: state.clone(),
            },
            MockTimerHandle { state },
        )
    }
}

impl ExactTimer for MockTimer {
    fn can_schedule_exact(&self) -> bool {
        self.state.lock().exact_allowed
    }

    async fn arm(&mut self, id: TriggerId, at: DateTime<FixedOffset>) -> Result<()> {
        let mut state = self.state.lock();
        if !state.exact_allowed {
            return Err(PlatformError::permission_denied(Capability::ExactAlarm));
        }
        debug!(trigger = %id, at = %at, "Arming mock trigger");
        state.armed.insert(id, at);
        state.arm_count += 1;
        Ok(())
    }

    async fn cancel(&mut self, id: TriggerId) -> Result<()> {
        let mut state = self.state.lock();
        state.armed.remove(&id);
        state.cancel_count += 1;
        Ok(())
    }

    fn pending(&self, id: TriggerId) -> Option<DateTime<FixedOffset>> {
        self.state.lock().armed.get(&id).copied()
    }
}

/// Handle for observing and controlling a [`MockTimer`].
#[derive(Debug, Clone)]
pub struct MockTimerHandle {
    state: Shared<TimerState>,
}

impl MockTimerHandle {
    /// Grant or revoke the exact-trigger capability.
    pub fn set_exact_allowed(&self, allowed: bool) {
        self.state.lock().exact_allowed = allowed;
    }

    /// Instant `id` is armed for.
    pub fn armed(&self, id: TriggerId) -> Option<DateTime<FixedOffset>> {
        self.state.lock().armed.get(&id).copied()
    }

    /// Remove and return `id` if it is armed at or before `now`.
    ///
    /// Mirrors the host consuming a one-shot trigger when it fires.
    pub fn take_due(&self, id: TriggerId, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let mut state = self.state.lock();
        match state.armed.get(&id) {
            Some(at) if *at <= now => state.armed.remove(&id),
            _ => None,
        }
    }

    /// Number of successful arm calls.
    pub fn arm_count(&self) -> usize {
        self.state.lock().arm_count
    }

    /// Number of cancel calls.
    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancel_count
    }
}
