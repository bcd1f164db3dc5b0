//! Mock keyguard.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::Shared;
use crate::{Result, traits::LockScreen, types::LockStatus};

#[derive(Debug, Default)]
struct PromptState {
    unlock_requests: usize,
    unlock_on_request: bool,
}

/// Mock [`LockScreen`] driven through a [`MockLockScreenHandle`].
///
/// # Examples
///
/// ```
/// use dawnlock_platform::mock::MockLockScreen;
/// use dawnlock_platform::traits::LockScreen;
/// use dawnlock_platform::types::LockStatus;
///
/// let (screen, handle) = MockLockScreen::new(LockStatus::Locked);
/// let rx = screen.subscribe();
///
/// handle.unlock();
/// assert_eq!(*rx.borrow(), LockStatus::Unlocked);
/// ```
#[derive(Debug)]
pub struct MockLockScreen {
    status_tx: Arc<watch::Sender<LockStatus>>,
    prompt: Shared<PromptState>,
}

impl MockLockScreen {
    /// Create a keyguard in the given initial state.
    pub fn new(initial: LockStatus) -> (Self, MockLockScreenHandle) {
        let (status_tx, _) = watch::channel(initial);
        let status_tx = Arc::new(status_tx);
        let prompt = Shared::new(PromptState::default());

        let screen = Self {
            status_tx: Arc::clone(&status_tx),
            prompt: prompt.clone(),
        };
        let handle = MockLockScreenHandle { status_tx, prompt };

        (screen, handle)
    }
}

impl LockScreen for MockLockScreen {
    fn status(&self) -> LockStatus {
        *self.status_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<LockStatus> {
        self.status_tx.subscribe()
    }

    async fn request_unlock(&mut self) -> Result<()> {
        let unlock = {
            let mut prompt = self.prompt.lock();
            prompt.unlock_requests += 1;
            prompt.unlock_on_request
        };
        debug!(unlock, "Unlock prompt requested");
        if unlock {
            self.status_tx.send_replace(LockStatus::Unlocked);
        }
        Ok(())
    }
}

/// Handle for driving a [`MockLockScreen`].
#[derive(Debug, Clone)]
pub struct MockLockScreenHandle {
    status_tx: Arc<watch::Sender<LockStatus>>,
    prompt: Shared<PromptState>,
}

impl MockLockScreenHandle {
    /// Engage the keyguard.
    pub fn lock(&self) {
        self.status_tx.send_replace(LockStatus::Locked);
    }

    /// Simulate the user unlocking the device.
    pub fn unlock(&self) {
        self.status_tx.send_replace(LockStatus::Unlocked);
    }

    /// Current keyguard state.
    pub fn status(&self) -> LockStatus {
        *self.status_tx.borrow()
    }

    /// Make every unlock prompt succeed immediately.
    pub fn set_unlock_on_request(&self, unlock: bool) {
        self.prompt.lock().unlock_on_request = unlock;
    }

    /// Number of unlock prompts requested.
    pub fn unlock_requests(&self) -> usize {
        self.prompt.lock().unlock_requests
    }
}
