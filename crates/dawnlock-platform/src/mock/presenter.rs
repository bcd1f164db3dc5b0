//! Mock dismissal window.

use std::time::Duration;

use super::Shared;
use crate::{Capability, PlatformError, Result, traits::Presenter};

#[derive(Debug)]
struct PresenterState {
    visible: bool,
    overlay_allowed: bool,
    present_count: usize,
    hide_count: usize,
    screen_on: Vec<Duration>,
}

/// Mock [`Presenter`] that counts presentations.
///
/// # Examples
///
/// ```
/// use dawnlock_platform::mock::MockPresenter;
/// use dawnlock_platform::traits::Presenter;
///
/// #[tokio::main]
/// async fn main() -> dawnlock_platform::Result<()> {
///     let (mut presenter, handle) = MockPresenter::new();
///
///     presenter.present().await?;
///     presenter.present().await?;
///
///     assert!(handle.is_visible());
///     assert_eq!(handle.present_count(), 2);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockPresenter {
    state: Shared<PresenterState>,
}

impl MockPresenter {
    pub fn new() -> (Self, MockPresenterHandle) {
        let state = Shared::new(PresenterState {
            visible: false,
            overlay_allowed: true,
            present_count: 0,
            hide_count: 0,
            screen_on: Vec::new(),
        });
        (
            Self {
                state: state.clone(),
            },
            MockPresenterHandle { state },
        )
    }
}

impl Presenter for MockPresenter {
    async fn present(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.overlay_allowed {
            return Err(PlatformError::permission_denied(Capability::Overlay));
        }
        state.visible = true;
        state.present_count += 1;
        Ok(())
    }

    async fn hide(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.visible = false;
        state.hide_count += 1;
        Ok(())
    }

    async fn force_screen_on(&mut self, duration: Duration) -> Result<()> {
        self.state.lock().screen_on.push(duration);
        Ok(())
    }
}

/// Handle for observing and controlling a [`MockPresenter`].
#[derive(Debug, Clone)]
pub struct MockPresenterHandle {
    state: Shared<PresenterState>,
}

impl MockPresenterHandle {
    /// Grant or revoke the draw-over-other-windows capability.
    pub fn set_overlay_allowed(&self, allowed: bool) {
        self.state.lock().overlay_allowed = allowed;
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// Successful `present` calls.
    pub fn present_count(&self) -> usize {
        self.state.lock().present_count
    }

    pub fn hide_count(&self) -> usize {
        self.state.lock().hide_count
    }

    /// Durations passed to `force_screen_on`, oldest first.
    pub fn screen_on_requests(&self) -> Vec<Duration> {
        self.state.lock().screen_on.clone()
    }
}
