//! Entry point for a fired wake trigger.

use std::time::Duration;

use dawnlock_platform::{AudioOutput, Presenter, Vibrator};
use dawnlock_storage::{PreferenceStore, Preferences};
use tracing::{info, warn};

use crate::config::TriggerTiming;
use crate::error::AlarmResult;
use crate::session::SessionController;

/// Wakes the display, then starts the session.
#[derive(Debug, Clone, Copy)]
pub struct TriggerHandler {
    screen_on: Duration,
}

impl TriggerHandler {
    pub fn new(timing: &TriggerTiming) -> Self {
        Self {
            screen_on: timing.screen_on(),
        }
    }

    /// The screen-on request is best effort and independent of whether the
    /// dismissal surface manages to present.
    pub async fn fire<A, V, P, S>(
        &self,
        session: &mut SessionController<A, V, P>,
        prefs: &Preferences<S>,
    ) -> AlarmResult<()>
    where
        A: AudioOutput,
        V: Vibrator,
        P: Presenter,
        S: PreferenceStore,
    {
        info!("Wake trigger fired");
        if let Err(e) = session.presenter_mut().force_screen_on(self.screen_on).await {
            warn!(error = %e, "Could not force the screen on");
        }
        session.start(prefs).await
    }
}
