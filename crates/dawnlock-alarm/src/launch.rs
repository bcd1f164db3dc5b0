//! Launch routing through the durable session marker.
//!
//! Every entry path asks [`LaunchRouter::resolve`] where to go, so a session
//! interrupted by process death is always resumed on the dismissal surface.

use dawnlock_storage::{PreferenceStore, Preferences};
use tracing::debug;

use crate::error::AlarmResult;

/// Screen an entry path lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A session is (or was, before process death) ringing.
    Dismissal,
    /// No tag registered yet.
    Onboarding,
    Home,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchRouter;

impl LaunchRouter {
    pub async fn resolve<S: PreferenceStore>(prefs: &Preferences<S>) -> AlarmResult<Route> {
        let route = if prefs.is_ringing().await? {
            Route::Dismissal
        } else if prefs.registered_tag().await?.is_none() {
            Route::Onboarding
        } else {
            Route::Home
        };
        debug!(?route, "Launch routed");
        Ok(route)
    }
}
