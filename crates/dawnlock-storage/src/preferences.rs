//! Typed access to the persisted alarm state.
//!
//! [`Preferences`] wraps any [`PreferenceStore`] and exposes one accessor pair
//! per persisted field, so callers never handle raw keys or the `-1` unset
//! sentinel.

use dawnlock_core::constants::{
    KEY_ALARM_ENABLED, KEY_ALARM_HOUR, KEY_ALARM_INTERACTED, KEY_ALARM_MINUTE, KEY_ALARM_RINGING,
    KEY_SAVED_TAG_ID, KEY_SNOOZE_USED, UNSET_TIME_SENTINEL,
};
use dawnlock_core::{AlarmConfig, AlarmTime, SessionFlags, TagId};
use tracing::{debug, warn};

use crate::error::StorageResult;
use crate::repositories::PreferenceStore;

/// Typed view over a [`PreferenceStore`].
#[derive(Debug, Clone)]
pub struct Preferences<S> {
    store: S,
}

impl<S: PreferenceStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying raw store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // AlarmConfig
    // ------------------------------------------------------------------

    /// Saved wake time and enabled flag.
    ///
    /// A half-set or out-of-range hour/minute pair reads as unset.
    pub async fn alarm_config(&self) -> StorageResult<AlarmConfig> {
        let hour = self
            .store
            .get_int(KEY_ALARM_HOUR, UNSET_TIME_SENTINEL)
            .await?;
        let minute = self
            .store
            .get_int(KEY_ALARM_MINUTE, UNSET_TIME_SENTINEL)
            .await?;
        let enabled = self.store.get_bool(KEY_ALARM_ENABLED, false).await?;

        let time = AlarmTime::from_stored(hour, minute);
        if time.is_none() && (hour != UNSET_TIME_SENTINEL || minute != UNSET_TIME_SENTINEL) {
            warn!(hour, minute, "Ignoring inconsistent stored alarm time");
        }

        Ok(AlarmConfig { time, enabled })
    }

    pub async fn save_alarm_config(&self, config: &AlarmConfig) -> StorageResult<()> {
        let (hour, minute) = match config.time {
            Some(t) => (i64::from(t.hour()), i64::from(t.minute())),
            None => (UNSET_TIME_SENTINEL, UNSET_TIME_SENTINEL),
        };
        self.store.set_int(KEY_ALARM_HOUR, hour).await?;
        self.store.set_int(KEY_ALARM_MINUTE, minute).await?;
        self.store.set_bool(KEY_ALARM_ENABLED, config.enabled).await?;
        debug!(?config, "Saved alarm config");
        Ok(())
    }

    pub async fn set_alarm_enabled(&self, enabled: bool) -> StorageResult<()> {
        self.store.set_bool(KEY_ALARM_ENABLED, enabled).await
    }

    // ------------------------------------------------------------------
    // Registered credential
    // ------------------------------------------------------------------

    /// The registered tag, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the stored identifier is not
    /// valid colon-separated hex.
    pub async fn registered_tag(&self) -> StorageResult<Option<TagId>> {
        match self.store.get_string(KEY_SAVED_TAG_ID).await? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => Ok(Some(raw.parse()?)),
        }
    }

    /// Register `tag`, replacing any previous credential.
    pub async fn register_tag(&self, tag: &TagId) -> StorageResult<()> {
        self.store.set_string(KEY_SAVED_TAG_ID, &tag.to_hex()).await
    }

    pub async fn clear_tag(&self) -> StorageResult<()> {
        self.store.remove(KEY_SAVED_TAG_ID).await
    }

    // ------------------------------------------------------------------
    // Session flags
    // ------------------------------------------------------------------

    /// Durable session marker.
    pub async fn is_ringing(&self) -> StorageResult<bool> {
        self.store.get_bool(KEY_ALARM_RINGING, false).await
    }

    pub async fn set_ringing(&self, ringing: bool) -> StorageResult<()> {
        self.store.set_bool(KEY_ALARM_RINGING, ringing).await
    }

    pub async fn interacted(&self) -> StorageResult<bool> {
        self.store.get_bool(KEY_ALARM_INTERACTED, false).await
    }

    pub async fn set_interacted(&self, interacted: bool) -> StorageResult<()> {
        self.store.set_bool(KEY_ALARM_INTERACTED, interacted).await
    }

    pub async fn snooze_used(&self) -> StorageResult<bool> {
        self.store.get_bool(KEY_SNOOZE_USED, false).await
    }

    pub async fn set_snooze_used(&self, used: bool) -> StorageResult<()> {
        self.store.set_bool(KEY_SNOOZE_USED, used).await
    }

    /// Clear `interacted` and `snooze_used` ahead of the next alarm.
    pub async fn reset_dismissal_flags(&self) -> StorageResult<()> {
        self.set_interacted(false).await?;
        self.set_snooze_used(false).await
    }

    pub async fn session_flags(&self) -> StorageResult<SessionFlags> {
        Ok(SessionFlags {
            ringing: self.is_ringing().await?,
            interacted: self.interacted().await?,
            snooze_used: self.snooze_used().await?,
        })
    }
}
