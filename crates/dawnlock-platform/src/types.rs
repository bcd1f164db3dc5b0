//! Common types shared across platform service implementations.

use chrono::{DateTime, Utc};
use dawnlock_core::TagId;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Keyguard state reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockStatus {
    /// The device is locked; the dismissal surface shows over the keyguard.
    Locked,
    /// The device is unlocked.
    Unlocked,
}

impl LockStatus {
    /// Whether the keyguard is engaged.
    pub fn is_locked(&self) -> bool {
        matches!(self, LockStatus::Locked)
    }
}

impl From<bool> for LockStatus {
    fn from(locked: bool) -> Self {
        if locked {
            LockStatus::Locked
        } else {
            LockStatus::Unlocked
        }
    }
}

/// A tag read delivered by the [`TagReader`](crate::traits::TagReader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagScan {
    /// Identifier of the scanned tag.
    pub tag_id: TagId,

    /// When the reader observed the tag.
    pub scanned_at: DateTime<Utc>,
}

impl TagScan {
    /// Build a scan from raw UID bytes, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::InvalidData` if the UID length is outside
    /// the ISO 14443 range.
    pub fn from_uid(uid: Vec<u8>) -> Result<Self> {
        Ok(Self {
            tag_id: TagId::from_bytes(uid)?,
            scanned_at: Utc::now(),
        })
    }

    /// Build a scan for an already validated identifier.
    pub fn new(tag_id: TagId) -> Self {
        Self {
            tag_id,
            scanned_at: Utc::now(),
        }
    }
}

/// Observable playback state of an [`AudioOutput`](crate::traits::AudioOutput).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded.
    #[default]
    Stopped,
    /// Sound is audible.
    Playing,
    /// Loaded but silent until resumed.
    Paused,
}
