//! Error types for the alarm lifecycle.

use dawnlock_platform::PlatformError;
use dawnlock_storage::StorageError;

/// Result type alias for alarm operations.
pub type AlarmResult<T> = std::result::Result<T, AlarmError>;

/// Errors surfaced by the alarm lifecycle.
///
/// Only failures the caller can act on reach this type. Sound, vibration and
/// presentation failures are logged where they occur and never propagated,
/// and a wrong tag is a [`TagVerdict`](crate::verification::TagVerdict),
/// not an error.
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    /// The preference store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A platform service failed in a way the caller must handle.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A domain value was invalid.
    #[error(transparent)]
    Domain(#[from] dawnlock_core::Error),

    /// Runtime configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The runtime's event channel closed unexpectedly.
    #[error("Event channel closed: {0}")]
    ChannelClosed(&'static str),
}

impl AlarmError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dawnlock_platform::Capability;

    #[test]
    fn test_platform_error_converts() {
        let err: AlarmError = PlatformError::permission_denied(Capability::Overlay).into();
        assert!(matches!(err, AlarmError::Platform(_)));
        assert_eq!(err.to_string(), "Platform error: Permission denied: overlay");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: AlarmError = dawnlock_core::Error::InvalidTimeFormat("7h".into()).into();
        assert_eq!(err.to_string(), "Invalid time format: 7h");
    }
}
