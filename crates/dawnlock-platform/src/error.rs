//! Error types for platform service operations.
//!
//! Platform services are the host capabilities the alarm depends on: exact
//! timers, the lock screen, audio, vibration, the dismissal window and the
//! tag reader. Failures are expected on real hosts (missing permissions,
//! busy audio focus, a powered-off reader) and callers decide per operation
//! whether an error is fatal or only logged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// A host capability that can be withheld by the user or the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Scheduling triggers at an exact wall-clock instant.
    ExactAlarm,
    /// Showing the dismissal surface over other windows.
    Overlay,
    /// Reading NFC tags.
    TagReader,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ExactAlarm => write!(f, "exact alarm"),
            Capability::Overlay => write!(f, "overlay"),
            Capability::TagReader => write!(f, "tag reader"),
        }
    }
}

/// Errors that can occur during platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The host has not granted a required capability.
    #[error("Permission denied: {capability}")]
    PermissionDenied { capability: Capability },

    /// A resource could not be acquired (audio focus, vibrator, window).
    #[error("Resource unavailable: {resource}: {message}")]
    ResourceUnavailable { resource: String, message: String },

    /// Service is not connected or has been shut down.
    #[error("Service disconnected: {service}")]
    Disconnected { service: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this host.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Invalid data received from the host.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// Create a new permission denied error.
    pub fn permission_denied(capability: Capability) -> Self {
        Self::PermissionDenied { capability }
    }

    /// Create a new resource unavailable error.
    pub fn resource_unavailable(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(service: impl Into<String>) -> Self {
        Self::Disconnected {
            service: service.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this error reports a withheld capability.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

impl From<dawnlock_core::Error> for PlatformError {
    fn from(err: dawnlock_core::Error) -> Self {
        Self::invalid_data(err.to_string())
    }
}
