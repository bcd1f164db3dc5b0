use thiserror::Error;

/// Storage-specific error types for the Dawnlock preference store.
///
/// These errors represent failures in database operations and in decoding
/// persisted values back into their typed form.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded as the requested type
    #[error("Invalid value for {key}: {value:?} is not a valid {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] dawnlock_core::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
