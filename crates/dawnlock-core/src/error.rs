use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Alarm configuration errors
    #[error("Invalid alarm time {hour:02}:{minute:02}")]
    InvalidAlarmTime { hour: i64, minute: i64 },

    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    // Credential errors
    #[error("Invalid tag identifier: {0}")]
    InvalidTagId(String),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid vibration pattern: {0}")]
    InvalidVibrationPattern(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
