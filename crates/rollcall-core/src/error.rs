//! Core error types for rollcall-core.
//!
//! Each concern carries its own error enum; `CoreError` is the umbrella
//! used at the API surface and by the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for rollcall-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Check-in rejected
    #[error("Check-in error: {0}")]
    Checkin(#[from] crate::ledger::CheckinError),

    /// Timetable mutation rejected
    #[error("Timetable error: {0}")]
    Timetable(#[from] crate::timetable::TimetableError),

    /// Remote sync errors
    #[error("Sync error: {0}")]
    Sync(#[from] crate::sync::SyncError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Local key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Data directory could not be resolved or created
    #[error("Failed to open data directory at {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write failed
    #[error("Failed to write '{key}': {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be encoded
    #[error("Failed to encode '{key}': {source}")]
    EncodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown or malformed configuration key
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
