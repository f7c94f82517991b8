//! Core error types for studytrack-core.
//!
//! Store failures, configuration problems and user-input validation each get
//! their own enum so callers can tell "the write target failed" apart from
//! "the input was rejected before anything was written".

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerMode;

/// Core error type for studytrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence backend errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`RecordStore`](crate::storage::RecordStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the local database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Remote store answered with a non-success status
    #[error("Remote store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Remote store could not be reached
    #[error("Remote store unreachable: {0}")]
    Transport(String),

    /// A stored record could not be decoded
    #[error("Corrupt record '{key}': {message}")]
    Corrupt { key: String, message: String },
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors. Raised before any store call is attempted.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a subject name")]
    MissingSubject,

    #[error("Chapter cannot be empty")]
    EmptyChapter,

    #[error("Enter at least one Short Note or Long Answer Question")]
    NoChecklistItems,

    /// Timer duration outside the allowed range for its mode
    #[error("{mode} duration must be between {min} and {max} minutes (got {minutes})")]
    DurationOutOfRange {
        mode: TimerMode,
        minutes: u32,
        min: u32,
        max: u32,
    },

    #[error("No task with key '{0}'")]
    UnknownTask(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}
