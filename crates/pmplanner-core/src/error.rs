//! Core error types for pmplanner-core.
//!
//! Scheduling failures (`Validation`, `CapacityExceeded`, `OverlapConflict`,
//! `NotFound`, `InvariantViolation`) are raised before anything is handed to
//! a store, so an operation that fails never leaves a partial write behind.
//! Storage and configuration failures are wrapped in their own enums.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pmplanner-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed input (end before start, block outside opening hours, ...)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A worker's weekly hour cap would be exceeded
    #[error(
        "Capacity exceeded for worker '{worker}' in week of {week_start}: {hours}h requested, cap is {cap}h"
    )]
    CapacityExceeded {
        worker: String,
        week_start: NaiveDate,
        hours: u32,
        cap: u32,
    },

    /// A worker would be double-booked
    #[error("Overlap conflict for worker '{worker}' with item '{conflicting_item}'")]
    OverlapConflict {
        worker: String,
        conflicting_item: String,
    },

    /// Referenced item or definition is missing, or belongs elsewhere
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A structural rule between records does not hold
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored row could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange {
        start: chrono::NaiveDateTime,
        end: chrono::NaiveDateTime,
    },

    /// Block falls outside the site's opening hours for its weekday
    #[error("Block {start} + {hours}h is outside opening hours on {date}")]
    OutsideOpeningHours {
        date: NaiveDate,
        start: chrono::NaiveDateTime,
        hours: u32,
    },

    /// Item is not in the state the operation requires
    #[error("Item '{id}' is {state}, expected DRAFT")]
    NotDraft { id: String, state: String },

    /// Invalid period
    #[error("Invalid period {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
