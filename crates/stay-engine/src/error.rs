//! Error types for reconciliation.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Network, timeout or HTTP-level failure. That source is left out of the run.
    #[error("Fetch failed for {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    /// The payload is not readable as a calendar container.
    #[error("Unreadable payload from {source_id}: {message}")]
    Parse { source_id: String, message: String },

    /// A single record with a missing or inverted date range.
    #[error("Invalid record {uid}: {message}")]
    Validation { uid: String, message: String },

    /// Every source failed and no cached import calendar exists.
    #[error("All {attempted} sources failed and no cached import calendar exists")]
    AggregateFailure { attempted: usize },

    #[error("Empty resolution window: {start} .. {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// Rendering or persisting output failed; nothing was written.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A run for the same calendar is still in progress.
    #[error("Reconciliation already running for {0}")]
    Busy(String),
}

impl From<ics_core::IcsError> for SyncError {
    fn from(err: ics_core::IcsError) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
