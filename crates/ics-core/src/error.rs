//! Error types for iCalendar decoding and encoding.

use thiserror::Error;

/// Errors that can occur while decoding or encoding an iCalendar payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IcsError {
    /// The payload is not a readable calendar container.
    /// Includes the 1-based (unfolded) line number where the error was detected.
    #[error("iCalendar parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A property value could not be interpreted (e.g. an unparsable DATE).
    #[error("Invalid {property} value '{value}'")]
    InvalidValue { property: String, value: String },

    /// A structural error during encoding (e.g. an empty component name).
    #[error("Encoding error: {0}")]
    Encode(String),
}

/// Convenience alias used throughout ics-core.
pub type Result<T> = std::result::Result<T, IcsError>;
