//! Error types for icsview.
//!
//! None of these ever reach a caller of [`crate::parse_occurrences`]; they
//! travel between the primary expander, the fallback scanner and the entry
//! point, which decides what to do with them.

use thiserror::Error;

/// Errors that can occur while expanding a calendar.
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRrule(String),

    #[error("Invalid date/time: {0}")]
    InvalidTime(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for expansion operations.
pub type ExpandResult<T> = Result<T, ExpandError>;
