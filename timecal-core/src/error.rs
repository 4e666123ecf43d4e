//! Error types for timecal.

use thiserror::Error;

/// Errors that can occur in timecal operations.
#[derive(Error, Debug)]
pub enum TimecalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Time entry source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("Script failed: {0}")]
    Script(String),

    #[error("Script timed out after {0}s")]
    ScriptTimeout(u64),

    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for timecal operations.
pub type TimecalResult<T> = Result<T, TimecalError>;
