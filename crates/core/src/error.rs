//! Error kinds shared by the journal, the stores and the settlement engine.

use thiserror::Error;

/// Errors produced by wager storage, replay and settlement.
#[derive(Error, Debug)]
pub enum WagerError {
    /// No data exists for the requested day.
    #[error("no data for day {day}")]
    NotFound {
        /// Start-of-day unix timestamp that was requested.
        day: i64,
    },

    /// An aggregate request (count or day window) cannot be satisfied.
    #[error("insufficient data: {0}")]
    NoDataAccess(String),

    /// A stored payload could not be decoded.
    #[error("parser error: {0}")]
    Parser(String),

    /// Malformed input, e.g. an out-of-range probability.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error reading or writing a store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WagerError {
    /// Returns true for "nothing stored here" errors, as opposed to failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, WagerError>;
