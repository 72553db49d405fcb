//! Tracker error types

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the scheduler, unlocker and gap analyzer
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid quality rating: {0} (expected 0-5)")]
    InvalidQuality(i32),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate item: {0}")]
    DuplicateItem(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl TrackerError {
    /// Validation failures the caller should report back to the client as-is.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::InvalidQuality(_) | Self::DuplicateItem(_)
        )
    }

    /// Only storage failures are worth retrying, and only by re-reading state first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<TrackerError> for String {
    fn from(err: TrackerError) -> Self {
        err.to_string()
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
