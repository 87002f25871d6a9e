//! Remote store error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a remote store implementation
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum StoreError {
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("Connection closed")]
    Closed,
}

impl StoreError {
    /// True for the idempotent "already exists" outcome of create operations.
    ///
    /// Transports that only surface a message are matched on its text.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_)) || self.to_string().contains("already exist")
    }
}

/// Result type for remote store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;
