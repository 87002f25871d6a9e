//! Core ProximaDB ORM error types

use thiserror::Error;

use super::{ConfigError, MarshalError, StoreError, UnmarshalError};

/// Main error type returned by collection operations
#[derive(Debug, Clone, Error)]
pub enum OrmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Marshal error: {0}")]
    Marshal(#[from] MarshalError),

    #[error("Unmarshal error: {0}")]
    Unmarshal(#[from] UnmarshalError),

    #[error("Connection to {address} failed: {message}")]
    Connection { address: String, message: String },

    #[error("Connection to {address} timed out after {timeout_ms}ms")]
    ConnectTimeout { address: String, timeout_ms: u64 },

    #[error("Remote {operation} failed: {source}")]
    Remote {
        operation: &'static str,
        source: StoreError,
    },

    #[error("Remote {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Unsupported primary key type: expected {expected}, found {found}")]
    UnsupportedKeyType { expected: String, found: String },
}

impl OrmError {
    /// Store unreachable, as opposed to a request the store rejected
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            OrmError::Connection { .. } | OrmError::ConnectTimeout { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            OrmError::ConnectTimeout { .. } | OrmError::Timeout { .. }
        )
    }
}
