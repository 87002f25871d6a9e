//! Configuration-related error types
//!
//! Raised while deriving field descriptors and the store schema from a document
//! type, or while loading a client configuration.

use thiserror::Error;

/// Construction-time configuration errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid tag on field '{field}': {message}")]
    InvalidTag { field: String, message: String },

    #[error("Vector field '{field}' has no positive `dimension=N` parameter")]
    MissingDimension { field: String },

    #[error("Invalid parameter on field '{field}': {parameter} = {value}")]
    InvalidParameter {
        field: String,
        parameter: String,
        value: String,
    },

    #[error("Field '{field}' has type {semantic_type} with no store mapping")]
    UnsupportedType {
        field: String,
        semantic_type: String,
    },

    #[error("Expected exactly one primary key, found {count}: {fields:?}")]
    PrimaryKeyCount { count: usize, fields: Vec<String> },

    #[error("Primary key '{field}' must be i64 or String, found {semantic_type}")]
    InvalidPrimaryKeyType {
        field: String,
        semantic_type: String,
    },

    #[error("Only one indexed vector field is supported, found: {fields:?}")]
    MultipleIndexFields { fields: Vec<String> },

    #[error("Collection '{collection}' has no index field to search")]
    NoIndexField { collection: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("TOML parsing error: {0}")]
    TomlParseError(String),

    #[error("Failed to read configuration file {path}: {message}")]
    Io { path: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid_tag(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidTag {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
