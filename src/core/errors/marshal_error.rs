//! Marshalling and unmarshalling error types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A vector value whose length disagrees with the schema dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarshalAnomaly {
    /// Row index within the submitted batch
    pub row: usize,
    /// Vector field name
    pub field: String,
    /// Element count required by the schema
    pub expected: usize,
    /// Element count found on the document
    pub actual: usize,
}

impl fmt::Display for MarshalAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} field '{}' has length {} (expected {})",
            self.row, self.field, self.actual, self.expected
        )
    }
}

fn describe_anomalies(anomalies: &[MarshalAnomaly]) -> String {
    anomalies
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while converting documents into columns
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarshalError {
    #[error("Vector dimension mismatch in {} row(s): {}", .anomalies.len(), describe_anomalies(.anomalies))]
    DimensionMismatch { anomalies: Vec<MarshalAnomaly> },

    #[error("Document row {row} has no value for field '{field}'")]
    MissingFieldValue { row: usize, field: String },

    #[error("Document row {row} field '{field}': expected {expected}, found {found}")]
    ValueTypeMismatch {
        row: usize,
        field: String,
        expected: String,
        found: String,
    },
}

impl MarshalError {
    /// Sorted row indices behind this error
    pub fn offending_rows(&self) -> Vec<usize> {
        match self {
            MarshalError::DimensionMismatch { anomalies } => {
                let mut rows: Vec<usize> = anomalies.iter().map(|a| a.row).collect();
                rows.sort_unstable();
                rows.dedup();
                rows
            }
            MarshalError::MissingFieldValue { row, .. }
            | MarshalError::ValueTypeMismatch { row, .. } => vec![*row],
        }
    }
}

/// Errors raised while rebuilding documents from a column-major result
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnmarshalError {
    #[error("Field '{field}' of type {field_type} cannot receive a {column_type} column")]
    FieldTypeMismatch {
        field: String,
        column_type: String,
        field_type: String,
    },

    #[error("Column '{column}' has {actual} values but the result holds {expected} rows")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{field}' of store type {column_type} has no document mapping")]
    UnsupportedColumnType { field: String, column_type: String },
}
