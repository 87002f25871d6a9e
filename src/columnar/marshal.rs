// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Column Marshalling
//!
//! Converts row-major documents into one column per schema field, in schema order.
//! Vector values whose length differs from the declared dimension are reported as
//! [`MarshalAnomaly`]s and handled according to [`DimensionMismatchPolicy`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::column::{Column, ColumnData};
use crate::core::errors::{MarshalAnomaly, MarshalError};
use crate::schema::{CollectionSchema, Document};

/// What happens to rows whose vector length differs from the schema dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionMismatchPolicy {
    /// Fail the whole batch, nothing is sent
    #[default]
    Reject,
    /// Omit offending rows and insert the rest
    DropRows,
    /// Keep offending rows as they are
    InsertAnyway,
}

/// Columns ready for insertion plus the anomalies found while building them
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalOutcome {
    pub columns: Vec<Column>,
    /// Rows present in `columns`
    pub row_count: usize,
    pub anomalies: Vec<MarshalAnomaly>,
}

impl MarshalOutcome {
    /// Number of submitted rows left out of `columns`
    pub fn dropped_rows(&self, submitted: usize) -> usize {
        submitted.saturating_sub(self.row_count)
    }
}

/// Build the insert columns for `documents`
pub fn marshal<T: Document>(
    schema: &CollectionSchema,
    documents: &[T],
    policy: DimensionMismatchPolicy,
) -> Result<MarshalOutcome, MarshalError> {
    let mut columns = Vec::with_capacity(schema.fields.len());
    let mut anomalies = Vec::new();

    for definition in &schema.fields {
        let mut data = ColumnData::empty(definition.store_type, definition.dimension());
        let expected_len = definition.vector_len();

        for (row, document) in documents.iter().enumerate() {
            let value = document.field_value(&definition.name).ok_or_else(|| {
                MarshalError::MissingFieldValue {
                    row,
                    field: definition.name.clone(),
                }
            })?;

            if let (Some(expected), Some(actual)) = (expected_len, value.vector_len()) {
                if expected != actual {
                    warn!(
                        "⚠️ Vector dimension mismatch in {}: row {} field '{}' has {} elements, expected {}",
                        schema.collection_name, row, definition.name, actual, expected
                    );
                    anomalies.push(MarshalAnomaly {
                        row,
                        field: definition.name.clone(),
                        expected,
                        actual,
                    });
                }
            }

            data.push(value).map_err(|found| MarshalError::ValueTypeMismatch {
                row,
                field: definition.name.clone(),
                expected: definition.store_type.to_string(),
                found: found.semantic_type().to_string(),
            })?;
        }

        columns.push(Column::new(definition.name.clone(), data));
    }

    let mut row_count = documents.len();
    if !anomalies.is_empty() {
        match policy {
            DimensionMismatchPolicy::Reject => {
                return Err(MarshalError::DimensionMismatch { anomalies });
            }
            DimensionMismatchPolicy::DropRows => {
                let mut keep = vec![true; documents.len()];
                for anomaly in &anomalies {
                    keep[anomaly.row] = false;
                }
                for column in &mut columns {
                    column.data.retain_rows(&keep);
                }
                row_count = keep.iter().filter(|k| **k).count();
                warn!(
                    "🗑️ Dropped {} row(s) with mismatched vectors from {}",
                    documents.len() - row_count,
                    schema.collection_name
                );
            }
            DimensionMismatchPolicy::InsertAnyway => {}
        }
    }

    debug!(
        "📦 Marshalled {} row(s) into {} column(s) for {}",
        row_count,
        columns.len(),
        schema.collection_name
    );

    Ok(MarshalOutcome {
        columns,
        row_count,
        anomalies,
    })
}
