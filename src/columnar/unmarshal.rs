// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Column Unmarshalling
//!
//! Rebuilds typed documents from a column-major search result. Row `i` of every column
//! lands in document `i`. Lengths are verified for every column before any document is
//! touched.

use serde::{Deserialize, Serialize};

use super::column::Column;
use crate::core::errors::UnmarshalError;
use crate::schema::{Document, DocumentLayout, FieldValue, SemanticType, StoreType};

const SCORES_COLUMN: &str = "<scores>";
const IDS_COLUMN: &str = "<ids>";

/// Hits returned for one query vector
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub result_count: usize,
    /// Output columns, each `result_count` long
    pub fields: Vec<Column>,
    /// Similarity scores in hit order; empty when the store sent none
    pub scores: Vec<f32>,
    /// Primary keys of the hits, when sent apart from `fields`
    pub ids: Option<Column>,
}

impl SearchResult {
    pub fn new(result_count: usize, fields: Vec<Column>) -> Self {
        Self {
            result_count,
            fields,
            scores: Vec::new(),
            ids: None,
        }
    }

    pub fn with_scores(mut self, scores: Vec<f32>) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_ids(mut self, ids: Column) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.fields.iter().find(|c| c.name == name)
    }

    /// Check every column and the scores against `result_count`
    pub fn validate_lengths(&self) -> Result<(), UnmarshalError> {
        let expected = self.result_count;
        let columns = self
            .ids
            .iter()
            .map(|c| (IDS_COLUMN, c.len()))
            .chain(self.fields.iter().map(|c| (c.name.as_str(), c.len())));

        for (column, actual) in columns {
            if actual != expected {
                return Err(UnmarshalError::ColumnLengthMismatch {
                    column: column.to_string(),
                    expected,
                    actual,
                });
            }
        }

        if !self.scores.is_empty() && self.scores.len() != expected {
            return Err(UnmarshalError::ColumnLengthMismatch {
                column: SCORES_COLUMN.to_string(),
                expected,
                actual: self.scores.len(),
            });
        }
        Ok(())
    }
}

/// Whether a field of type `field` can receive a `column` value, including the
/// widening pairs Int64→isize, Int32→isize and Float→f64.
pub fn accepts(field: SemanticType, column: StoreType) -> bool {
    match (field, column) {
        (SemanticType::Int, StoreType::Int64 | StoreType::Int32) => true,
        (SemanticType::Float64, StoreType::Float) => true,
        (field, column) => field.store_type() == Some(column),
    }
}

struct Assignment<'a> {
    column: &'a Column,
    field: &'a str,
    field_type: SemanticType,
}

impl Assignment<'_> {
    fn mismatch(&self) -> UnmarshalError {
        UnmarshalError::FieldTypeMismatch {
            field: self.field.to_string(),
            column_type: self.column.store_type().to_string(),
            field_type: self.field_type.to_string(),
        }
    }
}

fn plan<'a>(
    layout: &'a DocumentLayout,
    result: &'a SearchResult,
) -> Result<Vec<Assignment<'a>>, UnmarshalError> {
    let primary_key = layout
        .descriptors()
        .iter()
        .find(|d| d.is_primary_key)
        .map(|d| d.name.as_str());

    let mut ordered: Vec<(&'a Column, &'a str)> = Vec::new();
    if let (Some(ids), Some(key)) = (&result.ids, primary_key) {
        ordered.push((ids, key));
    }
    for column in &result.fields {
        if Some(column.name.as_str()) == primary_key {
            if result.ids.is_some() {
                continue;
            }
            ordered.insert(0, (column, column.name.as_str()));
        } else {
            ordered.push((column, column.name.as_str()));
        }
    }

    // Only outbound fields and the primary key may receive result values
    let mut assignments = Vec::with_capacity(ordered.len());
    for (column, field) in ordered {
        let Some(descriptor) = layout
            .descriptor(field)
            .filter(|d| d.is_outbound || d.is_primary_key)
        else {
            continue;
        };
        let assignment = Assignment {
            column,
            field: descriptor.name.as_str(),
            field_type: descriptor.semantic_type,
        };
        if column.store_type() == StoreType::Json {
            return Err(UnmarshalError::UnsupportedColumnType {
                field: field.to_string(),
                column_type: StoreType::Json.to_string(),
            });
        }
        if !accepts(assignment.field_type, column.store_type()) {
            return Err(assignment.mismatch());
        }
        assignments.push(assignment);
    }
    Ok(assignments)
}

/// Rebuild `result.result_count` documents from one result
pub fn unmarshal<T: Document>(
    layout: &DocumentLayout,
    result: &SearchResult,
) -> Result<Vec<T>, UnmarshalError> {
    result.validate_lengths()?;
    if result.result_count == 0 {
        return Ok(Vec::new());
    }

    let assignments = plan(layout, result)?;
    let mut documents: Vec<T> = (0..result.result_count).map(|_| T::default()).collect();

    for assignment in &assignments {
        for (row, document) in documents.iter_mut().enumerate() {
            let value = assignment.column.value_at(row).ok_or_else(|| {
                UnmarshalError::ColumnLengthMismatch {
                    column: assignment.column.name.clone(),
                    expected: result.result_count,
                    actual: row,
                }
            })?;
            let value = value
                .coerce_to(assignment.field_type)
                .ok_or_else(|| assignment.mismatch())?;
            document
                .set_field_value(assignment.field, value)
                .map_err(|_| assignment.mismatch())?;
        }
    }

    if let Some(score_field) = layout.score_field() {
        for (document, score) in documents.iter_mut().zip(&result.scores) {
            let value = match score_field.semantic_type {
                SemanticType::Float64 => FieldValue::Double(f64::from(*score)),
                _ => FieldValue::Float(*score),
            };
            document
                .set_field_value(&score_field.name, value)
                .map_err(|rejected| UnmarshalError::FieldTypeMismatch {
                    field: score_field.name.clone(),
                    column_type: rejected.semantic_type().to_string(),
                    field_type: score_field.semantic_type.to_string(),
                })?;
        }
    }

    Ok(documents)
}

/// Rebuild documents for each query of a batched search, in query order
pub fn unmarshal_batch<T: Document>(
    layout: &DocumentLayout,
    results: &[SearchResult],
) -> Result<Vec<Vec<T>>, UnmarshalError> {
    results.iter().map(|r| unmarshal(layout, r)).collect()
}
