// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Column-major field data
//!
//! [`ColumnData`] is a closed sum over the store field types. Every variant has a push
//! arm (marshalling) and a read arm (unmarshalling), so adding a store type forces both
//! directions to be written.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldValue, StoreType};

/// Values of one field across a batch, in row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    VarChar(Vec<String>),
    /// One vector per row; `dim` is the declared dimension
    FloatVector { dim: usize, data: Vec<Vec<f32>> },
    /// One packed vector per row; `dim` counts bits
    BinaryVector { dim: usize, data: Vec<Vec<u8>> },
    /// Dynamic JSON values returned by the store
    Json(Vec<serde_json::Value>),
}

impl ColumnData {
    /// Empty column for `store_type`; `dimension` applies to vector types
    pub fn empty(store_type: StoreType, dimension: Option<usize>) -> Self {
        let dim = dimension.unwrap_or(0);
        match store_type {
            StoreType::Bool => ColumnData::Bool(Vec::new()),
            StoreType::Int8 => ColumnData::Int8(Vec::new()),
            StoreType::Int16 => ColumnData::Int16(Vec::new()),
            StoreType::Int32 => ColumnData::Int32(Vec::new()),
            StoreType::Int64 => ColumnData::Int64(Vec::new()),
            StoreType::Float => ColumnData::Float(Vec::new()),
            StoreType::Double => ColumnData::Double(Vec::new()),
            StoreType::VarChar => ColumnData::VarChar(Vec::new()),
            StoreType::FloatVector => ColumnData::FloatVector { dim, data: Vec::new() },
            StoreType::BinaryVector => ColumnData::BinaryVector { dim, data: Vec::new() },
            StoreType::Json => ColumnData::Json(Vec::new()),
        }
    }

    pub fn store_type(&self) -> StoreType {
        match self {
            ColumnData::Bool(_) => StoreType::Bool,
            ColumnData::Int8(_) => StoreType::Int8,
            ColumnData::Int16(_) => StoreType::Int16,
            ColumnData::Int32(_) => StoreType::Int32,
            ColumnData::Int64(_) => StoreType::Int64,
            ColumnData::Float(_) => StoreType::Float,
            ColumnData::Double(_) => StoreType::Double,
            ColumnData::VarChar(_) => StoreType::VarChar,
            ColumnData::FloatVector { .. } => StoreType::FloatVector,
            ColumnData::BinaryVector { .. } => StoreType::BinaryVector,
            ColumnData::Json(_) => StoreType::Json,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::VarChar(v) => v.len(),
            ColumnData::FloatVector { data, .. } => data.len(),
            ColumnData::BinaryVector { data, .. } => data.len(),
            ColumnData::Json(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one value; `Err` returns it when its kind does not match the column
    pub fn push(&mut self, value: FieldValue) -> Result<(), FieldValue> {
        match (self, value) {
            (ColumnData::Bool(v), FieldValue::Bool(x)) => v.push(x),
            (ColumnData::Int8(v), FieldValue::Int8(x)) => v.push(x),
            (ColumnData::Int16(v), FieldValue::Int16(x)) => v.push(x),
            (ColumnData::Int32(v), FieldValue::Int32(x)) => v.push(x),
            (ColumnData::Int64(v), FieldValue::Int64(x)) => v.push(x),
            (ColumnData::Float(v), FieldValue::Float(x)) => v.push(x),
            (ColumnData::Double(v), FieldValue::Double(x)) => v.push(x),
            (ColumnData::VarChar(v), FieldValue::VarChar(x)) => v.push(x),
            (ColumnData::FloatVector { data, .. }, FieldValue::FloatVector(x)) => data.push(x),
            (ColumnData::BinaryVector { data, .. }, FieldValue::BinaryVector(x)) => data.push(x),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// Value at `row`; `None` past the end and for JSON columns
    pub fn value_at(&self, row: usize) -> Option<FieldValue> {
        match self {
            ColumnData::Bool(v) => v.get(row).copied().map(FieldValue::Bool),
            ColumnData::Int8(v) => v.get(row).copied().map(FieldValue::Int8),
            ColumnData::Int16(v) => v.get(row).copied().map(FieldValue::Int16),
            ColumnData::Int32(v) => v.get(row).copied().map(FieldValue::Int32),
            ColumnData::Int64(v) => v.get(row).copied().map(FieldValue::Int64),
            ColumnData::Float(v) => v.get(row).copied().map(FieldValue::Float),
            ColumnData::Double(v) => v.get(row).copied().map(FieldValue::Double),
            ColumnData::VarChar(v) => v.get(row).cloned().map(FieldValue::VarChar),
            ColumnData::FloatVector { data, .. } => data.get(row).cloned().map(FieldValue::FloatVector),
            ColumnData::BinaryVector { data, .. } => {
                data.get(row).cloned().map(FieldValue::BinaryVector)
            }
            ColumnData::Json(_) => None,
        }
    }

    /// Keep only the rows whose `keep` flag is set
    pub fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<V>(values: &mut Vec<V>, keep: &[bool]) {
            let mut row = 0;
            values.retain(|_| {
                let kept = keep.get(row).copied().unwrap_or(true);
                row += 1;
                kept
            });
        }

        match self {
            ColumnData::Bool(v) => retain(v, keep),
            ColumnData::Int8(v) => retain(v, keep),
            ColumnData::Int16(v) => retain(v, keep),
            ColumnData::Int32(v) => retain(v, keep),
            ColumnData::Int64(v) => retain(v, keep),
            ColumnData::Float(v) => retain(v, keep),
            ColumnData::Double(v) => retain(v, keep),
            ColumnData::VarChar(v) => retain(v, keep),
            ColumnData::FloatVector { data, .. } => retain(data, keep),
            ColumnData::BinaryVector { data, .. } => retain(data, keep),
            ColumnData::Json(v) => retain(v, keep),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int64(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, ColumnData::Int64(values))
    }

    pub fn varchar(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, ColumnData::VarChar(values))
    }

    pub fn float_vector(name: impl Into<String>, dim: usize, data: Vec<Vec<f32>>) -> Self {
        Self::new(name, ColumnData::FloatVector { dim, data })
    }

    pub fn store_type(&self) -> StoreType {
        self.data.store_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn value_at(&self, row: usize) -> Option<FieldValue> {
        self.data.value_at(row)
    }
}
