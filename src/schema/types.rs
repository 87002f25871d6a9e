// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Value types shared by documents, schemas and columns
//!
//! - [`SemanticType`]: the Rust-side type of a document field
//! - [`StoreType`]: the store-native type of a schema field or column
//! - [`FieldValue`]: one owned value moving between a document and a column
//! - [`FieldKind`]: the bridge implemented by every supported Rust field type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic value type of a document field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Platform integer; receives Int64 and Int32 columns but is never stored
    Int,
    Float32,
    Float64,
    String,
    /// Fixed-length `Vec<f32>`
    FloatVector,
    /// Fixed-length `Vec<u8>`, dimension counted in bits
    BinaryVector,
    /// Any other Rust type, named for error messages
    Other(&'static str),
}

impl SemanticType {
    /// Store-native type for this semantic type, `None` when unmapped
    pub fn store_type(&self) -> Option<StoreType> {
        match self {
            SemanticType::Bool => Some(StoreType::Bool),
            SemanticType::Int8 => Some(StoreType::Int8),
            SemanticType::Int16 => Some(StoreType::Int16),
            SemanticType::Int32 => Some(StoreType::Int32),
            SemanticType::Int64 => Some(StoreType::Int64),
            SemanticType::Float32 => Some(StoreType::Float),
            SemanticType::Float64 => Some(StoreType::Double),
            SemanticType::String => Some(StoreType::VarChar),
            SemanticType::FloatVector => Some(StoreType::FloatVector),
            SemanticType::BinaryVector => Some(StoreType::BinaryVector),
            SemanticType::Int | SemanticType::Other(_) => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, SemanticType::FloatVector | SemanticType::BinaryVector)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int8 => "i8",
            SemanticType::Int16 => "i16",
            SemanticType::Int32 => "i32",
            SemanticType::Int64 => "i64",
            SemanticType::Int => "isize",
            SemanticType::Float32 => "f32",
            SemanticType::Float64 => "f64",
            SemanticType::String => "String",
            SemanticType::FloatVector => "Vec<f32>",
            SemanticType::BinaryVector => "Vec<u8>",
            SemanticType::Other(name) => name,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store-native field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    VarChar,
    FloatVector,
    BinaryVector,
    /// Dynamic JSON column; returned by some stores, never produced here
    Json,
}

impl StoreType {
    pub fn is_vector(&self) -> bool {
        matches!(self, StoreType::FloatVector | StoreType::BinaryVector)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreType::Bool => "Bool",
            StoreType::Int8 => "Int8",
            StoreType::Int16 => "Int16",
            StoreType::Int32 => "Int32",
            StoreType::Int64 => "Int64",
            StoreType::Float => "Float",
            StoreType::Double => "Double",
            StoreType::VarChar => "VarChar",
            StoreType::FloatVector => "FloatVector",
            StoreType::BinaryVector => "BinaryVector",
            StoreType::Json => "JSON",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One field value, owned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int(isize),
    Float(f32),
    Double(f64),
    VarChar(String),
    FloatVector(Vec<f32>),
    BinaryVector(Vec<u8>),
}

impl FieldValue {
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            FieldValue::Bool(_) => SemanticType::Bool,
            FieldValue::Int8(_) => SemanticType::Int8,
            FieldValue::Int16(_) => SemanticType::Int16,
            FieldValue::Int32(_) => SemanticType::Int32,
            FieldValue::Int64(_) => SemanticType::Int64,
            FieldValue::Int(_) => SemanticType::Int,
            FieldValue::Float(_) => SemanticType::Float32,
            FieldValue::Double(_) => SemanticType::Float64,
            FieldValue::VarChar(_) => SemanticType::String,
            FieldValue::FloatVector(_) => SemanticType::FloatVector,
            FieldValue::BinaryVector(_) => SemanticType::BinaryVector,
        }
    }

    /// Element count of a vector value
    pub fn vector_len(&self) -> Option<usize> {
        match self {
            FieldValue::FloatVector(v) => Some(v.len()),
            FieldValue::BinaryVector(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Convert to `target`, allowing exact matches plus the widening pairs
    /// Int64→Int, Int32→Int and Float→Double.
    pub fn coerce_to(self, target: SemanticType) -> Option<FieldValue> {
        match (self, target) {
            (FieldValue::Int64(v), SemanticType::Int) => isize::try_from(v).ok().map(FieldValue::Int),
            (FieldValue::Int32(v), SemanticType::Int) => isize::try_from(v).ok().map(FieldValue::Int),
            (FieldValue::Float(v), SemanticType::Float64) => Some(FieldValue::Double(v as f64)),
            (value, target) if value.semantic_type() == target => Some(value),
            _ => None,
        }
    }
}

/// Rust types that can be declared as document fields
pub trait FieldKind: Sized {
    const SEMANTIC_TYPE: SemanticType;

    fn to_field_value(&self) -> FieldValue;

    /// Take the value back; `Err` returns it untouched when the kind differs
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValue>;
}

macro_rules! impl_field_kind {
    ($($ty:ty => $semantic:ident / $variant:ident),* $(,)?) => {
        $(
            impl FieldKind for $ty {
                const SEMANTIC_TYPE: SemanticType = SemanticType::$semantic;

                fn to_field_value(&self) -> FieldValue {
                    FieldValue::$variant(self.clone())
                }

                fn from_field_value(value: FieldValue) -> Result<Self, FieldValue> {
                    match value {
                        FieldValue::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_field_kind! {
    bool => Bool / Bool,
    i8 => Int8 / Int8,
    i16 => Int16 / Int16,
    i32 => Int32 / Int32,
    i64 => Int64 / Int64,
    isize => Int / Int,
    f32 => Float32 / Float,
    f64 => Float64 / Double,
    String => String / VarChar,
    Vec<f32> => FloatVector / FloatVector,
    Vec<u8> => BinaryVector / BinaryVector,
}
