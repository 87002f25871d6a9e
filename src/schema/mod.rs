// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Document Schema Layer
//!
//! Declared document fields flow through three steps:
//! 1. [`DocumentLayout::extract`] parses per-field metadata into [`FieldDescriptor`]s
//! 2. [`CollectionSchema::synthesize`] maps inbound descriptors to store field definitions
//! 3. [`select_output_fields`] picks the projection requested by searches

pub mod collection_schema;
pub mod descriptor;
pub mod document;
pub mod types;

pub use collection_schema::{
    default_collection_name, select_output_fields, CollectionSchema, FieldDefinition,
    DEFAULT_MAX_LENGTH, DIMENSION_PARAM, MAX_LENGTH_PARAM,
};
pub use descriptor::{DocumentLayout, FieldDescriptor, FieldSpec};
pub use document::Document;
pub use types::{FieldKind, FieldValue, SemanticType, StoreType};
