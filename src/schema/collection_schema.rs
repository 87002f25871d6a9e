// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Schema Synthesis
//!
//! Maps the inbound descriptors of a [`DocumentLayout`] onto store-native field
//! definitions and checks the collection-level invariants: exactly one primary key of
//! type `i64` or `String`, at most one index field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::descriptor::{DocumentLayout, FieldDescriptor};
use super::types::{SemanticType, StoreType};
use crate::core::errors::ConfigError;

/// VarChar capacity used when a field has no `max-length` parameter
pub const DEFAULT_MAX_LENGTH: usize = 65535;

/// Type parameter key holding a vector dimension
pub const DIMENSION_PARAM: &str = "dim";

/// Type parameter key holding a VarChar capacity
pub const MAX_LENGTH_PARAM: &str = "max_length";

/// Store-facing projection of one inbound field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub store_type: StoreType,
    pub is_primary_key: bool,
    pub type_params: BTreeMap<String, String>,
}

impl FieldDefinition {
    fn from_descriptor(descriptor: &FieldDescriptor) -> Result<Self, ConfigError> {
        let store_type =
            descriptor
                .semantic_type
                .store_type()
                .ok_or_else(|| ConfigError::UnsupportedType {
                    field: descriptor.name.clone(),
                    semantic_type: descriptor.semantic_type.to_string(),
                })?;

        let mut type_params = BTreeMap::new();
        match store_type {
            StoreType::FloatVector | StoreType::BinaryVector => {
                let dimension = descriptor.dimension.ok_or_else(|| ConfigError::MissingDimension {
                    field: descriptor.name.clone(),
                })?;
                type_params.insert(DIMENSION_PARAM.to_string(), dimension.to_string());
            }
            StoreType::VarChar => {
                let max_length = descriptor.max_length.unwrap_or(DEFAULT_MAX_LENGTH);
                type_params.insert(MAX_LENGTH_PARAM.to_string(), max_length.to_string());
            }
            _ => {}
        }

        Ok(Self {
            name: descriptor.name.clone(),
            store_type,
            is_primary_key: descriptor.is_primary_key,
            type_params,
        })
    }

    /// Declared vector dimension; bits for binary vectors
    pub fn dimension(&self) -> Option<usize> {
        self.type_params
            .get(DIMENSION_PARAM)
            .and_then(|v| v.parse().ok())
    }

    pub fn max_length(&self) -> Option<usize> {
        self.type_params
            .get(MAX_LENGTH_PARAM)
            .and_then(|v| v.parse().ok())
    }

    /// Expected element count of one vector value
    pub fn vector_len(&self) -> Option<usize> {
        match self.store_type {
            StoreType::FloatVector => self.dimension(),
            StoreType::BinaryVector => self.dimension().map(|bits| bits / 8),
            _ => None,
        }
    }
}

/// Store schema of one collection; immutable once synthesized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub collection_name: String,
    pub description: String,
    /// Keys are always supplied by documents
    pub auto_id: bool,
    /// Inbound fields in declaration order
    pub fields: Vec<FieldDefinition>,
    pub primary_key_field: String,
    /// Vector field searched by similarity
    pub index_field: Option<String>,
}

/// Collection name derived from a document type name
pub fn default_collection_name(type_name: &str) -> String {
    format!("{}s", type_name)
}

/// Outbound field names in declaration order, the projection of every search
pub fn select_output_fields(layout: &DocumentLayout) -> Vec<String> {
    layout.output_fields()
}

impl CollectionSchema {
    /// Build the schema for `layout` under `collection_name`
    pub fn synthesize(
        layout: &DocumentLayout,
        collection_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let collection_name = collection_name.into();

        let fields = layout
            .inbound()
            .map(FieldDefinition::from_descriptor)
            .collect::<Result<Vec<_>, _>>()?;

        let primary_keys: Vec<&FieldDescriptor> =
            layout.inbound().filter(|d| d.is_primary_key).collect();
        if primary_keys.len() != 1 {
            return Err(ConfigError::PrimaryKeyCount {
                count: primary_keys.len(),
                fields: primary_keys.iter().map(|d| d.name.clone()).collect(),
            });
        }
        let primary_key = primary_keys[0];
        if !matches!(
            primary_key.semantic_type,
            SemanticType::Int64 | SemanticType::String
        ) {
            return Err(ConfigError::InvalidPrimaryKeyType {
                field: primary_key.name.clone(),
                semantic_type: primary_key.semantic_type.to_string(),
            });
        }

        let index_field = Self::select_index_field(layout)?;

        let schema = Self {
            description: format!("collection of {}s", layout.type_name()),
            collection_name,
            auto_id: false,
            fields,
            primary_key_field: primary_key.name.clone(),
            index_field,
        };

        debug!(
            "📋 Synthesized schema {}: {} fields, primary key '{}', index field {:?}",
            schema.collection_name,
            schema.fields.len(),
            schema.primary_key_field,
            schema.index_field
        );
        Ok(schema)
    }

    fn select_index_field(layout: &DocumentLayout) -> Result<Option<String>, ConfigError> {
        let tagged: Vec<&FieldDescriptor> = layout
            .descriptors()
            .iter()
            .filter(|d| d.is_indexed_vector)
            .collect();

        match tagged.as_slice() {
            [] => {
                let mut vectors = layout.inbound().filter(|d| d.semantic_type.is_vector());
                match (vectors.next(), vectors.next()) {
                    (Some(only), None) => Ok(Some(only.name.clone())),
                    _ => Ok(None),
                }
            }
            [field] if !field.is_inbound => Err(ConfigError::invalid_tag(
                &field.name,
                "`indexed` field must also be tagged `in`",
            )),
            [field] => Ok(Some(field.name.clone())),
            many => Err(ConfigError::MultipleIndexFields {
                fields: many.iter().map(|d| d.name.clone()).collect(),
            }),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_key(&self) -> Option<&FieldDefinition> {
        self.field(&self.primary_key_field)
    }

    /// Store type of the primary key column
    pub fn primary_key_type(&self) -> StoreType {
        self.primary_key()
            .map(|f| f.store_type)
            .unwrap_or(StoreType::Int64)
    }

    pub fn index_definition(&self) -> Option<&FieldDefinition> {
        self.index_field.as_deref().and_then(|name| self.field(name))
    }
}
