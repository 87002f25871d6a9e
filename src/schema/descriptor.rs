// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Field Descriptor Extraction
//!
//! Turns the declared fields of a document type, each carrying a metadata string,
//! into an ordered list of [`FieldDescriptor`]s.
//!
//! ## Metadata grammar
//!
//! Comma-separated tokens; whitespace around tokens is ignored and keys are
//! case-insensitive.
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `in` | written to the store on insert |
//! | `out` | requested back from the store on search |
//! | `primary-key` / `pk` | the collection primary key (implies `in`) |
//! | `indexed` / `index` | the vector field searched by similarity |
//! | `score` | receives the similarity score of each hit |
//! | `dimension=N` / `dim=N` | vector dimension, required on vector fields |
//! | `max-length=N` / `max_length=N` | VarChar capacity, default 65535 |
//!
//! A field whose metadata holds no role token plays no part in storage.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::document::Document;
use super::types::SemanticType;
use crate::core::errors::ConfigError;

/// A declared document field: name, semantic type and raw metadata string
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub semantic_type: SemanticType,
    pub tags: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType, tags: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            tags: tags.into(),
        }
    }
}

/// Storage roles and parameters derived for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
    pub is_inbound: bool,
    pub is_outbound: bool,
    pub is_primary_key: bool,
    pub is_indexed_vector: bool,
    pub is_score: bool,
    /// Vector dimension; bits for binary vectors
    pub dimension: Option<usize>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Default, PartialEq)]
struct ParsedTags {
    inbound: bool,
    outbound: bool,
    primary_key: bool,
    indexed: bool,
    score: bool,
    dimension: Option<usize>,
    max_length: Option<usize>,
}

impl ParsedTags {
    fn has_role(&self) -> bool {
        self.inbound || self.outbound || self.primary_key || self.indexed || self.score
    }
}

fn parse_positive(field: &str, parameter: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidParameter {
            field: field.to_string(),
            parameter: parameter.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_tags(field: &str, tags: &str) -> Result<ParsedTags, ConfigError> {
    let mut parsed = ParsedTags::default();

    for token in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((key, value)) = token.split_once('=') {
            let key = key.trim().to_ascii_lowercase();
            match key.as_str() {
                "dimension" | "dim" => parsed.dimension = Some(parse_positive(field, &key, value)?),
                "max-length" | "max_length" => {
                    parsed.max_length = Some(parse_positive(field, &key, value)?)
                }
                _ => {
                    return Err(ConfigError::invalid_tag(
                        field,
                        format!("unknown parameter '{}'", key),
                    ))
                }
            }
            continue;
        }

        match token.to_ascii_lowercase().as_str() {
            "in" => parsed.inbound = true,
            "out" => parsed.outbound = true,
            "primary-key" | "primary_key" | "pk" => parsed.primary_key = true,
            "indexed" | "index" => parsed.indexed = true,
            "score" => parsed.score = true,
            other => {
                return Err(ConfigError::invalid_tag(
                    field,
                    format!("unknown token '{}'", other),
                ))
            }
        }
    }

    Ok(parsed)
}

impl FieldDescriptor {
    /// Derive the descriptor of one declared field.
    ///
    /// Returns `Ok(None)` for fields without a role token.
    pub fn from_spec(spec: &FieldSpec) -> Result<Option<Self>, ConfigError> {
        let name = spec.name.as_str();
        let tags = parse_tags(name, &spec.tags)?;
        if !tags.has_role() {
            return Ok(None);
        }

        let semantic_type = spec.semantic_type;
        let is_vector = semantic_type.is_vector();

        if tags.score {
            if tags.inbound || tags.outbound || tags.primary_key || tags.indexed {
                return Err(ConfigError::invalid_tag(
                    name,
                    "`score` cannot be combined with storage roles",
                ));
            }
            if !matches!(semantic_type, SemanticType::Float32 | SemanticType::Float64) {
                return Err(ConfigError::invalid_tag(
                    name,
                    format!("`score` requires f32 or f64, found {}", semantic_type),
                ));
            }
        }

        if tags.indexed && !is_vector {
            return Err(ConfigError::invalid_tag(
                name,
                format!("`indexed` requires a vector field, found {}", semantic_type),
            ));
        }

        if is_vector {
            let dimension = tags.dimension.ok_or_else(|| ConfigError::MissingDimension {
                field: name.to_string(),
            })?;
            if semantic_type == SemanticType::BinaryVector && dimension % 8 != 0 {
                return Err(ConfigError::InvalidParameter {
                    field: name.to_string(),
                    parameter: "dimension".to_string(),
                    value: dimension.to_string(),
                });
            }
        } else if tags.dimension.is_some() {
            return Err(ConfigError::invalid_tag(
                name,
                format!("`dimension` applies to vector fields only, found {}", semantic_type),
            ));
        }

        if tags.max_length.is_some() && semantic_type != SemanticType::String {
            return Err(ConfigError::invalid_tag(
                name,
                format!("`max-length` applies to String fields only, found {}", semantic_type),
            ));
        }

        Ok(Some(FieldDescriptor {
            name: name.to_string(),
            semantic_type,
            is_inbound: tags.inbound || tags.primary_key,
            is_outbound: tags.outbound,
            is_primary_key: tags.primary_key,
            is_indexed_vector: tags.indexed,
            is_score: tags.score,
            dimension: tags.dimension,
            max_length: tags.max_length,
        }))
    }

    /// Expected element count of a vector value: floats, or bytes for binary vectors
    pub fn vector_len(&self) -> Option<usize> {
        match self.semantic_type {
            SemanticType::FloatVector => self.dimension,
            SemanticType::BinaryVector => self.dimension.map(|bits| bits / 8),
            _ => None,
        }
    }
}

/// Declared fields and derived descriptors of one document type
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    type_name: String,
    specs: Vec<FieldSpec>,
    descriptors: Vec<FieldDescriptor>,
}

static LAYOUT_CACHE: Lazy<DashMap<TypeId, Arc<DocumentLayout>>> = Lazy::new(DashMap::new);

impl DocumentLayout {
    /// Extract descriptors from declared field specs, in declaration order
    pub fn extract(type_name: impl Into<String>, specs: Vec<FieldSpec>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut descriptors = Vec::new();

        for spec in &specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::invalid_tag(&spec.name, "field declared twice"));
            }
            if let Some(descriptor) = FieldDescriptor::from_spec(spec)? {
                descriptors.push(descriptor);
            }
        }

        Ok(Self {
            type_name: type_name.into(),
            specs,
            descriptors,
        })
    }

    /// Layout of `T`, extracted once per type and shared afterwards
    pub fn of<T: Document>() -> Result<Arc<Self>, ConfigError> {
        let key = TypeId::of::<T>();
        if let Some(layout) = LAYOUT_CACHE.get(&key) {
            return Ok(layout.value().clone());
        }

        let layout = Arc::new(Self::extract(T::type_name(), T::field_specs())?);
        debug!(
            "📐 Extracted layout for {}: {} declared, {} with roles",
            layout.type_name,
            layout.specs.len(),
            layout.descriptors.len()
        );
        Ok(LAYOUT_CACHE.entry(key).or_insert(layout).value().clone())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Every declared field, with or without roles
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn inbound(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.iter().filter(|d| d.is_inbound)
    }

    /// Outbound field names in declaration order
    pub fn output_fields(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| d.is_outbound)
            .map(|d| d.name.clone())
            .collect()
    }

    pub fn score_field(&self) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.is_score)
    }
}
