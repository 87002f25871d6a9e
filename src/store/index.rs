// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Index and metric descriptions passed through to the store

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::schema::StoreType;

/// Similarity metric of an index or a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MetricType {
    /// Squared Euclidean distance
    #[serde(rename = "L2")]
    L2,
    /// Inner product
    #[default]
    #[serde(rename = "IP")]
    InnerProduct,
    #[serde(rename = "COSINE")]
    Cosine,
    /// Differing bits between binary vectors
    #[serde(rename = "HAMMING")]
    Hamming,
    /// 1 - |a ∩ b| / |a ∪ b| over binary vectors
    #[serde(rename = "JACCARD")]
    Jaccard,
}

impl MetricType {
    /// Higher scores rank first when true, lower scores otherwise
    pub fn is_similarity(&self) -> bool {
        matches!(self, MetricType::InnerProduct | MetricType::Cosine)
    }

    /// Whether the metric applies to vectors of `store_type`
    pub fn supports(&self, store_type: StoreType) -> bool {
        match self {
            MetricType::L2 | MetricType::InnerProduct | MetricType::Cosine => {
                store_type == StoreType::FloatVector
            }
            MetricType::Hamming | MetricType::Jaccard => store_type == StoreType::BinaryVector,
        }
    }

    /// Metric used when none is configured for a field of `store_type`
    pub fn default_for(store_type: StoreType) -> Self {
        match store_type {
            StoreType::BinaryVector => MetricType::Hamming,
            _ => MetricType::InnerProduct,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricType::L2 => "L2",
            MetricType::InnerProduct => "IP",
            MetricType::Cosine => "COSINE",
            MetricType::Hamming => "HAMMING",
            MetricType::Jaccard => "JACCARD",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index algorithms understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    Flat,
    IvfFlat,
    IvfSq8,
    IvfPq,
    Hnsw,
    Annoy,
    BinFlat,
    BinIvfFlat,
    #[serde(rename = "AUTOINDEX")]
    AutoIndex,
}

impl IndexType {
    pub fn name(&self) -> &'static str {
        match self {
            IndexType::Flat => "FLAT",
            IndexType::IvfFlat => "IVF_FLAT",
            IndexType::IvfSq8 => "IVF_SQ8",
            IndexType::IvfPq => "IVF_PQ",
            IndexType::Hnsw => "HNSW",
            IndexType::Annoy => "ANNOY",
            IndexType::BinFlat => "BIN_FLAT",
            IndexType::BinIvfFlat => "BIN_IVF_FLAT",
            IndexType::AutoIndex => "AUTOINDEX",
        }
    }

    /// Whether the index can be built over a field of `store_type`
    pub fn supports(&self, store_type: StoreType) -> bool {
        match self {
            IndexType::AutoIndex => store_type.is_vector(),
            IndexType::BinFlat | IndexType::BinIvfFlat => store_type == StoreType::BinaryVector,
            _ => store_type == StoreType::FloatVector,
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index to build over the index field; parameters are opaque to this crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub index_type: IndexType,
    pub metric: MetricType,
    pub params: HashMap<String, String>,
}

impl IndexSpec {
    pub fn new(index_type: IndexType, metric: MetricType) -> Self {
        Self {
            index_type,
            metric,
            params: HashMap::new(),
        }
    }

    /// Store-chosen index over inner product
    pub fn auto() -> Self {
        Self::new(IndexType::AutoIndex, MetricType::InnerProduct)
    }

    /// Store-chosen index with the default metric for `store_type`
    pub fn auto_for(store_type: StoreType) -> Self {
        Self::new(IndexType::AutoIndex, MetricType::default_for(store_type))
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }
}

impl Default for IndexSpec {
    fn default() -> Self {
        Self::auto()
    }
}

/// Build state of an index as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexState {
    /// No index has been requested on the field
    Absent,
    Unissued,
    InProgress,
    Finished,
    Failed,
}

impl IndexState {
    pub fn is_absent(&self) -> bool {
        matches!(self, IndexState::Absent)
    }
}
