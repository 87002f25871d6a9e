// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Remote Store Interface
//!
//! The collection client talks to a vector store only through [`RemoteStore`], obtained
//! from a [`StoreConnector`]. Transport and wire protocol live behind these traits.
//! [`MemoryStore`] implements both for tests and local development.

pub mod distance;
pub mod filter;
pub mod index;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::columnar::{Column, SearchResult};
use crate::core::errors::StoreResult;
use crate::schema::CollectionSchema;

pub use filter::Filter;
pub use index::{IndexSpec, IndexState, IndexType, MetricType};
pub use memory::{ConnectBehavior, MemoryStore};

/// Index-specific search parameters, opaque to this crate
pub type SearchParams = HashMap<String, String>;

/// One query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryVector {
    Float(Vec<f32>),
    /// Packed bits
    Binary(Vec<u8>),
}

impl QueryVector {
    pub fn len(&self) -> usize {
        match self {
            QueryVector::Float(v) => v.len(),
            QueryVector::Binary(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<f32>> for QueryVector {
    fn from(vector: Vec<f32>) -> Self {
        QueryVector::Float(vector)
    }
}

impl From<&[f32]> for QueryVector {
    fn from(vector: &[f32]) -> Self {
        QueryVector::Float(vector.to_vec())
    }
}

impl From<Vec<u8>> for QueryVector {
    fn from(vector: Vec<u8>) -> Self {
        QueryVector::Binary(vector)
    }
}

/// A similarity search as sent to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearch {
    pub collection: String,
    /// Partitions to search; empty searches all
    pub partitions: Vec<String>,
    /// Scalar filter; empty means none
    pub expression: String,
    pub output_fields: Vec<String>,
    pub vectors: Vec<QueryVector>,
    pub vector_field: String,
    pub metric: MetricType,
    pub top_k: usize,
    pub params: SearchParams,
}

/// Operations a vector store offers to the collection client
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a collection; an existing one yields `AlreadyExists`
    async fn create_collection(&self, schema: &CollectionSchema, shard_count: u32) -> StoreResult<()>;

    async fn create_partition(&self, collection: &str, partition: &str) -> StoreResult<()>;

    async fn get_index_state(&self, collection: &str, field: &str) -> StoreResult<IndexState>;

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        index: &IndexSpec,
        sync: bool,
    ) -> StoreResult<()>;

    /// Insert column-major rows; returns the number of rows accepted
    async fn insert(&self, collection: &str, partition: &str, columns: &[Column]) -> StoreResult<usize>;

    /// Seal recently inserted rows so searches see them
    async fn flush(&self, collection: &str, sync: bool) -> StoreResult<()>;

    async fn load_collection(&self, collection: &str, sync: bool) -> StoreResult<()>;

    /// One result per query vector, in query order
    async fn search(&self, request: &VectorSearch) -> StoreResult<Vec<SearchResult>>;

    /// Delete rows whose primary key appears in `keys`; returns the number removed
    async fn delete_by_primary_key(
        &self,
        collection: &str,
        partition: &str,
        keys: &Column,
    ) -> StoreResult<usize>;

    async fn drop_collection(&self, collection: &str) -> StoreResult<()>;

    /// Release the connection; later calls fail with `Closed`
    async fn close(&self) -> StoreResult<()>;
}

/// Opens connections to a store
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, address: &str) -> StoreResult<Arc<dyn RemoteStore>>;
}
