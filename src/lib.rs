/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # ProximaDB ORM - Typed Documents over Columnar Vector Stores
//!
//! Maps application-defined documents (a primary key, scalar attributes and
//! fixed-dimension vectors) onto a columnar vector-similarity store.
//!
//! ## Key Features
//!
//! - **Declarative Field Metadata**: per-field tags (`in`, `out`, `primary-key`,
//!   `dimension=N`, `max-length=N`, `indexed`, `score`) drive schema derivation
//! - **Schema Synthesis**: store schema with exactly one primary key, validated at
//!   construction time
//! - **Column Marshalling**: row-major documents to column-major insert batches
//! - **Column Unmarshalling**: column-major search results back to typed documents
//! - **Collection Lifecycle**: idempotent create, insert with flush policy, search,
//!   delete by key or by value
//!
//! ## Example
//!
//! ```rust,ignore
//! use proximadb_orm::{impl_document, CollectionClient, MemoryStore, SearchRequest};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Article {
//!     id: i64,
//!     label: String,
//!     embedding: Vec<f32>,
//! }
//!
//! impl_document!(Article {
//!     id: i64 => "in,out,primary-key",
//!     label: String => "in,out,max-length=256",
//!     embedding: Vec<f32> => "in,dimension=8,indexed",
//! });
//!
//! let store = MemoryStore::new();
//! let client = CollectionClient::<Article>::builder(store).build()?;
//! client.create().await?;
//! client.insert(&articles).await?;
//! let hits = client.search(&SearchRequest::new(query).top_k(1)).await?;
//! ```

pub mod client;
pub mod columnar;
pub mod core;
pub mod schema;
pub mod store;

pub use crate::client::{
    CollectionClient, CollectionClientBuilder, ConnectionState, ConnectionStrategy,
    FlushPolicy, FlushTracker, Hit, InsertOutcome, SearchRequest,
};
pub use crate::columnar::{
    Column, ColumnData, DimensionMismatchPolicy, MarshalOutcome, SearchResult,
};
pub use crate::core::{ClientConfig, OrmError, PrimaryKey};
pub use crate::schema::{
    CollectionSchema, Document, DocumentLayout, FieldDefinition, FieldDescriptor,
    FieldKind, FieldSpec, FieldValue, SemanticType, StoreType,
};
pub use crate::store::{
    IndexSpec, IndexState, IndexType, MemoryStore, MetricType, QueryVector, RemoteStore,
    StoreConnector,
};

/// Result type returned by every public operation of this crate
pub type Result<T> = std::result::Result<T, OrmError>;
