// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! In-Memory Vector Store
//!
//! Implements [`StoreConnector`] and [`RemoteStore`] entirely in process memory.
//! Ideal for testing and local development; nothing is persisted.
//!
//! It keeps the visibility rules of a real store: inserted rows sit in a growing
//! segment that searches do not see until `flush` seals it, and a collection must be
//! loaded before it can be searched. Deletes apply to sealed and growing rows at once.
//! Connect behaviour, per-call latency and one-shot failures can be scripted for tests.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::distance;
use super::filter::Filter;
use super::index::{IndexSpec, IndexState};
use super::{RemoteStore, StoreConnector, VectorSearch};
use crate::columnar::{Column, ColumnData, SearchResult};
use crate::core::errors::{StoreError, StoreResult};
use crate::core::types::{PrimaryKey, DEFAULT_PARTITION};
use crate::schema::{CollectionSchema, FieldValue};

/// How [`MemoryStore::connect`] answers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectBehavior {
    #[default]
    Accept,
    /// Accept after a delay
    Delay(Duration),
    /// Fail with `Unavailable` and the given message
    Refuse(String),
    /// Fail with `DeadlineExceeded`
    DeadlineExceeded,
    /// Never answer
    Hang,
}

#[derive(Debug, Clone)]
struct StoredRow {
    partition: String,
    values: HashMap<String, FieldValue>,
}

#[derive(Debug)]
struct MemoryCollection {
    schema: CollectionSchema,
    partitions: BTreeSet<String>,
    indexes: HashMap<String, IndexSpec>,
    loaded: bool,
    /// Flushed rows, visible to search
    sealed: Vec<StoredRow>,
    /// Inserted since the last flush
    growing: Vec<StoredRow>,
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    collections: RwLock<HashMap<String, MemoryCollection>>,
    behavior: Mutex<ConnectBehavior>,
    latency: Mutex<Option<Duration>>,
    /// One-shot failures keyed by operation name
    failures: DashMap<&'static str, StoreError>,
    connect_attempts: AtomicUsize,
    open_connections: AtomicUsize,
    addresses: Mutex<Vec<String>>,
    flushes: DashMap<String, usize>,
    index_builds: DashMap<String, usize>,
}

/// In-memory store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<MemoryStoreState>,
}

fn collection_not_found(collection: &str) -> StoreError {
    StoreError::NotFound(format!("collection {} not found", collection))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        *self.state.behavior.lock() = behavior;
    }

    /// Delay applied before every store operation
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.state.latency.lock() = latency;
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: StoreError) {
        self.state.failures.insert(operation, error);
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.connect_attempts.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet closed
    pub fn open_connections(&self) -> usize {
        self.state.open_connections.load(Ordering::SeqCst)
    }

    /// Addresses passed to `connect`, in call order
    pub fn connected_addresses(&self) -> Vec<String> {
        self.state.addresses.lock().clone()
    }

    pub fn flush_count(&self, collection: &str) -> usize {
        self.state.flushes.get(collection).map(|c| *c).unwrap_or(0)
    }

    pub fn index_build_count(&self, collection: &str) -> usize {
        self.state.index_builds.get(collection).map(|c| *c).unwrap_or(0)
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.state.collections.read().contains_key(collection)
    }

    pub fn has_partition(&self, collection: &str, partition: &str) -> bool {
        self.state
            .collections
            .read()
            .get(collection)
            .map(|c| c.partitions.contains(partition))
            .unwrap_or(false)
    }

    pub fn is_loaded(&self, collection: &str) -> bool {
        self.state
            .collections
            .read()
            .get(collection)
            .map(|c| c.loaded)
            .unwrap_or(false)
    }

    pub fn schema(&self, collection: &str) -> Option<CollectionSchema> {
        self.state
            .collections
            .read()
            .get(collection)
            .map(|c| c.schema.clone())
    }

    pub fn index_spec(&self, collection: &str, field: &str) -> Option<IndexSpec> {
        self.state
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.indexes.get(field).cloned())
    }

    /// Rows stored, sealed or not
    pub fn row_count(&self, collection: &str) -> usize {
        self.state
            .collections
            .read()
            .get(collection)
            .map(|c| c.sealed.len() + c.growing.len())
            .unwrap_or(0)
    }

    /// Rows visible to search
    pub fn sealed_row_count(&self, collection: &str) -> usize {
        self.state
            .collections
            .read()
            .get(collection)
            .map(|c| c.sealed.len())
            .unwrap_or(0)
    }

    async fn begin(&self, operation: &'static str) -> StoreResult<()> {
        let latency = *self.state.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.state.failures.remove(operation) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn rows_from_columns(
        schema: &CollectionSchema,
        partition: &str,
        columns: &[Column],
    ) -> StoreResult<Vec<StoredRow>> {
        if columns.len() != schema.fields.len() {
            return Err(StoreError::Rejected(format!(
                "collection {} expects {} columns, got {}",
                schema.collection_name,
                schema.fields.len(),
                columns.len()
            )));
        }

        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut ordered = Vec::with_capacity(columns.len());
        for definition in &schema.fields {
            let column = columns
                .iter()
                .find(|c| c.name == definition.name)
                .ok_or_else(|| {
                    StoreError::Rejected(format!("missing column {}", definition.name))
                })?;
            if column.store_type() != definition.store_type {
                return Err(StoreError::Rejected(format!(
                    "column {} has type {}, schema declares {}",
                    column.name,
                    column.store_type(),
                    definition.store_type
                )));
            }
            if column.len() != row_count {
                return Err(StoreError::Rejected(format!(
                    "column {} has {} rows, expected {}",
                    column.name,
                    column.len(),
                    row_count
                )));
            }
            if let Some(expected) = definition.vector_len() {
                let bad_row = (0..row_count)
                    .find(|&row| column.value_at(row).and_then(|v| v.vector_len()) != Some(expected));
                if let Some(row) = bad_row {
                    return Err(StoreError::Rejected(format!(
                        "the dim of vector field {} in row {} does not match {}",
                        column.name,
                        row,
                        definition.dimension().unwrap_or(0)
                    )));
                }
            }
            ordered.push(column);
        }

        Ok((0..row_count)
            .map(|row| StoredRow {
                partition: partition.to_string(),
                values: ordered
                    .iter()
                    .filter_map(|c| c.value_at(row).map(|v| (c.name.clone(), v)))
                    .collect(),
            })
            .collect())
    }

    fn build_result(
        schema: &CollectionSchema,
        output_fields: &[String],
        hits: &[(f32, &StoredRow)],
    ) -> StoreResult<SearchResult> {
        let primary_key = schema.primary_key_field.as_str();
        let mut ids = ColumnData::empty(schema.primary_key_type(), None);
        let mut fields: Vec<Column> = output_fields
            .iter()
            .filter_map(|name| schema.field(name))
            .map(|d| Column::new(d.name.clone(), ColumnData::empty(d.store_type, d.dimension())))
            .collect();

        for (_, row) in hits {
            let key = row.values.get(primary_key).cloned().ok_or_else(|| {
                StoreError::Rejected(format!("stored row has no {} value", primary_key))
            })?;
            ids.push(key).map_err(|found| corrupt_value(primary_key, &found))?;
            for column in &mut fields {
                let value = row.values.get(&column.name).cloned().ok_or_else(|| {
                    StoreError::Rejected(format!("stored row has no {} value", column.name))
                })?;
                column
                    .data
                    .push(value)
                    .map_err(|found| corrupt_value(&column.name, &found))?;
            }
        }

        Ok(SearchResult {
            result_count: hits.len(),
            fields,
            scores: hits.iter().map(|(score, _)| *score).collect(),
            ids: Some(Column::new(primary_key, ids)),
        })
    }
}

fn corrupt_value(field: &str, found: &FieldValue) -> StoreError {
    StoreError::Rejected(format!(
        "stored {} value of field {} does not match its column type",
        found.semantic_type(),
        field
    ))
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn create_collection(&self, schema: &CollectionSchema, shard_count: u32) -> StoreResult<()> {
        self.begin("create_collection").await?;
        if shard_count == 0 {
            return Err(StoreError::Rejected("shard count must be positive".to_string()));
        }
        if schema.primary_key().is_none() {
            return Err(StoreError::Rejected(format!(
                "collection {} has no primary key field",
                schema.collection_name
            )));
        }

        let mut collections = self.state.collections.write();
        if collections.contains_key(&schema.collection_name) {
            return Err(StoreError::AlreadyExists(format!(
                "collection {} already exists",
                schema.collection_name
            )));
        }
        collections.insert(
            schema.collection_name.clone(),
            MemoryCollection {
                schema: schema.clone(),
                partitions: BTreeSet::from([DEFAULT_PARTITION.to_string()]),
                indexes: HashMap::new(),
                loaded: false,
                sealed: Vec::new(),
                growing: Vec::new(),
            },
        );
        info!("🆕 Memory store created collection: {}", schema.collection_name);
        Ok(())
    }

    async fn create_partition(&self, collection: &str, partition: &str) -> StoreResult<()> {
        self.begin("create_partition").await?;
        let mut collections = self.state.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        if !entry.partitions.insert(partition.to_string()) {
            return Err(StoreError::AlreadyExists(format!(
                "partition {} already exists",
                partition
            )));
        }
        Ok(())
    }

    async fn get_index_state(&self, collection: &str, field: &str) -> StoreResult<IndexState> {
        self.begin("get_index_state").await?;
        let collections = self.state.collections.read();
        let entry = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        if entry.schema.field(field).is_none() {
            return Err(StoreError::NotFound(format!("field {} not found", field)));
        }
        Ok(if entry.indexes.contains_key(field) {
            IndexState::Finished
        } else {
            IndexState::Absent
        })
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        index: &IndexSpec,
        _sync: bool,
    ) -> StoreResult<()> {
        self.begin("create_index").await?;
        let mut collections = self.state.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        let definition = entry
            .schema
            .field(field)
            .ok_or_else(|| StoreError::NotFound(format!("field {} not found", field)))?;

        if !index.index_type.supports(definition.store_type)
            || !index.metric.supports(definition.store_type)
        {
            return Err(StoreError::Rejected(format!(
                "index {} with metric {} cannot be built on {} field {}",
                index.index_type, index.metric, definition.store_type, field
            )));
        }
        if entry.indexes.contains_key(field) {
            return Err(StoreError::AlreadyExists(format!(
                "index on {} already exists",
                field
            )));
        }

        entry.indexes.insert(field.to_string(), index.clone());
        *self.state.index_builds.entry(collection.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn insert(&self, collection: &str, partition: &str, columns: &[Column]) -> StoreResult<usize> {
        self.begin("insert").await?;
        let mut collections = self.state.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        if !entry.partitions.contains(partition) {
            return Err(StoreError::NotFound(format!("partition {} not found", partition)));
        }

        let rows = Self::rows_from_columns(&entry.schema, partition, columns)?;
        let inserted = rows.len();
        entry.growing.extend(rows);
        debug!("📥 Memory store buffered {} row(s) in {}", inserted, collection);
        Ok(inserted)
    }

    async fn flush(&self, collection: &str, _sync: bool) -> StoreResult<()> {
        self.begin("flush").await?;
        let mut collections = self.state.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        let sealed = entry.growing.len();
        let mut growing = std::mem::take(&mut entry.growing);
        entry.sealed.append(&mut growing);
        *self.state.flushes.entry(collection.to_string()).or_insert(0) += 1;
        debug!("💾 Memory store sealed {} row(s) in {}", sealed, collection);
        Ok(())
    }

    async fn load_collection(&self, collection: &str, _sync: bool) -> StoreResult<()> {
        self.begin("load_collection").await?;
        let mut collections = self.state.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        entry.loaded = true;
        Ok(())
    }

    async fn search(&self, request: &VectorSearch) -> StoreResult<Vec<SearchResult>> {
        self.begin("search").await?;
        let filter = Filter::parse(&request.expression)?;
        if request.top_k == 0 {
            return Err(StoreError::Rejected("topk must be positive".to_string()));
        }

        let collections = self.state.collections.read();
        let entry = collections
            .get(&request.collection)
            .ok_or_else(|| collection_not_found(&request.collection))?;
        if !entry.loaded {
            return Err(StoreError::Rejected(format!(
                "collection {} not loaded",
                request.collection
            )));
        }

        let schema = &entry.schema;
        let field = schema
            .field(&request.vector_field)
            .filter(|f| f.store_type.is_vector())
            .ok_or_else(|| {
                StoreError::Rejected(format!("{} is not a vector field", request.vector_field))
            })?;
        if !request.metric.supports(field.store_type) {
            return Err(StoreError::Rejected(format!(
                "metric {} does not apply to {} field {}",
                request.metric, field.store_type, field.name
            )));
        }
        if let Some(index) = entry.indexes.get(&field.name) {
            if index.metric != request.metric {
                return Err(StoreError::Rejected(format!(
                    "metric type not match: index uses {}, search uses {}",
                    index.metric, request.metric
                )));
            }
        }
        if let Some(missing) = request
            .partitions
            .iter()
            .find(|p| !entry.partitions.contains(*p))
        {
            return Err(StoreError::NotFound(format!("partition {} not found", missing)));
        }
        if let Some(missing) = request
            .output_fields
            .iter()
            .find(|name| schema.field(name).is_none())
        {
            return Err(StoreError::Rejected(format!("field {} not exist", missing)));
        }

        let mut candidates = Vec::new();
        for row in &entry.sealed {
            if !request.partitions.is_empty() && !request.partitions.contains(&row.partition) {
                continue;
            }
            if filter.matches(|name| row.values.get(name))? {
                candidates.push(row);
            }
        }

        let expected = field.vector_len();
        let mut results = Vec::with_capacity(request.vectors.len());
        for query in &request.vectors {
            if Some(query.len()) != expected {
                return Err(StoreError::Rejected(format!(
                    "query vector has {} elements, field {} expects {}",
                    query.len(),
                    field.name,
                    expected.unwrap_or(0)
                )));
            }

            let mut scored: Vec<(f32, &StoredRow)> = candidates
                .iter()
                .filter_map(|row| {
                    row.values
                        .get(&field.name)
                        .and_then(|v| distance::score(request.metric, query, v))
                        .map(|score| (score, *row))
                })
                .collect();
            scored.sort_by(|a, b| distance::rank(request.metric, a.0, b.0));
            scored.truncate(request.top_k);

            results.push(Self::build_result(schema, &request.output_fields, &scored)?);
        }

        debug!(
            "🔍 Memory store searched {} ({} candidate row(s), {} quer(ies))",
            request.collection,
            candidates.len(),
            request.vectors.len()
        );
        Ok(results)
    }

    async fn delete_by_primary_key(
        &self,
        collection: &str,
        partition: &str,
        keys: &Column,
    ) -> StoreResult<usize> {
        self.begin("delete").await?;
        let mut collections = self.state.collections.write();
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        if !entry.partitions.contains(partition) {
            return Err(StoreError::NotFound(format!("partition {} not found", partition)));
        }

        let primary_key = entry.schema.primary_key_field.clone();
        if keys.store_type() != entry.schema.primary_key_type() {
            return Err(StoreError::Rejected(format!(
                "primary key {} is {}, got {} keys",
                primary_key,
                entry.schema.primary_key_type(),
                keys.store_type()
            )));
        }

        let doomed: HashSet<PrimaryKey> = (0..keys.len())
            .filter_map(|row| keys.value_at(row))
            .filter_map(PrimaryKey::from_field_value)
            .collect();
        let matches = |row: &StoredRow| {
            row.partition == partition
                && row
                    .values
                    .get(&primary_key)
                    .cloned()
                    .and_then(PrimaryKey::from_field_value)
                    .map(|key| doomed.contains(&key))
                    .unwrap_or(false)
        };

        let before = entry.sealed.len() + entry.growing.len();
        entry.sealed.retain(|row| !matches(row));
        entry.growing.retain(|row| !matches(row));
        let removed = before - entry.sealed.len() - entry.growing.len();
        debug!("🗑️ Memory store deleted {} row(s) from {}", removed, collection);
        Ok(removed)
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<()> {
        self.begin("drop_collection").await?;
        self.state
            .collections
            .write()
            .remove(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        info!("🗑️ Memory store dropped collection: {}", collection);
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// A connection handed out by [`MemoryStore::connect`]
struct MemoryConnection {
    store: MemoryStore,
    closed: AtomicBool,
}

impl MemoryConnection {
    fn open(store: MemoryStore) -> Self {
        store.state.open_connections.fetch_add(1, Ordering::SeqCst);
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn release(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store
                .state
                .open_connections
                .fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl RemoteStore for MemoryConnection {
    async fn create_collection(&self, schema: &CollectionSchema, shard_count: u32) -> StoreResult<()> {
        self.check()?;
        self.store.create_collection(schema, shard_count).await
    }

    async fn create_partition(&self, collection: &str, partition: &str) -> StoreResult<()> {
        self.check()?;
        self.store.create_partition(collection, partition).await
    }

    async fn get_index_state(&self, collection: &str, field: &str) -> StoreResult<IndexState> {
        self.check()?;
        self.store.get_index_state(collection, field).await
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        index: &IndexSpec,
        sync: bool,
    ) -> StoreResult<()> {
        self.check()?;
        self.store.create_index(collection, field, index, sync).await
    }

    async fn insert(&self, collection: &str, partition: &str, columns: &[Column]) -> StoreResult<usize> {
        self.check()?;
        self.store.insert(collection, partition, columns).await
    }

    async fn flush(&self, collection: &str, sync: bool) -> StoreResult<()> {
        self.check()?;
        self.store.flush(collection, sync).await
    }

    async fn load_collection(&self, collection: &str, sync: bool) -> StoreResult<()> {
        self.check()?;
        self.store.load_collection(collection, sync).await
    }

    async fn search(&self, request: &VectorSearch) -> StoreResult<Vec<SearchResult>> {
        self.check()?;
        self.store.search(request).await
    }

    async fn delete_by_primary_key(
        &self,
        collection: &str,
        partition: &str,
        keys: &Column,
    ) -> StoreResult<usize> {
        self.check()?;
        self.store.delete_by_primary_key(collection, partition, keys).await
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<()> {
        self.check()?;
        self.store.drop_collection(collection).await
    }

    async fn close(&self) -> StoreResult<()> {
        self.release();
        Ok(())
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self, address: &str) -> StoreResult<Arc<dyn RemoteStore>> {
        self.state.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.state.addresses.lock().push(address.to_string());

        let behavior = self.state.behavior.lock().clone();
        match behavior {
            ConnectBehavior::Accept => {}
            ConnectBehavior::Delay(delay) => tokio::time::sleep(delay).await,
            ConnectBehavior::Refuse(message) => return Err(StoreError::Unavailable(message)),
            ConnectBehavior::DeadlineExceeded => {
                return Err(StoreError::DeadlineExceeded(format!("connect to {}", address)))
            }
            ConnectBehavior::Hang => {
                std::future::pending::<()>().await;
                return Err(StoreError::Unavailable(address.to_string()));
            }
        }

        Ok(Arc::new(MemoryConnection::open(self.clone())))
    }
}
