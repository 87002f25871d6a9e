// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Collection Client - typed document operations against one collection
//!
//! The client is the only component that talks to the store. It handles:
//! - Schema, partition and index creation, all idempotent
//! - Insert through the column marshaller, followed by the configured flush policy
//! - Similarity search through the output-field selector and column unmarshaller
//! - Delete by primary key, or by whole documents
//!
//! ## Design Principles:
//! - Layout, schema and output fields are derived once at construction; a bad field
//!   declaration is a returned `ConfigError`, never a panic
//! - Every remote call is bounded by the request timeout
//! - One client operation holds one connection lease from start to finish

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::connection::{ConnectionManager, ConnectionState, ConnectionStrategy, Lease};
use super::flush::{FlushPolicy, FlushTracker};
use super::search::{Hit, SearchRequest};
use crate::columnar::{marshal, unmarshal_batch, Column, DimensionMismatchPolicy};
use crate::core::config::ClientConfig;
use crate::core::errors::{ConfigError, MarshalAnomaly, MarshalError, OrmError, StoreResult};
use crate::core::types::PrimaryKey;
use crate::schema::{
    default_collection_name, select_output_fields, CollectionSchema, Document, DocumentLayout,
    StoreType,
};
use crate::store::{IndexSpec, RemoteStore, StoreConnector, VectorSearch};

/// What an insert did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertOutcome {
    /// Rows accepted by the store
    pub inserted: usize,
    /// Vector length anomalies found while marshalling
    pub anomalies: Vec<MarshalAnomaly>,
    /// Whether a flush followed the insert and succeeded. A failed flush leaves the
    /// rows stored but not yet searchable; the next flush makes them visible.
    pub flushed: bool,
}

/// Builder for [`CollectionClient`], mirroring the `With*` options of the client
pub struct CollectionClientBuilder<T: Document> {
    connector: Arc<dyn StoreConnector>,
    config: ClientConfig,
    collection_name: Option<String>,
    partition_name: Option<String>,
    index: Option<IndexSpec>,
    flush_tracker: Option<Arc<FlushTracker>>,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> CollectionClientBuilder<T> {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Override the collection name derived from the document type
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn partition_name(mut self, name: impl Into<String>) -> Self {
        self.partition_name = Some(name.into());
        self
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.index = Some(index);
        self
    }

    /// Share flush bookkeeping with other clients of the same collection
    pub fn flush_tracker(mut self, tracker: Arc<FlushTracker>) -> Self {
        self.flush_tracker = Some(tracker);
        self
    }

    pub fn connection_strategy(mut self, strategy: ConnectionStrategy) -> Self {
        self.config.connection_strategy = strategy;
        self
    }

    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.config.flush_policy = policy;
        self
    }

    pub fn dimension_mismatch(mut self, policy: DimensionMismatchPolicy) -> Self {
        self.config.dimension_mismatch = policy;
        self
    }

    /// Derive layout, schema and output fields and build the client
    pub fn build(self) -> Result<CollectionClient<T>, OrmError> {
        let mut config = self.config;
        if let Some(partition) = self.partition_name {
            config.partition_name = partition;
        }
        if let Some(name) = self.collection_name {
            config.collection_name = Some(name);
        }
        config.validate()?;

        let layout = T::layout()?;
        let collection_name = config
            .collection_name
            .clone()
            .unwrap_or_else(|| default_collection_name(T::type_name()));
        let schema = CollectionSchema::synthesize(&layout, collection_name)?;
        let index = self.index.unwrap_or_else(|| {
            schema
                .index_definition()
                .map(|field| IndexSpec::auto_for(field.store_type))
                .unwrap_or_else(IndexSpec::auto)
        });
        let output_fields = select_output_fields(&layout);

        let connection = ConnectionManager::new(
            self.connector,
            config.normalized_address(),
            config.connection_strategy,
            config.connect_timeout(),
        );

        info!(
            "🆕 Collection client ready: {} (partition {}, {} field(s), output {:?})",
            schema.collection_name,
            config.partition_name,
            schema.fields.len(),
            output_fields
        );

        Ok(CollectionClient {
            config,
            layout,
            schema,
            output_fields,
            index,
            connection,
            flush_tracker: self.flush_tracker.unwrap_or_else(FlushTracker::shared),
            _document: PhantomData,
        })
    }
}

/// Typed access to one collection of `T` documents
pub struct CollectionClient<T: Document> {
    config: ClientConfig,
    layout: Arc<DocumentLayout>,
    schema: CollectionSchema,
    output_fields: Vec<String>,
    index: IndexSpec,
    connection: ConnectionManager,
    flush_tracker: Arc<FlushTracker>,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> CollectionClient<T> {
    pub fn builder<C: StoreConnector + 'static>(connector: C) -> CollectionClientBuilder<T> {
        Self::builder_with(Arc::new(connector))
    }

    pub fn builder_with(connector: Arc<dyn StoreConnector>) -> CollectionClientBuilder<T> {
        CollectionClientBuilder {
            connector,
            config: ClientConfig::default(),
            collection_name: None,
            partition_name: None,
            index: None,
            flush_tracker: None,
            _document: PhantomData,
        }
    }

    pub fn new<C: StoreConnector + 'static>(config: ClientConfig, connector: C) -> Result<Self, OrmError> {
        Self::builder(connector).config(config).build()
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn output_fields(&self) -> &[String] {
        &self.output_fields
    }

    pub fn collection_name(&self) -> &str {
        &self.schema.collection_name
    }

    pub fn partition_name(&self) -> &str {
        &self.config.partition_name
    }

    pub fn index_field(&self) -> Option<&str> {
        self.schema.index_field.as_deref()
    }

    pub fn index_spec(&self) -> &IndexSpec {
        &self.index
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn flush_tracker(&self) -> &Arc<FlushTracker> {
        &self.flush_tracker
    }

    /// Normalized store address
    pub fn address(&self) -> &str {
        self.connection.address()
    }

    pub fn connection_strategy(&self) -> ConnectionStrategy {
        self.connection.strategy()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Run one remote call under the request timeout
    async fn call<R>(
        &self,
        operation: &'static str,
        future: impl Future<Output = StoreResult<R>>,
    ) -> Result<R, OrmError> {
        match tokio::time::timeout(self.config.request_timeout(), future).await {
            Ok(result) => result.map_err(|source| OrmError::Remote { operation, source }),
            Err(_) => {
                warn!(
                    "⏰ {} on {} timed out after {}ms",
                    operation, self.schema.collection_name, self.config.request_timeout_ms
                );
                Err(OrmError::Timeout {
                    operation,
                    timeout_ms: self.config.request_timeout_ms,
                })
            }
        }
    }

    /// Run a create call, treating "already exists" as success. Returns whether
    /// something was created.
    async fn call_idempotent(
        &self,
        operation: &'static str,
        future: impl Future<Output = StoreResult<()>>,
    ) -> Result<bool, OrmError> {
        match self.call(operation, future).await {
            Ok(()) => Ok(true),
            Err(OrmError::Remote { source, .. }) if source.is_already_exists() => {
                debug!("{} on {}: already exists", operation, self.schema.collection_name);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn acquire(&self) -> Result<Lease, OrmError> {
        self.connection.acquire().await
    }

    /// Ensure the collection, partition and index exist. Safe to call repeatedly.
    pub async fn create(&self) -> Result<(), OrmError> {
        let lease = self.acquire().await?;
        let result = self.create_with(lease.store()).await;
        lease.release().await;
        result
    }

    async fn create_with(&self, store: &dyn RemoteStore) -> Result<(), OrmError> {
        let name = self.schema.collection_name.as_str();
        info!("🆕 Creating collection: {}", name);
        let start_time = Instant::now();

        let created = self
            .call_idempotent(
                "create_collection",
                store.create_collection(&self.schema, self.config.shard_count),
            )
            .await?;
        self.call_idempotent(
            "create_partition",
            store.create_partition(name, &self.config.partition_name),
        )
        .await?;

        if let Some(field) = self.schema.index_field.as_deref() {
            let state = self
                .call("get_index_state", store.get_index_state(name, field))
                .await?;
            if state.is_absent() {
                self.call_idempotent(
                    "create_index",
                    store.create_index(name, field, &self.index, true),
                )
                .await?;
                info!("📇 Created {} index on {}.{}", self.index.index_type, name, field);
            } else {
                debug!("📇 Index on {}.{} is {:?}", name, field, state);
            }
        }

        info!(
            "✅ Collection {}: {} in {}μs",
            name,
            if created { "created" } else { "already present" },
            start_time.elapsed().as_micros()
        );
        Ok(())
    }

    /// Insert documents, then flush according to the flush policy
    pub async fn insert(&self, documents: &[T]) -> Result<InsertOutcome, OrmError> {
        let name = self.schema.collection_name.as_str();
        if documents.is_empty() {
            debug!("📥 Nothing to insert into {}", name);
            return Ok(InsertOutcome::default());
        }

        let outcome = marshal(&self.schema, documents, self.config.dimension_mismatch)?;
        if outcome.row_count == 0 {
            warn!("⚠️ Every row of the batch for {} was dropped", name);
            return Ok(InsertOutcome {
                inserted: 0,
                anomalies: outcome.anomalies,
                flushed: false,
            });
        }

        let lease = self.acquire().await?;
        let result = self.insert_with(lease.store(), &outcome.columns).await;
        lease.release().await;
        let (inserted, flushed) = result?;

        Ok(InsertOutcome {
            inserted,
            anomalies: outcome.anomalies,
            flushed,
        })
    }

    async fn insert_with(
        &self,
        store: &dyn RemoteStore,
        columns: &[Column],
    ) -> Result<(usize, bool), OrmError> {
        let name = self.schema.collection_name.as_str();
        let start_time = Instant::now();

        let inserted = self
            .call(
                "insert",
                store.insert(name, &self.config.partition_name, columns),
            )
            .await?;
        info!(
            "📥 Inserted {} row(s) into {} in {}μs",
            inserted,
            name,
            start_time.elapsed().as_micros()
        );

        let should_flush = match self.config.flush_policy {
            FlushPolicy::Always => {
                self.flush_tracker.record(name);
                true
            }
            FlushPolicy::Throttled => self
                .flush_tracker
                .try_claim(name, self.config.flush_interval()),
            FlushPolicy::Never => false,
        };

        if !should_flush {
            return Ok((inserted, false));
        }
        // The rows are stored already; a failed flush only delays their visibility
        match self.call("flush", store.flush(name, true)).await {
            Ok(()) => {
                debug!("💾 Flushed {}", name);
                Ok((inserted, true))
            }
            Err(e) => {
                self.flush_tracker.forget(name);
                warn!(
                    "⚠️ Flush after inserting {} row(s) into {} failed: {}",
                    inserted, name, e
                );
                Ok((inserted, false))
            }
        }
    }

    /// Flush the collection now, regardless of the flush policy
    pub async fn flush(&self) -> Result<(), OrmError> {
        let name = self.schema.collection_name.as_str();
        let lease = self.acquire().await?;
        let result = self.call("flush", lease.store().flush(name, true)).await;
        lease.release().await;
        result?;
        self.flush_tracker.record(name);
        debug!("💾 Flushed {}", name);
        Ok(())
    }

    /// Search with every query vector of `request`, hits concatenated in query order
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Hit<T>>, OrmError> {
        Ok(self
            .search_batch(request)
            .await?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Search with every query vector of `request`, one hit list per query vector
    pub async fn search_batch(&self, request: &SearchRequest) -> Result<Vec<Vec<Hit<T>>>, OrmError> {
        let name = self.schema.collection_name.as_str();
        let vector_field = self
            .schema
            .index_field
            .clone()
            .ok_or_else(|| ConfigError::NoIndexField {
                collection: name.to_string(),
            })?;
        if request.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let top_k = request.top_k.unwrap_or(self.config.search.top_k);
        if top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_k".to_string(),
                value: top_k.to_string(),
            }
            .into());
        }
        let mut params = self.config.search.params.clone();
        params.extend(request.params.clone());

        let search = VectorSearch {
            collection: name.to_string(),
            partitions: vec![self.config.partition_name.clone()],
            expression: request.expression.clone(),
            output_fields: self.output_fields.clone(),
            vectors: request.vectors.clone(),
            vector_field,
            metric: request
                .metric
                .or(self.config.search.metric)
                .unwrap_or(self.index.metric),
            top_k,
            params,
        };

        debug!(
            "🔍 Searching {} with {} vector(s), top_k {}, metric {}",
            name,
            search.vectors.len(),
            search.top_k,
            search.metric
        );
        let start_time = Instant::now();

        let lease = self.acquire().await?;
        let result = self.search_with(lease.store(), &search).await;
        lease.release().await;
        let results = result?;

        let documents: Vec<Vec<T>> = unmarshal_batch(&self.layout, &results)?;
        let hits: Vec<Vec<Hit<T>>> = documents
            .into_iter()
            .zip(&results)
            .map(|(documents, result)| {
                documents
                    .into_iter()
                    .enumerate()
                    .map(|(row, document)| Hit {
                        document,
                        score: result.scores.get(row).copied(),
                    })
                    .collect()
            })
            .collect();

        info!(
            "🔍 Search on {} returned {} hit(s) in {}μs",
            name,
            hits.iter().map(Vec::len).sum::<usize>(),
            start_time.elapsed().as_micros()
        );
        Ok(hits)
    }

    async fn search_with(
        &self,
        store: &dyn RemoteStore,
        search: &VectorSearch,
    ) -> Result<Vec<crate::columnar::SearchResult>, OrmError> {
        self.call("load_collection", store.load_collection(&search.collection, false))
            .await?;
        self.call("search", store.search(search)).await
    }

    /// Delete documents by primary key; returns the number the store removed
    pub async fn delete(&self, keys: &[PrimaryKey]) -> Result<usize, OrmError> {
        let expected = self.schema.primary_key_type();
        if let Some(key) = keys.iter().find(|k| k.store_type() != expected) {
            return Err(OrmError::UnsupportedKeyType {
                expected: expected.to_string(),
                found: key.store_type().to_string(),
            });
        }
        if keys.is_empty() {
            return Ok(0);
        }

        let key_name = self.schema.primary_key_field.clone();
        let column = match expected {
            StoreType::VarChar => Column::varchar(
                key_name,
                keys.iter()
                    .filter_map(|k| match k {
                        PrimaryKey::VarChar(v) => Some(v.clone()),
                        PrimaryKey::Int64(_) => None,
                    })
                    .collect(),
            ),
            _ => Column::int64(
                key_name,
                keys.iter()
                    .filter_map(|k| match k {
                        PrimaryKey::Int64(v) => Some(*v),
                        PrimaryKey::VarChar(_) => None,
                    })
                    .collect(),
            ),
        };

        let name = self.schema.collection_name.as_str();
        info!("🗑️ Deleting {} key(s) from {}", keys.len(), name);
        let lease = self.acquire().await?;
        let result = self
            .call(
                "delete",
                lease
                    .store()
                    .delete_by_primary_key(name, &self.config.partition_name, &column),
            )
            .await;
        lease.release().await;
        let removed = result?;
        debug!("🗑️ Removed {} row(s) from {}", removed, name);
        Ok(removed)
    }

    /// Delete documents by value: their primary keys are read from the documents
    pub async fn remove(&self, documents: &[T]) -> Result<usize, OrmError> {
        let key_field = self.schema.primary_key_field.as_str();
        let expected = self.schema.primary_key_type();

        let mut keys = Vec::with_capacity(documents.len());
        for (row, document) in documents.iter().enumerate() {
            let value = document
                .field_value(key_field)
                .ok_or_else(|| MarshalError::MissingFieldValue {
                    row,
                    field: key_field.to_string(),
                })?;
            let found = value.semantic_type();
            let key = PrimaryKey::from_field_value(value).ok_or_else(|| {
                OrmError::UnsupportedKeyType {
                    expected: expected.to_string(),
                    found: found.to_string(),
                }
            })?;
            keys.push(key);
        }
        self.delete(&keys).await
    }

    /// Drop the remote collection
    pub async fn drop_collection(&self) -> Result<(), OrmError> {
        let name = self.schema.collection_name.as_str();
        info!("🗑️ Dropping collection: {}", name);
        let lease = self.acquire().await?;
        let result = self
            .call("drop_collection", lease.store().drop_collection(name))
            .await;
        lease.release().await;
        result?;
        self.flush_tracker.forget(name);
        info!("✅ Collection dropped: {}", name);
        Ok(())
    }

    /// Release the cached connection; later operations reconnect
    pub async fn close(&self) -> Result<(), OrmError> {
        self.connection.close().await
    }
}
