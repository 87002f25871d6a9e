use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::errors::ConfigError;
use super::types::{normalize_address, DEFAULT_PARTITION};
use crate::client::{ConnectionStrategy, FlushPolicy};
use crate::columnar::DimensionMismatchPolicy;
use crate::store::MetricType;

/// Collection client configuration.
///
/// Every field has a default, so a TOML file only needs the keys it overrides:
///
/// ```toml
/// address = "milvus.lan"
/// partition_name = "articles_2025"
/// connection_strategy = "cached"
/// flush_policy = "throttled"
/// flush_interval_ms = 1000
/// dimension_mismatch = "reject"
///
/// [search]
/// top_k = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Store address, `host` or `host:port`
    pub address: String,
    /// Overrides the collection name derived from the document type
    pub collection_name: Option<String>,
    pub partition_name: String,
    pub shard_count: u32,
    pub connection_strategy: ConnectionStrategy,
    pub connect_timeout_ms: u64,
    /// Deadline applied to every remote call
    pub request_timeout_ms: u64,
    pub flush_policy: FlushPolicy,
    /// Minimum spacing between throttled flushes of one collection
    pub flush_interval_ms: u64,
    pub dimension_mismatch: DimensionMismatchPolicy,
    pub search: SearchDefaults,
}

/// Defaults applied to search requests that leave a parameter unset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    /// Overrides the index metric for searches that name none
    pub metric: Option<MetricType>,
    pub top_k: usize,
    /// Index-specific search parameters, passed through to the store
    pub params: HashMap<String, String>,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            metric: None,
            top_k: 10,
            params: HashMap::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "localhost:19530".to_string(),
            collection_name: None,
            partition_name: DEFAULT_PARTITION.to_string(),
            shard_count: 1,
            connection_strategy: ConnectionStrategy::Cached,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            flush_policy: FlushPolicy::Throttled,
            flush_interval_ms: 1_000,
            dimension_mismatch: DimensionMismatchPolicy::Reject,
            search: SearchDefaults::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<ClientConfig>(source)
            .map_err(|e| ConfigError::TomlParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(invalid("address", &self.address));
        }
        if self.partition_name.trim().is_empty() {
            return Err(invalid("partition_name", &self.partition_name));
        }
        if let Some(name) = &self.collection_name {
            if name.trim().is_empty() {
                return Err(invalid("collection_name", name));
            }
        }
        if self.shard_count == 0 {
            return Err(invalid("shard_count", self.shard_count));
        }
        if self.connect_timeout_ms == 0 {
            return Err(invalid("connect_timeout_ms", self.connect_timeout_ms));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", self.request_timeout_ms));
        }
        if self.search.top_k == 0 {
            return Err(invalid("search.top_k", self.search.top_k));
        }
        Ok(())
    }

    /// Address with the default port filled in
    pub fn normalized_address(&self) -> String {
        normalize_address(self.address.trim())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
