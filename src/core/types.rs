use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{FieldValue, StoreType};

/// Partition used when none is configured
pub const DEFAULT_PARTITION: &str = "_default";

/// Port appended to store addresses given without one
pub const DEFAULT_STORE_PORT: u16 = 19530;

/// A primary-key value accepted by delete operations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryKey {
    Int64(i64),
    VarChar(String),
}

impl PrimaryKey {
    pub fn store_type(&self) -> StoreType {
        match self {
            PrimaryKey::Int64(_) => StoreType::Int64,
            PrimaryKey::VarChar(_) => StoreType::VarChar,
        }
    }

    /// Extract a key from a document field value; `None` for non-key kinds
    pub fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int64(v) => Some(PrimaryKey::Int64(v)),
            FieldValue::VarChar(v) => Some(PrimaryKey::VarChar(v)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int64(v) => write!(f, "{}", v),
            PrimaryKey::VarChar(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        PrimaryKey::Int64(value)
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        PrimaryKey::VarChar(value)
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::VarChar(value.to_string())
    }
}

/// Append the default port when `address` carries none
pub fn normalize_address(address: &str) -> String {
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, DEFAULT_STORE_PORT)
    }
}
