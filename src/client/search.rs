// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Search request builder and hits

use std::collections::HashMap;

use crate::store::{MetricType, QueryVector};

/// A similarity search against the index field.
///
/// Unset parameters fall back to the client's `search` configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchRequest {
    pub vectors: Vec<QueryVector>,
    pub metric: Option<MetricType>,
    /// Scalar filter; empty means none
    pub expression: String,
    pub top_k: Option<usize>,
    /// Index-specific search parameters, merged over the configured ones
    pub params: HashMap<String, String>,
}

impl SearchRequest {
    pub fn new(vector: impl Into<QueryVector>) -> Self {
        Self {
            vectors: vec![vector.into()],
            ..Self::default()
        }
    }

    /// One request carrying several query vectors
    pub fn batch<V: Into<QueryVector>>(vectors: impl IntoIterator<Item = V>) -> Self {
        Self {
            vectors: vectors.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn metric(mut self, metric: MetricType) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }
}

/// One search hit: the rebuilt document and its score, when the store sent one
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<T> {
    pub document: T,
    pub score: Option<f32>,
}
