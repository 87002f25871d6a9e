// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Flush policy and per-collection flush bookkeeping
//!
//! Flushing after every insert creates many small segments in the store; never
//! flushing leaves inserted rows invisible until the store seals them on its own.
//! [`FlushPolicy::Throttled`] flushes at most once per interval per collection name.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// When an insert is followed by a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// After every insert
    Always,
    /// When more than the flush interval has passed since the last flush
    #[default]
    Throttled,
    /// Only on explicit `flush()`
    Never,
}

/// Last flush instant per collection name.
///
/// Owned by a collection client; share one tracker between clients of the same
/// collection through `Arc` so they throttle together.
#[derive(Debug, Default)]
pub struct FlushTracker {
    last_flush: DashMap<String, Instant>,
}

impl FlushTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Claim the next flush of `collection` if more than `interval` has passed since
    /// the last one. A successful claim records the current instant; of several
    /// concurrent callers inside one interval exactly one wins.
    pub fn try_claim(&self, collection: &str, interval: Duration) -> bool {
        let now = Instant::now();
        match self.last_flush.entry(collection.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) > interval {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Record an unconditional flush
    pub fn record(&self, collection: &str) {
        self.last_flush.insert(collection.to_string(), Instant::now());
    }

    pub fn last_flush(&self, collection: &str) -> Option<Instant> {
        self.last_flush.get(collection).map(|entry| *entry.value())
    }

    /// Drop the entry so the next throttled insert flushes
    pub fn forget(&self, collection: &str) {
        self.last_flush.remove(collection);
    }

    /// Number of collection names tracked
    pub fn len(&self) -> usize {
        self.last_flush.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_flush.is_empty()
    }
}
