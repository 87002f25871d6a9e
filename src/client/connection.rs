// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Connection acquisition for the collection client
//!
//! Two strategies:
//! - [`ConnectionStrategy::PerCall`]: connect, run one client operation, close.
//! - [`ConnectionStrategy::Cached`]: connect once and share the handle. The first
//!   attempt runs inside a `tokio::sync::OnceCell`; concurrent callers wait for it and
//!   share its outcome, success or failure. A failed outcome is discarded afterwards so
//!   the next operation tries again.
//!
//! Connection attempts are bounded by the connect timeout and fail with
//! [`OrmError::ConnectTimeout`] when it elapses, distinct from
//! [`OrmError::Connection`] for a store that answered with an error.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::core::errors::{OrmError, StoreError};
use crate::store::{RemoteStore, StoreConnector};

/// How the client obtains store connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStrategy {
    /// A fresh connection for every client operation
    PerCall,
    /// One shared connection, established on first use
    #[default]
    Cached,
}

/// Lifecycle state of the client's connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connected,
    /// Closed explicitly; the next operation reconnects
    Closed,
}

type ConnectOutcome = Result<Arc<dyn RemoteStore>, OrmError>;

/// A store handle held for the duration of one client operation
pub(crate) struct Lease {
    store: Arc<dyn RemoteStore>,
    owned: bool,
}

impl Lease {
    pub(crate) fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    /// Close the connection when it belongs to this lease alone
    pub(crate) async fn release(self) {
        if self.owned {
            if let Err(e) = self.store.close().await {
                warn!("⚠️ Failed to close per-call connection: {}", e);
            }
        }
    }
}

pub(crate) struct ConnectionManager {
    connector: Arc<dyn StoreConnector>,
    address: String,
    strategy: ConnectionStrategy,
    connect_timeout: Duration,
    cell: Mutex<Arc<OnceCell<ConnectOutcome>>>,
    closed: AtomicBool,
}

impl ConnectionManager {
    pub(crate) fn new(
        connector: Arc<dyn StoreConnector>,
        address: String,
        strategy: ConnectionStrategy,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            address,
            strategy,
            connect_timeout,
            cell: Mutex::new(Arc::new(OnceCell::new())),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn strategy(&self) -> ConnectionStrategy {
        self.strategy
    }

    async fn open(&self) -> ConnectOutcome {
        let started = Instant::now();
        let timeout_ms = self.connect_timeout.as_millis() as u64;
        debug!("🔌 Connecting to {} ({:?})", self.address, self.strategy);

        match tokio::time::timeout(self.connect_timeout, self.connector.connect(&self.address)).await {
            Ok(Ok(store)) => {
                info!("🔌 Connected to {} in {:?}", self.address, started.elapsed());
                Ok(store)
            }
            Ok(Err(StoreError::DeadlineExceeded(message))) => {
                error!("⏰ Connecting to {} exceeded its deadline: {}", self.address, message);
                Err(OrmError::ConnectTimeout {
                    address: self.address.clone(),
                    timeout_ms,
                })
            }
            Ok(Err(e)) => {
                error!("❌ Failed to connect to {}: {}", self.address, e);
                Err(OrmError::Connection {
                    address: self.address.clone(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                error!(
                    "⏰ Connecting to {} timed out after {}ms",
                    self.address, timeout_ms
                );
                Err(OrmError::ConnectTimeout {
                    address: self.address.clone(),
                    timeout_ms,
                })
            }
        }
    }

    pub(crate) async fn acquire(&self) -> Result<Lease, OrmError> {
        match self.strategy {
            ConnectionStrategy::PerCall => {
                let store = self.open().await?;
                self.closed.store(false, Ordering::SeqCst);
                Ok(Lease { store, owned: true })
            }
            ConnectionStrategy::Cached => {
                let cell = self.cell.lock().clone();
                let outcome = cell.get_or_init(|| self.open()).await.clone();
                match outcome {
                    Ok(store) => {
                        self.closed.store(false, Ordering::SeqCst);
                        Ok(Lease { store, owned: false })
                    }
                    Err(e) => {
                        let mut current = self.cell.lock();
                        if Arc::ptr_eq(&current, &cell) {
                            *current = Arc::new(OnceCell::new());
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    /// Release the cached connection; the next operation reconnects
    pub(crate) async fn close(&self) -> Result<(), OrmError> {
        let previous = std::mem::replace(&mut *self.cell.lock(), Arc::new(OnceCell::new()));
        self.closed.store(true, Ordering::SeqCst);

        if let Some(Ok(store)) = previous.get() {
            store.close().await.map_err(|source| OrmError::Remote {
                operation: "close",
                source,
            })?;
            info!("🔌 Closed connection to {}", self.address);
        }
        Ok(())
    }

    pub(crate) fn state(&self) -> ConnectionState {
        if self.closed.load(Ordering::SeqCst) {
            return ConnectionState::Closed;
        }
        match self.cell.lock().get() {
            Some(Ok(_)) => ConnectionState::Connected,
            _ => ConnectionState::Unconnected,
        }
    }
}
