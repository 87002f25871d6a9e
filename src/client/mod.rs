// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Collection client: connection handling, flush policy and typed operations

pub mod collection;
pub mod connection;
pub mod flush;
pub mod search;

pub use collection::{CollectionClient, CollectionClientBuilder, InsertOutcome};
pub use connection::{ConnectionState, ConnectionStrategy};
pub use flush::{FlushPolicy, FlushTracker};
pub use search::{Hit, SearchRequest};
