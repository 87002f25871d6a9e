// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Row/column conversion between documents and the store's column-major batches

pub mod column;
pub mod marshal;
pub mod unmarshal;

pub use column::{Column, ColumnData};
pub use marshal::{marshal, DimensionMismatchPolicy, MarshalOutcome};
pub use unmarshal::{accepts, unmarshal, unmarshal_batch, SearchResult};
