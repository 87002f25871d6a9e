//! Collection client integration tests

pub mod common;

mod test_binary_vectors;
mod test_collection_lifecycle;
mod test_connection_management;
mod test_flush_policy;
mod test_schema_properties;
