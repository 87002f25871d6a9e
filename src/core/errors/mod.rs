//! Error Types for ProximaDB ORM
//!
//! This module provides all error types used throughout the mapping layer,
//! one file per concern.

pub mod config_error;
pub mod core_error;
pub mod marshal_error;
pub mod store_error;

// Re-export all error types
pub use config_error::*;
pub use core_error::*;
pub use marshal_error::*;
pub use store_error::*;
