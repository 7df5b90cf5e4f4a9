//! High-level Database API.
//!
//! This module provides the user-facing handle: configuration, one store
//! transaction per command, and read-side queries.

mod api;

pub use api::{Database, DatabaseConfig, DatabaseError, DatabaseResult, DatabaseStats};
