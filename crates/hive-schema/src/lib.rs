//! Table schemas for the hive record store.
//!
//! A [`TableSchema`] is an ordered list of named, typed [`Column`]s plus a
//! content hash. Two schemas are equal exactly when their hashes match, which
//! makes "did the schema change?" a constant-time question.
//!
//! Schema edits are the only place the record store raises structured,
//! recoverable errors ([`SchemaError`]); callers are expected to catch them
//! and reject the edit.

pub mod error;
pub mod hasher;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use hasher::{SchemaHash, SchemaHasher};
pub use schema::{Column, TableSchema, MAX_COLUMNS, MAX_NAME_LEN, SCHEMA_FORMAT_VERSION};
