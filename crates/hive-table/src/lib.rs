//! Chunked variable-length record store.
//!
//! A [`Table`] holds records that conform to a [`TableSchema`]. Records are
//! packed back to back inside byte [`Chunk`]s; fields have no fixed offsets,
//! so a column is located by decoding the fields before it.
//!
//! # Key Types
//!
//! - [`Table`] — the store: insert, remove, read and rewrite fields
//! - [`Cursor`] — position of a record, advanced sequentially
//! - [`Rows`] / [`Row`] — borrowing iteration over records
//! - [`Metadata`] — name/value pairs on a fixed two-column table
//! - [`TableConfig`] — chunk sizing and invariant checking
//!
//! # Positioning
//!
//! Stepping a cursor to the next record is O(1); seeking to record `n` walks
//! from the start and is O(n). A cursor is tied to the state of the table it
//! came from. Any mutation invalidates every cursor except the one passed to
//! it, and using a stale cursor reads as null and writes as a no-op.
//!
//! The byte layout of records is private to this crate; fields are read and
//! written only through [`Table`]:
//!
//! ```compile_fail
//! use hive_table::encoding::field_size;
//! ```
//!
//! [`TableSchema`]: hive_schema::TableSchema

pub mod chunk;
pub mod codec;
mod compact;
pub mod config;
pub mod cursor;
pub(crate) mod encoding;
pub mod error;
pub mod metadata;
pub mod rows;
mod segment;
pub mod table;

pub use chunk::Chunk;
pub use codec::TABLE_FORMAT_VERSION;
pub use config::TableConfig;
pub use cursor::Cursor;
pub use error::{TableError, TableResult};
pub use metadata::Metadata;
pub use rows::{Row, Rows};
pub use table::Table;
