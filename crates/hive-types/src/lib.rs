//! Value model for the hive record store.
//!
//! Every other hive crate depends on `hive-types`. It defines how a single
//! cell value is described and passed around, independent of how a table
//! lays it out in memory.
//!
//! # Key Types
//!
//! - [`Type`] — tagged type descriptor: value kind, size class, and flags
//! - [`ValueRef`] — non-owning, type-tagged reference to a value
//! - [`ObjectId`] — 64-bit identifier of a hive object
//!
//! # Borrowing
//!
//! A [`ValueRef`] never owns memory. Variable-length values borrow the bytes
//! they were built from, so a value read out of a table keeps that table
//! borrowed until the value is dropped.

pub mod data_type;
pub mod error;
pub mod object;
pub mod parse;
pub mod value;
pub mod wire;

pub use data_type::{SizeClass, Type, TypeFlags, ValueKind};
pub use error::TypeError;
pub use object::ObjectId;
pub use parse::infer_type;
pub use value::{ValueRef, DECIMAL_EPSILON};
