//! Per-field secondary indexes.
//!
//! A [PropertyIndex] maps the normalized value of one field to the set of
//! documents holding it. Every numeric width collapses into a single key, so
//! an index on `level` finds `5i32`, `5i64` and `5.0f64` in one bucket.
//!
//! An index is only a shortcut. When it cannot prove its answer equals a
//! full scan (mixed value kinds, list-valued fields, unsupported predicates)
//! [`PropertyIndex::try_query`] returns `None` and the caller evaluates
//! documents directly.

mod index_key;
mod property_index;

pub use index_key::*;
pub use property_index::*;
