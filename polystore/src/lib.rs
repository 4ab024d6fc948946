//! # polystore - schema-less document persistence across backends
//!
//! polystore stores schema-less documents in named collections and lets
//! application code query and mutate them the same way whether the backend
//! can execute queries itself or only offers get/put/delete/scan.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polystore::collection::{filter_by, UpdateOperation};
//! use polystore::doc;
//! use polystore::filter::field;
//! use polystore::store::StoreProvider;
//! use polystore::store_builder::StoreBuilder;
//!
//! let store = StoreBuilder::new()
//!     .collection("players", &["level", "active"])
//!     .open()?;
//!
//! store.write("players", &"p1".into(), doc! { level: 15, active: true })?;
//! store.update_one("players", &"p1".into(), &[UpdateOperation::increment("level", 1)])?;
//!
//! let found = store.find("players", &filter_by(field("level").gt(10)))?;
//! ```
//!
//! ## How a query runs
//!
//! 1. The [`filter::Condition`] is validated.
//! 2. The optimizer asks each field's [`index::PropertyIndex`] whether it can
//!    answer its part of the tree exactly. AND branches are intersected, OR
//!    branches are unioned only when every branch is fully indexed.
//! 3. Candidates (or every document, on a full scan) are filtered by the
//!    remaining condition, sorted, skipped and limited in memory.
//!
//! ## Concurrency
//!
//! Each document has its own lock, created on first use and reclaimed on
//! delete. Writes to different documents never block each other; whole
//! collection operations take a collection-wide gate first.
//!
//! ## Module Organization
//!
//! - [`collection`] - documents, paths, find options and update operations
//! - [`common`] - values, comparison rules, entity conversion, locks
//! - [`errors`] - error type and result alias
//! - [`filter`] - conditions, predicates and their evaluation
//! - [`index`] - per-field property indexes
//! - [`store`] - backends, capabilities and the document store facade
//! - [`store_builder`] / [`store_config`] - configuration

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod index;
pub mod store;
pub mod store_builder;
pub mod store_config;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
