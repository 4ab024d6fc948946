//! Documents, their identities, and the operations run against them.
//!
//! A [Document] is an ordered map of field names to [`Value`](crate::common::Value)s.
//! Nested fields are reached with a separator-joined path (default `.`):
//!
//! ```rust,ignore
//! use polystore::doc;
//!
//! let player = doc! { name: "Ada", stats: { level: 3 } };
//! assert_eq!(player.get_path("stats.level", "."), Some(&Value::I32(3)));
//! ```
//!
//! Mutations are expressed as [UpdateOperation]s and applied in batches;
//! reads are described by [FindOptions].

mod doc_path;
mod document;
mod find_options;
pub(crate) mod operation;
mod update_operation;

pub use doc_path::*;
pub use document::*;
pub use find_options::*;
pub use operation::IndexPlan;
pub use update_operation::*;
