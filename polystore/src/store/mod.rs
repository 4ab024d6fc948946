//! Storage backends and the facade that routes between them.
//!
//! Every backend implements [StoreProvider] and advertises its
//! [Capabilities]. [DocumentStore] sends supported operations to the backend
//! and answers the rest with the in-memory evaluators, so callers see one
//! behavior regardless of where documents live.
//!
//! - [InMemoryStore]: the reference backend, supports everything natively
//! - [KeyValueStore]: primitive get/put/delete/scan only

mod document_store;
mod kv;
mod memory;
mod store_provider;

pub use document_store::*;
pub use kv::*;
pub use memory::*;
pub use store_provider::*;
