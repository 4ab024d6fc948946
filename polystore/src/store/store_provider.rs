use crate::collection::{DocPath, Document, FindOptions, UpdateOperation};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Condition;
use std::fmt::{Display, Formatter};

/// What a backend can execute on its own.
///
/// [`DocumentStore`](crate::store::DocumentStore) reads these flags once per
/// call and routes anything unsupported through the in-memory evaluators on
/// top of the backend's primitive get/put/delete/scan operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    native_filter: bool,
    native_update: bool,
    native_stream: bool,
}

impl Capabilities {
    /// A backend offering only the primitive operations.
    pub const NONE: Capabilities = Capabilities {
        native_filter: false,
        native_update: false,
        native_stream: false,
    };

    pub const ALL: Capabilities = Capabilities {
        native_filter: true,
        native_update: true,
        native_stream: true,
    };

    pub fn with_native_filter(mut self, enabled: bool) -> Self {
        self.native_filter = enabled;
        self
    }

    pub fn with_native_update(mut self, enabled: bool) -> Self {
        self.native_update = enabled;
        self
    }

    pub fn with_native_stream(mut self, enabled: bool) -> Self {
        self.native_stream = enabled;
        self
    }

    /// `find` and `delete_by` run inside the backend.
    pub fn native_filter(&self) -> bool {
        self.native_filter
    }

    /// The `update*` family, including the guarded
    /// [`update_one_if`](StoreProvider::update_one_if), runs inside the
    /// backend.
    pub fn native_update(&self) -> bool {
        self.native_update
    }

    /// `stream_all` is served by the backend.
    pub fn native_stream(&self) -> bool {
        self.native_stream
    }
}

impl Display for Capabilities {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.native_filter {
            names.push("native-filter");
        }
        if self.native_update {
            names.push("native-update");
        }
        if self.native_stream {
            names.push("native-stream");
        }
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

/// The contract every storage backend implements.
///
/// The primitive operations are required. The query and update operations
/// have default bodies that fail with `BackendError`; a backend overrides
/// the ones matching the [Capabilities] it advertises.
///
/// Every operation against an unregistered collection fails with
/// `CollectionNotFound`.
///
/// # Thread Safety
///
/// Implementers must be `Send + Sync`; a store is shared across threads.
pub trait StoreProvider: Send + Sync {
    /// Which operations the backend executes natively.
    fn capabilities(&self) -> Capabilities;

    /// Separator used to address nested fields.
    fn field_separator(&self) -> &str;

    /// Registers a collection and its indexed field paths. Idempotent;
    /// re-registering adds newly declared indexes.
    fn register_collection(&self, collection: &str, index_paths: &[&str]) -> StoreResult<()>;

    /// Names of registered collections, sorted.
    fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Stores `document` under `path`, replacing any existing document.
    fn write(&self, collection: &str, path: &DocPath, document: Document) -> StoreResult<()>;

    fn get(&self, collection: &str, path: &DocPath) -> StoreResult<Option<Document>>;

    /// Removes one document; returns whether it existed.
    fn delete(&self, collection: &str, path: &DocPath) -> StoreResult<bool>;

    /// Removes every document of the collection; returns how many.
    fn delete_all(&self, collection: &str) -> StoreResult<usize>;

    fn count(&self, collection: &str) -> StoreResult<usize>;

    fn exists(&self, collection: &str, path: &DocPath) -> StoreResult<bool>;

    /// A point-in-time copy of every document in the collection.
    fn scan(&self, collection: &str) -> StoreResult<Vec<(DocPath, Document)>>;

    fn find(&self, _collection: &str, _options: &FindOptions) -> StoreResult<Vec<(DocPath, Document)>> {
        Err(unsupported("find"))
    }

    fn delete_by(&self, _collection: &str, _condition: &Condition) -> StoreResult<usize> {
        Err(unsupported("delete_by"))
    }

    fn update_one(
        &self,
        _collection: &str,
        _path: &DocPath,
        _operations: &[UpdateOperation],
    ) -> StoreResult<bool> {
        Err(unsupported("update_one"))
    }

    /// Updates one document only if it still satisfies `guard` when the
    /// backend holds its lock; returns whether the document changed.
    fn update_one_if(
        &self,
        _collection: &str,
        _path: &DocPath,
        _guard: &Condition,
        _operations: &[UpdateOperation],
    ) -> StoreResult<bool> {
        Err(unsupported("update_one_if"))
    }

    fn update_one_and_get(
        &self,
        _collection: &str,
        _path: &DocPath,
        _operations: &[UpdateOperation],
    ) -> StoreResult<Option<Document>> {
        Err(unsupported("update_one_and_get"))
    }

    fn get_and_update_one(
        &self,
        _collection: &str,
        _path: &DocPath,
        _operations: &[UpdateOperation],
    ) -> StoreResult<Option<Document>> {
        Err(unsupported("get_and_update_one"))
    }

    fn update(
        &self,
        _collection: &str,
        _condition: &Condition,
        _operations: &[UpdateOperation],
    ) -> StoreResult<usize> {
        Err(unsupported("update"))
    }

    fn stream_all(
        &self,
        _collection: &str,
    ) -> StoreResult<Box<dyn Iterator<Item = (DocPath, Document)> + Send>> {
        Err(unsupported("stream_all"))
    }
}

fn unsupported(operation: &str) -> StoreError {
    log::error!("Backend does not implement {} natively", operation);
    StoreError::new(
        &format!("Operation {} is not supported by this backend", operation),
        ErrorKind::BackendError,
    )
}
