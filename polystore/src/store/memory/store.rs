use super::collection::CollectionState;
use crate::collection::{validate_batch, DocPath, Document, FindOptions, IndexPlan, UpdateOperation};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Condition;
use crate::store::{Capabilities, StoreProvider};
use crate::store_config::{validate_collection_name, validate_doc_path, validate_index_path, StoreConfig};
use dashmap::DashMap;
use itertools::Itertools;
use std::sync::Arc;

/// The reference backend: documents, indexes and locks held in memory.
///
/// Supports every operation natively and is also the semantics every other
/// backend is measured against. Clones share the same state.
///
/// ```rust,ignore
/// use polystore::doc;
/// use polystore::filter::field;
/// use polystore::store::InMemoryStore;
///
/// let store = InMemoryStore::default();
/// store.register_collection("players", &["level"])?;
/// store.write("players", &"p1".into(), doc! { level: 15 })?;
/// let found = store.find("players", &filter_by(field("level").eq(15)))?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    /// Creates a store and registers every collection `config` declares.
    pub fn new(config: StoreConfig) -> StoreResult<InMemoryStore> {
        let store = InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new(config.field_separator())),
        };
        for (name, index_paths) in config.collections() {
            let paths: Vec<&str> = index_paths.iter().map(String::as_str).collect();
            store.inner.register_collection(name, &paths)?;
        }
        Ok(store)
    }

    /// Describes how `condition` would be resolved, without running it.
    pub fn explain(&self, collection: &str, condition: &Condition) -> StoreResult<IndexPlan> {
        condition.validate()?;
        Ok(self.inner.collection(collection)?.explain(condition))
    }

    /// Removes every document, index entry and lock of the collection. The
    /// collection stays registered.
    pub fn truncate(&self, collection: &str) -> StoreResult<()> {
        let removed = self.inner.collection(collection)?.delete_all();
        log::debug!("Truncated {} ({} documents)", collection, removed);
        Ok(())
    }

    /// Indexed field paths of a collection, sorted.
    pub fn index_paths(&self, collection: &str) -> StoreResult<Vec<String>> {
        Ok(self.inner.collection(collection)?.index_paths())
    }

    /// Number of live per-document locks; a diagnostic for lock reclamation.
    pub fn lock_count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.inner.collection(collection)?.lock_count())
    }
}

impl StoreProvider for InMemoryStore {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn field_separator(&self) -> &str {
        &self.inner.separator
    }

    fn register_collection(&self, collection: &str, index_paths: &[&str]) -> StoreResult<()> {
        self.inner.register_collection(collection, index_paths)
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect())
    }

    fn write(&self, collection: &str, path: &DocPath, document: Document) -> StoreResult<()> {
        validate_doc_path(path)?;
        self.inner.collection(collection)?.write(path, document);
        Ok(())
    }

    fn get(&self, collection: &str, path: &DocPath) -> StoreResult<Option<Document>> {
        Ok(self.inner.collection(collection)?.get(path))
    }

    fn delete(&self, collection: &str, path: &DocPath) -> StoreResult<bool> {
        Ok(self.inner.collection(collection)?.delete(path))
    }

    fn delete_all(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.inner.collection(collection)?.delete_all())
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.inner.collection(collection)?.count())
    }

    fn exists(&self, collection: &str, path: &DocPath) -> StoreResult<bool> {
        Ok(self.inner.collection(collection)?.exists(path))
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<(DocPath, Document)>> {
        Ok(self.inner.collection(collection)?.snapshot())
    }

    fn find(&self, collection: &str, options: &FindOptions) -> StoreResult<Vec<(DocPath, Document)>> {
        let state = self.inner.collection(collection)?;
        if let Some(condition) = options.condition() {
            condition.validate()?;
        }
        state.find(options)
    }

    fn delete_by(&self, collection: &str, condition: &Condition) -> StoreResult<usize> {
        let state = self.inner.collection(collection)?;
        condition.validate()?;
        state.delete_by(condition)
    }

    fn update_one(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
    ) -> StoreResult<bool> {
        let state = self.inner.collection(collection)?;
        validate_batch(operations)?;
        let outcome = state.update_document(path, operations, None)?;
        Ok(outcome.is_some_and(|outcome| outcome.changed))
    }

    fn update_one_if(
        &self,
        collection: &str,
        path: &DocPath,
        guard: &Condition,
        operations: &[UpdateOperation],
    ) -> StoreResult<bool> {
        let state = self.inner.collection(collection)?;
        guard.validate()?;
        validate_batch(operations)?;
        let outcome = state.update_document(path, operations, Some(guard))?;
        Ok(outcome.is_some_and(|outcome| outcome.changed))
    }

    fn update_one_and_get(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
    ) -> StoreResult<Option<Document>> {
        let state = self.inner.collection(collection)?;
        validate_batch(operations)?;
        let outcome = state.update_document(path, operations, None)?;
        Ok(outcome.map(|outcome| outcome.after))
    }

    fn get_and_update_one(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
    ) -> StoreResult<Option<Document>> {
        let state = self.inner.collection(collection)?;
        validate_batch(operations)?;
        let outcome = state.update_document(path, operations, None)?;
        Ok(outcome.map(|outcome| outcome.before))
    }

    fn update(
        &self,
        collection: &str,
        condition: &Condition,
        operations: &[UpdateOperation],
    ) -> StoreResult<usize> {
        let state = self.inner.collection(collection)?;
        condition.validate()?;
        validate_batch(operations)?;
        state.update(condition, operations)
    }

    fn stream_all(
        &self,
        collection: &str,
    ) -> StoreResult<Box<dyn Iterator<Item = (DocPath, Document)> + Send>> {
        let snapshot = self.inner.collection(collection)?.snapshot();
        Ok(Box::new(snapshot.into_iter()))
    }
}

struct InMemoryStoreInner {
    separator: String,
    collections: DashMap<String, Arc<CollectionState>>,
}

impl Default for InMemoryStoreInner {
    fn default() -> Self {
        InMemoryStoreInner::new(StoreConfig::default().field_separator())
    }
}

impl InMemoryStoreInner {
    fn new(separator: &str) -> Self {
        InMemoryStoreInner {
            separator: separator.to_string(),
            collections: DashMap::new(),
        }
    }

    fn register_collection(&self, name: &str, index_paths: &[&str]) -> StoreResult<()> {
        validate_collection_name(name)?;
        for path in index_paths {
            validate_index_path(path)?;
        }

        let state = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Registered collection {}", name);
                Arc::new(CollectionState::new(name, &self.separator))
            })
            .clone();
        state.declare_indexes(index_paths);
        Ok(())
    }

    fn collection(&self, name: &str) -> StoreResult<Arc<CollectionState>> {
        match self.collections.get(name) {
            Some(state) => Ok(state.value().clone()),
            None => {
                log::error!("Collection {} is not registered", name);
                Err(StoreError::new(
                    &format!("Collection {} is not registered", name),
                    ErrorKind::CollectionNotFound,
                ))
            }
        }
    }
}
