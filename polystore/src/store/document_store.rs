use crate::collection::operation::{ReadOperations, UpdateEvaluator};
use crate::collection::{validate_batch, DocPath, Document, FindOptions, UpdateOperation};
use crate::common::{from_document, to_document, Convertible, LockTable};
use crate::errors::StoreResult;
use crate::filter::{matches, Condition};
use crate::store::{Capabilities, InMemoryStore, StoreProvider};
use dashmap::DashMap;
use std::sync::Arc;

/// The entry point a repository layer calls, whatever the backend.
///
/// Every call checks the backend's [Capabilities]. Supported operations go
/// straight to the backend; the rest are answered here with the in-memory
/// evaluators on top of the backend's primitive get/put/delete/scan, under
/// per-document locks owned by the facade. Either way the observable result
/// is the same.
///
/// ```rust,ignore
/// use polystore::store::{DocumentStore, KeyValueStore};
///
/// let store = DocumentStore::new(KeyValueStore::default());
/// store.register_collection("players", &[])?;
/// let count = store.update("players", &field("level").lt(5), &[increment("level", 1)])?;
/// ```
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<DocumentStoreInner>,
}

struct DocumentStoreInner {
    provider: Arc<dyn StoreProvider>,
    capabilities: Capabilities,
    fallback_locks: DashMap<String, Arc<LockTable>>,
}

impl DocumentStore {
    pub fn new<T: StoreProvider + 'static>(provider: T) -> Self {
        let capabilities = provider.capabilities();
        log::debug!("Opening document store with capabilities: {}", capabilities);
        DocumentStore {
            inner: Arc::new(DocumentStoreInner {
                provider: Arc::new(provider),
                capabilities,
                fallback_locks: DashMap::new(),
            }),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    /// The backend behind this facade.
    pub fn provider(&self) -> &dyn StoreProvider {
        self.inner.provider.as_ref()
    }

    pub fn register_collection(&self, collection: &str, index_paths: &[&str]) -> StoreResult<()> {
        self.inner.provider.register_collection(collection, index_paths)
    }

    pub fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.inner.provider.list_collections()
    }

    pub fn write(&self, collection: &str, path: &DocPath, document: Document) -> StoreResult<()> {
        if self.inner.capabilities.native_update() {
            return self.inner.provider.write(collection, path, document);
        }
        let locks = self.fallback_locks(collection)?;
        let _gate = locks.shared();
        locks.with_lock(path, || self.inner.provider.write(collection, path, document))
    }

    pub fn get(&self, collection: &str, path: &DocPath) -> StoreResult<Option<Document>> {
        self.inner.provider.get(collection, path)
    }

    pub fn delete(&self, collection: &str, path: &DocPath) -> StoreResult<bool> {
        if self.inner.capabilities.native_update() {
            return self.inner.provider.delete(collection, path);
        }
        let locks = self.fallback_locks(collection)?;
        let _gate = locks.shared();
        locks.with_lock(path, || {
            let removed = self.inner.provider.delete(collection, path);
            locks.release(path);
            removed
        })
    }

    pub fn delete_all(&self, collection: &str) -> StoreResult<usize> {
        if self.inner.capabilities.native_update() {
            return self.inner.provider.delete_all(collection);
        }
        let locks = self.fallback_locks(collection)?;
        let _gate = locks.exclusive();
        let removed = self.inner.provider.delete_all(collection)?;
        locks.clear();
        Ok(removed)
    }

    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        self.inner.provider.count(collection)
    }

    pub fn exists(&self, collection: &str, path: &DocPath) -> StoreResult<bool> {
        self.inner.provider.exists(collection, path)
    }

    pub fn stream_all(
        &self,
        collection: &str,
    ) -> StoreResult<Box<dyn Iterator<Item = (DocPath, Document)> + Send>> {
        if self.inner.capabilities.native_stream() {
            return self.inner.provider.stream_all(collection);
        }
        let documents = self.inner.provider.scan(collection)?;
        Ok(Box::new(documents.into_iter()))
    }

    pub fn find(&self, collection: &str, options: &FindOptions) -> StoreResult<Vec<(DocPath, Document)>> {
        if self.inner.capabilities.native_filter() {
            return self.inner.provider.find(collection, options);
        }
        if let Some(condition) = options.condition() {
            condition.validate()?;
        }
        let documents = self.inner.provider.scan(collection)?;
        ReadOperations::new(self.separator()).execute(documents, options)
    }

    /// Deletes every document matching `condition`; returns how many.
    pub fn delete_by(&self, collection: &str, condition: &Condition) -> StoreResult<usize> {
        if self.inner.capabilities.native_filter() {
            return self.inner.provider.delete_by(collection, condition);
        }
        condition.validate()?;
        let locks = self.fallback_locks(collection)?;
        let mut removed = 0;
        for path in self.matching_paths(collection, condition)? {
            let _gate = locks.shared();
            let deleted = locks.with_lock(&path, || -> StoreResult<bool> {
                let still_matches = match self.inner.provider.get(collection, &path)? {
                    Some(document) => matches(condition, &document, self.separator())?,
                    None => {
                        locks.release(&path);
                        return Ok(false);
                    }
                };
                if still_matches {
                    self.inner.provider.delete(collection, &path)?;
                    locks.release(&path);
                }
                Ok(still_matches)
            })?;
            if deleted {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn update_one(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
    ) -> StoreResult<bool> {
        if self.inner.capabilities.native_update() {
            return self.inner.provider.update_one(collection, path, operations);
        }
        validate_batch(operations)?;
        let outcome = self.fallback_update(collection, path, operations, None)?;
        Ok(outcome.is_some_and(|(changed, _, _)| changed))
    }

    /// Updates one document and returns it as stored afterwards.
    pub fn update_one_and_get(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
    ) -> StoreResult<Option<Document>> {
        if self.inner.capabilities.native_update() {
            return self.inner.provider.update_one_and_get(collection, path, operations);
        }
        validate_batch(operations)?;
        let outcome = self.fallback_update(collection, path, operations, None)?;
        Ok(outcome.map(|(_, _, after)| after))
    }

    /// Updates one document and returns it as it was before.
    pub fn get_and_update_one(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
    ) -> StoreResult<Option<Document>> {
        if self.inner.capabilities.native_update() {
            return self.inner.provider.get_and_update_one(collection, path, operations);
        }
        validate_batch(operations)?;
        let outcome = self.fallback_update(collection, path, operations, None)?;
        Ok(outcome.map(|(_, before, _)| before))
    }

    /// Updates every document matching `condition`; returns how many changed.
    pub fn update(
        &self,
        collection: &str,
        condition: &Condition,
        operations: &[UpdateOperation],
    ) -> StoreResult<usize> {
        if self.inner.capabilities.native_update() && self.inner.capabilities.native_filter() {
            return self.inner.provider.update(collection, condition, operations);
        }
        condition.validate()?;
        validate_batch(operations)?;

        let paths = if self.inner.capabilities.native_filter() {
            self.inner
                .provider
                .find(collection, &FindOptions::new().filter(condition.clone()))?
                .into_iter()
                .map(|(path, _)| path)
                .collect()
        } else {
            self.matching_paths(collection, condition)?
        };

        let mut updated = 0;
        for path in paths {
            let changed = if self.inner.capabilities.native_update() {
                self.inner
                    .provider
                    .update_one_if(collection, &path, condition, operations)?
            } else {
                self.fallback_update(collection, &path, operations, Some(condition))?
                    .is_some_and(|(changed, _, _)| changed)
            };
            if changed {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Stores an entity under `path`.
    pub fn write_entity<T: Convertible>(&self, collection: &str, path: &DocPath, entity: &T) -> StoreResult<()> {
        self.write(collection, path, to_document(entity)?)
    }

    /// Loads the entity stored under `path`.
    pub fn get_entity<T: Convertible>(&self, collection: &str, path: &DocPath) -> StoreResult<Option<T::Output>> {
        match self.get(collection, path)? {
            Some(document) => Ok(Some(from_document::<T>(&document)?)),
            None => Ok(None),
        }
    }

    /// Runs `find` and maps every result to an entity.
    pub fn find_entities<T: Convertible>(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> StoreResult<Vec<(DocPath, T::Output)>> {
        self.find(collection, options)?
            .into_iter()
            .map(|(path, document)| Ok((path, from_document::<T>(&document)?)))
            .collect()
    }

    fn separator(&self) -> &str {
        self.inner.provider.field_separator()
    }

    fn fallback_locks(&self, collection: &str) -> StoreResult<Arc<LockTable>> {
        if let Some(locks) = self.inner.fallback_locks.get(collection) {
            return Ok(locks.value().clone());
        }
        // fails with CollectionNotFound before a lock table is allocated
        self.inner.provider.count(collection)?;
        Ok(self
            .inner
            .fallback_locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(LockTable::new()))
            .clone())
    }

    fn matching_paths(&self, collection: &str, condition: &Condition) -> StoreResult<Vec<DocPath>> {
        let documents = self.inner.provider.scan(collection)?;
        let matched = ReadOperations::new(self.separator()).filter(documents, Some(condition))?;
        Ok(matched.into_iter().map(|(path, _)| path).collect())
    }

    /// Read-modify-write of one document under the facade's lock. Yields
    /// `(changed, before, after)`, or `None` when the document is missing or
    /// no longer satisfies `guard`.
    fn fallback_update(
        &self,
        collection: &str,
        path: &DocPath,
        operations: &[UpdateOperation],
        guard: Option<&Condition>,
    ) -> StoreResult<Option<(bool, Document, Document)>> {
        let locks = self.fallback_locks(collection)?;
        let _gate = locks.shared();
        locks.with_lock(path, || {
            let before = match self.inner.provider.get(collection, path)? {
                Some(document) => document,
                None => {
                    locks.release(path);
                    return Ok(None);
                }
            };
            if let Some(condition) = guard {
                if !matches(condition, &before, self.separator())? {
                    return Ok(None);
                }
            }

            let mut after = before.clone();
            let changed = UpdateEvaluator::new(self.separator()).apply(&mut after, operations)?;
            if changed {
                self.inner.provider.write(collection, path, after.clone())?;
            }
            Ok(Some((changed, before, after)))
        })
    }
}

impl From<InMemoryStore> for DocumentStore {
    fn from(store: InMemoryStore) -> Self {
        DocumentStore::new(store)
    }
}
