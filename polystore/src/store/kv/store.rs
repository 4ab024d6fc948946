use crate::collection::{DocPath, Document};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::{Capabilities, StoreProvider};
use crate::store_config::{validate_collection_name, validate_doc_path, StoreConfig};
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use itertools::Itertools;
use std::sync::Arc;

type KeySpace = Arc<SkipMap<DocPath, Document>>;

/// A plain key-value backend: one ordered key space per collection.
///
/// It offers only get/put/delete/scan and advertises no capabilities, so a
/// [`DocumentStore`](crate::store::DocumentStore) over it answers every query
/// and update through the in-memory evaluators. Declared index paths are
/// accepted and ignored; scans always walk the whole key space in path order.
#[derive(Clone, Default)]
pub struct KeyValueStore {
    inner: Arc<KeyValueStoreInner>,
}

impl KeyValueStore {
    pub fn new(config: &StoreConfig) -> KeyValueStore {
        KeyValueStore {
            inner: Arc::new(KeyValueStoreInner {
                separator: config.field_separator().to_string(),
                key_spaces: DashMap::new(),
            }),
        }
    }
}

impl StoreProvider for KeyValueStore {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn field_separator(&self) -> &str {
        &self.inner.separator
    }

    fn register_collection(&self, collection: &str, index_paths: &[&str]) -> StoreResult<()> {
        validate_collection_name(collection)?;
        if !index_paths.is_empty() {
            log::debug!(
                "Key-value backend keeps no secondary indexes; ignoring {:?} on {}",
                index_paths,
                collection
            );
        }
        self.inner
            .key_spaces
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(SkipMap::new()));
        Ok(())
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .inner
            .key_spaces
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect())
    }

    fn write(&self, collection: &str, path: &DocPath, document: Document) -> StoreResult<()> {
        let key_space = self.inner.key_space(collection)?;
        validate_doc_path(path)?;
        key_space.insert(path.clone(), document);
        Ok(())
    }

    fn get(&self, collection: &str, path: &DocPath) -> StoreResult<Option<Document>> {
        let key_space = self.inner.key_space(collection)?;
        Ok(key_space.get(path).map(|entry| entry.value().clone()))
    }

    fn delete(&self, collection: &str, path: &DocPath) -> StoreResult<bool> {
        Ok(self.inner.key_space(collection)?.remove(path).is_some())
    }

    fn delete_all(&self, collection: &str) -> StoreResult<usize> {
        let key_space = self.inner.key_space(collection)?;
        let mut removed = 0;
        while key_space.pop_front().is_some() {
            removed += 1;
        }
        Ok(removed)
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.inner.key_space(collection)?.len())
    }

    fn exists(&self, collection: &str, path: &DocPath) -> StoreResult<bool> {
        Ok(self.inner.key_space(collection)?.contains_key(path))
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<(DocPath, Document)>> {
        let key_space = self.inner.key_space(collection)?;
        Ok(key_space
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

#[derive(Default)]
struct KeyValueStoreInner {
    separator: String,
    key_spaces: DashMap<String, KeySpace>,
}

impl KeyValueStoreInner {
    fn key_space(&self, collection: &str) -> StoreResult<KeySpace> {
        match self.key_spaces.get(collection) {
            Some(key_space) => Ok(key_space.value().clone()),
            None => {
                log::error!("Collection {} is not registered", collection);
                Err(StoreError::new(
                    &format!("Collection {} is not registered", collection),
                    ErrorKind::CollectionNotFound,
                ))
            }
        }
    }
}
