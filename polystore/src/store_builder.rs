use crate::errors::{StoreError, StoreResult};
use crate::store::{DocumentStore, InMemoryStore, StoreProvider};
use crate::store_config::StoreConfig;

/// Fluent construction of a store.
///
/// Configuration errors are held until [`open`](StoreBuilder::open) (or one
/// of its variants) so the chain itself never fails.
///
/// ```rust,ignore
/// use polystore::store_builder::StoreBuilder;
///
/// let store = StoreBuilder::new()
///     .field_separator(":")
///     .collection("players", &["level", "active"])
///     .open()?;
/// ```
#[derive(Default)]
pub struct StoreBuilder {
    error: Option<StoreError>,
    config: StoreConfig,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder {
            error: None,
            config: StoreConfig::new(),
        }
    }

    pub fn field_separator(mut self, separator: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_field_separator(separator) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Declares a collection to register on open, with its indexed paths.
    pub fn collection(mut self, name: &str, index_paths: &[&str]) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.declare_collection(name, index_paths) {
                self.error = Some(e);
            }
        }
        self
    }

    /// The accumulated configuration, or the first error recorded.
    pub fn build_config(self) -> StoreResult<StoreConfig> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.config),
        }
    }

    /// Opens an in-memory store with every declared collection registered.
    pub fn open(self) -> StoreResult<InMemoryStore> {
        let config = self.build_config()?;
        InMemoryStore::new(config)
    }

    /// Wraps a backend built from the configuration in a [DocumentStore]
    /// and registers every declared collection on it.
    pub fn open_with<T, F>(self, backend: F) -> StoreResult<DocumentStore>
    where
        T: StoreProvider + 'static,
        F: FnOnce(&StoreConfig) -> T,
    {
        let config = self.build_config()?;
        let store = DocumentStore::new(backend(&config));
        for (name, index_paths) in config.collections() {
            let paths: Vec<&str> = index_paths.iter().map(String::as_str).collect();
            store.register_collection(name, &paths)?;
        }
        Ok(store)
    }
}
