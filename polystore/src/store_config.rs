use crate::collection::DocPath;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use indexmap::IndexMap;

pub const DEFAULT_FIELD_SEPARATOR: &str = ".";

/// Settings shared by every collection of a store.
///
/// Holds the separator used to address nested fields and the collections
/// to register when the store opens, each with its indexed field paths.
/// Usually assembled through [`StoreBuilder`](crate::store_builder::StoreBuilder).
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    field_separator: String,
    collections: IndexMap<String, Vec<String>>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            collections: IndexMap::new(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        StoreConfig::default()
    }

    pub fn field_separator(&self) -> &str {
        &self.field_separator
    }

    /// Sets the separator for nested field paths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the separator is empty.
    pub fn set_field_separator(&mut self, separator: &str) -> StoreResult<()> {
        if separator.is_empty() {
            log::error!("Field separator cannot be empty");
            return Err(StoreError::new(
                "Field separator cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.field_separator = separator.to_string();
        Ok(())
    }

    /// Declares a collection and the field paths to index on it.
    ///
    /// Declaring the same collection again adds any new index paths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for an empty collection name or index path.
    pub fn declare_collection(&mut self, name: &str, index_paths: &[&str]) -> StoreResult<()> {
        validate_collection_name(name)?;
        for path in index_paths {
            validate_index_path(path)?;
        }

        let declared = self.collections.entry(name.to_string()).or_default();
        for path in index_paths {
            if !declared.iter().any(|p| p == path) {
                declared.push(path.to_string());
            }
        }
        Ok(())
    }

    /// Declared collections in declaration order.
    pub fn collections(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.collections.iter()
    }
}

pub(crate) fn validate_collection_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(StoreError::new(
            "Collection name cannot be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

pub(crate) fn validate_index_path(path: &str) -> StoreResult<()> {
    if path.trim().is_empty() {
        log::error!("Index path cannot be empty");
        return Err(StoreError::new(
            "Index path cannot be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

pub(crate) fn validate_doc_path(path: &DocPath) -> StoreResult<()> {
    if path.is_empty() {
        log::error!("Document path cannot be empty");
        return Err(StoreError::new(
            "Document path cannot be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}
