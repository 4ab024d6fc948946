use crate::collection::{DocPath, Document, UpdateOperation};
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::index::PropertyIndex;
use dashmap::DashMap;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Keeps a collection's property indexes in step with its documents.
///
/// Every method is called with the document's lock held.
pub(crate) struct IndexWriter<'a> {
    indexes: &'a DashMap<String, Arc<PropertyIndex>>,
    separator: &'a str,
}

impl<'a> IndexWriter<'a> {
    pub fn new(indexes: &'a DashMap<String, Arc<PropertyIndex>>, separator: &'a str) -> Self {
        IndexWriter { indexes, separator }
    }

    /// Recomputes every declared index entry for a freshly written document.
    pub fn write_index_entries(&self, path: &DocPath, document: &Document) {
        for index in self.indexes.iter() {
            self.write_entry(index.value(), path, document);
        }
    }

    /// Drops the document from every index.
    pub fn remove_index_entries(&self, path: &DocPath) {
        for index in self.indexes.iter() {
            index.value().remove(path);
        }
    }

    /// Recomputes only the indexes whose field an update batch may have
    /// touched.
    pub fn update_index_entries(
        &self,
        path: &DocPath,
        document: &Document,
        operations: &[UpdateOperation],
    ) -> StoreResult<()> {
        let affected: Vec<String> = self
            .indexes
            .iter()
            .filter(|index| {
                operations
                    .iter()
                    .any(|op| is_affected_by_update(index.key(), op.field(), self.separator))
            })
            .map(|index| index.key().clone())
            .collect();

        for field in affected {
            self.refresh_entry(&field, path, document)?;
        }
        Ok(())
    }

    /// Recomputes one index entry; the field must be declared as indexed.
    pub fn refresh_entry(&self, field: &str, path: &DocPath, document: &Document) -> StoreResult<()> {
        let index = self.index(field)?;
        self.write_entry(&index, path, document);
        Ok(())
    }

    /// Drops one index entry; the field must be declared as indexed.
    pub fn drop_entry(&self, field: &str, path: &DocPath) -> StoreResult<()> {
        self.index(field)?.remove(path);
        Ok(())
    }

    fn index(&self, field: &str) -> StoreResult<Arc<PropertyIndex>> {
        match self.indexes.get(field) {
            Some(index) => Ok(index.value().clone()),
            None => {
                log::error!("Field '{}' is not indexed", field);
                Err(StoreError::new(
                    &format!("No index declared on field '{}'", field),
                    ErrorKind::IndexNotFound,
                ))
            }
        }
    }

    fn write_entry(&self, index: &PropertyIndex, path: &DocPath, document: &Document) {
        let value = document
            .get_path(index.field(), self.separator)
            .unwrap_or(&NULL);
        index.put(path, value);
    }
}

/// Whether an update to `updated_field` can change the value an index on
/// `index_field` reads. Either path may be nested under the other.
pub(crate) fn is_affected_by_update(index_field: &str, updated_field: &str, separator: &str) -> bool {
    if index_field == updated_field {
        return true;
    }
    let nested_under = |child: &str, parent: &str| {
        child
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with(separator))
    };
    nested_under(index_field, updated_field) || nested_under(updated_field, index_field)
}
