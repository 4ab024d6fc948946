use crate::collection::operation::{
    paginate, FindOptimizer, IndexWriter, ReadOperations, UpdateEvaluator,
};
use crate::collection::{DocPath, Document, FindOptions, IndexPlan, UpdateOperation};
use crate::common::{LockTable, Value};
use crate::errors::StoreResult;
use crate::filter::{matches, Condition};
use crate::index::PropertyIndex;
use dashmap::DashMap;
use itertools::Itertools;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// The outcome of a single-document update.
pub(crate) struct UpdateOutcome {
    pub changed: bool,
    pub before: Document,
    pub after: Document,
}

/// Everything the in-memory store keeps for one registered collection.
///
/// Per-document writes hold the collection gate shared and then that
/// document's lock; `delete_all` and `truncate` hold the gate exclusively.
/// Index entries always describe the document last persisted under the
/// same lock.
pub(crate) struct CollectionState {
    name: String,
    separator: String,
    documents: DashMap<DocPath, Document>,
    indexes: DashMap<String, Arc<PropertyIndex>>,
    locks: LockTable,
}

impl CollectionState {
    pub fn new(name: &str, separator: &str) -> Self {
        CollectionState {
            name: name.to_string(),
            separator: separator.to_string(),
            documents: DashMap::new(),
            indexes: DashMap::new(),
            locks: LockTable::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an index for every path not yet indexed and builds it from the
    /// documents already stored.
    pub fn declare_indexes(&self, index_paths: &[&str]) {
        let pending: Vec<&str> = index_paths
            .iter()
            .copied()
            .filter(|path| !self.indexes.contains_key(*path))
            .unique()
            .collect();
        if pending.is_empty() {
            return;
        }

        let _gate = self.locks.exclusive();
        for path in pending {
            if self.indexes.contains_key(path) {
                continue;
            }
            let index = PropertyIndex::new(path);
            for entry in self.documents.iter() {
                let value = entry.value().get_path(path, &self.separator).unwrap_or(&NULL);
                index.put(entry.key(), value);
            }
            log::debug!(
                "Built index on {}.{} over {} documents",
                self.name,
                path,
                index.len()
            );
            self.indexes.insert(path.to_string(), Arc::new(index));
        }
    }

    pub fn index_paths(&self) -> Vec<String> {
        self.indexes.iter().map(|index| index.key().clone()).sorted().collect()
    }

    pub fn index(&self, path: &str) -> Option<Arc<PropertyIndex>> {
        self.indexes.get(path).map(|index| index.value().clone())
    }

    pub fn write(&self, path: &DocPath, document: Document) {
        let _gate = self.locks.shared();
        self.locks.with_lock(path, || {
            self.documents.insert(path.clone(), document);
            if let Some(stored) = self.documents.get(path) {
                self.index_writer().write_index_entries(path, stored.value());
            }
        })
    }

    pub fn get(&self, path: &DocPath) -> Option<Document> {
        self.documents.get(path).map(|document| document.value().clone())
    }

    pub fn exists(&self, path: &DocPath) -> bool {
        self.documents.contains_key(path)
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn delete(&self, path: &DocPath) -> bool {
        let _gate = self.locks.shared();
        self.locks.with_lock(path, || {
            let removed = self.documents.remove(path).is_some();
            self.index_writer().remove_index_entries(path);
            self.locks.release(path);
            removed
        })
    }

    /// Removes every document, index entry and lock; returns how many
    /// documents were removed.
    pub fn delete_all(&self) -> usize {
        let _gate = self.locks.exclusive();
        let removed = self.documents.len();
        self.documents.clear();
        for index in self.indexes.iter() {
            index.value().clear();
        }
        self.locks.clear();
        removed
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// A point-in-time copy of every document.
    pub fn snapshot(&self) -> Vec<(DocPath, Document)> {
        self.documents
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn explain(&self, condition: &Condition) -> IndexPlan {
        FindOptimizer::new(&self.indexes).create_plan(condition)
    }

    pub fn find(&self, options: &FindOptions) -> StoreResult<Vec<(DocPath, Document)>> {
        let reader = ReadOperations::new(&self.separator);
        let mut matched = self.select(options.condition())?;
        reader.sort(&mut matched, options.sort_keys());
        Ok(paginate(matched, options.skip_count(), options.limit_count()))
    }

    /// Deletes the documents matching `condition`; returns how many.
    ///
    /// Each deletion is atomic on its own; the batch is not.
    pub fn delete_by(&self, condition: &Condition) -> StoreResult<usize> {
        let mut removed = 0;
        for (path, _) in self.select(Some(condition))? {
            if self.delete_if_matches(&path, condition)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Applies `operations` to every document matching `condition`; returns
    /// how many documents changed.
    ///
    /// Each document update is atomic on its own; the batch is not.
    pub fn update(&self, condition: &Condition, operations: &[UpdateOperation]) -> StoreResult<usize> {
        let mut updated = 0;
        for (path, _) in self.select(Some(condition))? {
            let outcome = self.update_document(&path, operations, Some(condition))?;
            if outcome.is_some_and(|outcome| outcome.changed) {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Applies `operations` to one document under its lock. A missing
    /// document, or one that no longer satisfies `guard`, yields `None`.
    pub fn update_document(
        &self,
        path: &DocPath,
        operations: &[UpdateOperation],
        guard: Option<&Condition>,
    ) -> StoreResult<Option<UpdateOutcome>> {
        let _gate = self.locks.shared();
        self.locks.with_lock(path, || {
            let before = match self.documents.get(path) {
                Some(document) => document.value().clone(),
                None => {
                    self.locks.release(path);
                    return Ok(None);
                }
            };
            if let Some(condition) = guard {
                if !matches(condition, &before, &self.separator)? {
                    return Ok(None);
                }
            }

            let mut after = before.clone();
            let changed = UpdateEvaluator::new(&self.separator).apply(&mut after, operations)?;
            if changed {
                self.documents.insert(path.clone(), after.clone());
                self.index_writer()
                    .update_index_entries(path, &after, operations)?;
            }
            Ok(Some(UpdateOutcome {
                changed,
                before,
                after,
            }))
        })
    }

    fn delete_if_matches(&self, path: &DocPath, condition: &Condition) -> StoreResult<bool> {
        let _gate = self.locks.shared();
        self.locks.with_lock(path, || {
            let still_matches = match self.documents.get(path) {
                Some(document) => matches(condition, document.value(), &self.separator)?,
                None => {
                    self.locks.release(path);
                    return Ok(false);
                }
            };
            if still_matches {
                self.documents.remove(path);
                self.index_writer().remove_index_entries(path);
                self.locks.release(path);
            }
            Ok(still_matches)
        })
    }

    /// Resolves the documents matching `condition` through the optimizer.
    fn select(&self, condition: Option<&Condition>) -> StoreResult<Vec<(DocPath, Document)>> {
        let reader = ReadOperations::new(&self.separator);
        let condition = match condition {
            Some(condition) => condition,
            None => return Ok(self.snapshot()),
        };

        match self.explain(condition) {
            IndexPlan::FullScan => reader.filter(self.snapshot(), Some(condition)),
            IndexPlan::Indexed {
                candidates,
                remaining,
            } => {
                let documents = candidates
                    .into_iter()
                    .filter_map(|path| self.get(&path).map(|document| (path, document)));
                reader.filter(documents, remaining.as_ref())
            }
        }
    }

    fn index_writer(&self) -> IndexWriter<'_> {
        IndexWriter::new(&self.indexes, &self.separator)
    }
}
