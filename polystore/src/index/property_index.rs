use crate::collection::DocPath;
use crate::common::Value;
use crate::filter::Predicate;
use crate::index::index_key::{IndexEntry, IndexKey, KeyKind};
use crossbeam_skiplist::{SkipMap, SkipSet};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A per-field index: normalized value to the set of documents holding it.
///
/// The ordered bucket map answers equality and range predicates; a reverse
/// map from document to entry makes `remove` and `contains_doc` direct.
/// Null values are never indexed. Lists and nested documents are recorded as
/// unindexable so the index knows it cannot speak for them.
///
/// Readers never block: buckets live in a concurrent skip list and may be
/// observed mid-update by a concurrent writer. Writers serialize on a short
/// internal mutex while they move a document between buckets.
///
/// # Query equivalence
///
/// [`try_query`](PropertyIndex::try_query) answers only when the result is
/// guaranteed to equal a full scan: every indexed document must hold a key
/// of the operand's kind, and no document may hold an unindexable value.
/// Otherwise it returns `None` and the caller scans.
pub struct PropertyIndex {
    field: String,
    buckets: SkipMap<IndexKey, SkipSet<DocPath>>,
    entries: DashMap<DocPath, IndexEntry>,
    kind_counts: [AtomicUsize; KeyKind::COUNT],
    unindexable: AtomicUsize,
    write_lock: Mutex<()>,
}

impl PropertyIndex {
    pub fn new(field: &str) -> Self {
        PropertyIndex {
            field: field.to_string(),
            buckets: SkipMap::new(),
            entries: DashMap::new(),
            kind_counts: Default::default(),
            unindexable: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        }
    }

    /// The field path this index covers.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Records `value` as the current value of `path`'s field.
    ///
    /// A null value drops the document's entry. Returns whether the index
    /// actually changed.
    pub fn put(&self, path: &DocPath, value: &Value) -> bool {
        let _guard = self.write_lock.lock();
        let new_entry = IndexEntry::from_value(value);
        let old_entry = self.entries.get(path).map(|e| e.value().clone());
        if old_entry == new_entry {
            return false;
        }

        if let Some(old) = old_entry {
            self.detach(path, &old);
        }
        match new_entry {
            Some(entry) => self.attach(path, entry),
            None => {
                self.entries.remove(path);
            }
        }
        true
    }

    /// Removes `path` from whatever bucket holds it; no-op if absent.
    pub fn remove(&self, path: &DocPath) {
        let _guard = self.write_lock.lock();
        if let Some((_, old)) = self.entries.remove(path) {
            self.detach(path, &old);
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.buckets.clear();
        self.entries.clear();
        for count in &self.kind_counts {
            count.store(0, Ordering::Release);
        }
        self.unindexable.store(0, Ordering::Release);
    }

    /// Documents whose indexed value equals `value`; empty on a miss.
    pub fn find_equals(&self, value: &Value) -> HashSet<DocPath> {
        match IndexKey::from_value(value) {
            Some(key) => self.bucket(&key),
            None => HashSet::new(),
        }
    }

    /// Whether the index holds an entry for `path`.
    pub fn contains_doc(&self, path: &DocPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of documents with a non-null value in this field.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves `predicate` from the index alone, or `None` if the index
    /// cannot guarantee the same answer as evaluating every document.
    pub fn try_query(&self, predicate: &Predicate) -> Option<HashSet<DocPath>> {
        match predicate {
            Predicate::Eq(operand) => {
                let key = self.answerable_key(operand)?;
                Some(self.bucket(&key))
            }
            Predicate::Gt(operand) => {
                let key = self.answerable_key(operand)?;
                Some(self.scan((Bound::Excluded(key), Bound::Unbounded)))
            }
            Predicate::Gte(operand) => {
                let key = self.answerable_key(operand)?;
                Some(self.scan((Bound::Included(key), Bound::Unbounded)))
            }
            Predicate::Lt(operand) => {
                let key = self.answerable_key(operand)?;
                Some(self.scan((Bound::Unbounded, Bound::Excluded(key))))
            }
            Predicate::Lte(operand) => {
                let key = self.answerable_key(operand)?;
                Some(self.scan((Bound::Unbounded, Bound::Included(key))))
            }
            Predicate::Between {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => {
                let lower = self.answerable_key(lower)?;
                let upper = self.answerable_key(upper)?;
                if lower.kind() != upper.kind() {
                    return None;
                }
                let empty_range = match lower.cmp(&upper) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Equal => !(*lower_inclusive && *upper_inclusive),
                    std::cmp::Ordering::Less => false,
                };
                if empty_range {
                    return Some(HashSet::new());
                }
                let lower = if *lower_inclusive {
                    Bound::Included(lower)
                } else {
                    Bound::Excluded(lower)
                };
                let upper = if *upper_inclusive {
                    Bound::Included(upper)
                } else {
                    Bound::Excluded(upper)
                };
                Some(self.scan((lower, upper)))
            }
            Predicate::In(operands) => {
                let mut keys = Vec::with_capacity(operands.len());
                for operand in operands {
                    keys.push(self.answerable_key(operand)?);
                }
                let mut result = HashSet::new();
                for key in &keys {
                    result.extend(self.bucket(key));
                }
                Some(result)
            }
            Predicate::StartsWith(prefix) => {
                let key = self.answerable_key(&Value::String(prefix.clone()))?;
                let mut result = HashSet::new();
                for entry in self.buckets.range(key..) {
                    match entry.key() {
                        IndexKey::Text(text) if text.starts_with(prefix.as_str()) => {
                            result.extend(entry.value().iter().map(|p| p.value().clone()));
                        }
                        _ => break,
                    }
                }
                Some(result)
            }
            Predicate::Ne(_)
            | Predicate::NotIn(_)
            | Predicate::Contains(_)
            | Predicate::EndsWith(_)
            | Predicate::Regex(_) => None,
        }
    }

    /// The operand's key, if every indexed document holds a key of the same
    /// kind and none holds an unindexable value.
    fn answerable_key(&self, operand: &Value) -> Option<IndexKey> {
        let key = IndexKey::from_value(operand)?;
        if self.unindexable.load(Ordering::Acquire) > 0 {
            return None;
        }
        let wanted = key.kind().slot();
        let homogeneous = self
            .kind_counts
            .iter()
            .enumerate()
            .all(|(slot, count)| slot == wanted || count.load(Ordering::Acquire) == 0);
        if homogeneous {
            Some(key)
        } else {
            None
        }
    }

    fn bucket(&self, key: &IndexKey) -> HashSet<DocPath> {
        match self.buckets.get(key) {
            Some(entry) => entry.value().iter().map(|p| p.value().clone()).collect(),
            None => HashSet::new(),
        }
    }

    fn scan(&self, range: (Bound<IndexKey>, Bound<IndexKey>)) -> HashSet<DocPath> {
        let mut result = HashSet::new();
        for entry in self.buckets.range(range) {
            result.extend(entry.value().iter().map(|p| p.value().clone()));
        }
        result
    }

    // callers hold write_lock
    fn attach(&self, path: &DocPath, entry: IndexEntry) {
        match &entry {
            IndexEntry::Key(key) => {
                let bucket = match self.buckets.get(key) {
                    Some(bucket) => bucket,
                    None => self.buckets.insert(key.clone(), SkipSet::new()),
                };
                bucket.value().insert(path.clone());
                self.kind_counts[key.kind().slot()].fetch_add(1, Ordering::AcqRel);
            }
            IndexEntry::Unindexable => {
                self.unindexable.fetch_add(1, Ordering::AcqRel);
            }
        }
        self.entries.insert(path.clone(), entry);
    }

    // callers hold write_lock
    fn detach(&self, path: &DocPath, entry: &IndexEntry) {
        match entry {
            IndexEntry::Key(key) => {
                if let Some(bucket) = self.buckets.get(key) {
                    bucket.value().remove(path);
                    if bucket.value().is_empty() {
                        bucket.remove();
                    }
                }
                self.kind_counts[key.kind().slot()].fetch_sub(1, Ordering::AcqRel);
            }
            IndexEntry::Unindexable => {
                self.unindexable.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}

impl Debug for PropertyIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyIndex")
            .field("field", &self.field)
            .field("documents", &self.entries.len())
            .field("buckets", &self.buckets.len())
            .finish()
    }
}
