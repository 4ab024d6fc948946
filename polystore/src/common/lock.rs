use crate::collection::DocPath;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// A handle to one document's mutual-exclusion lock.
///
/// The handle keeps the lock alive even if the table entry is reclaimed
/// while the handle is held.
#[derive(Clone)]
pub struct LockHandle {
    lock: Arc<Mutex<()>>,
}

impl LockHandle {
    /// Blocks until the document lock is acquired.
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

/// Per-collection table of document locks plus the collection-wide gate.
///
/// Locks are created lazily on first access to a path and live until the
/// document is deleted (or the collection is truncated). A document that is
/// read through a locked path but never written still allocates an entry.
///
/// Lock order: the gate first, then at most one document lock. Per-document
/// operations hold the gate shared; whole-collection operations hold it
/// exclusively and therefore exclude every document writer.
///
/// ```text
/// let _gate = table.shared();
/// let handle = table.get_lock(&path);
/// let _guard = handle.lock();
/// ```
#[derive(Default)]
pub struct LockTable {
    locks: DashMap<DocPath, Arc<Mutex<()>>>,
    gate: RwLock<()>,
}

impl LockTable {
    pub fn new() -> Self {
        LockTable {
            locks: DashMap::new(),
            gate: RwLock::new(()),
        }
    }

    /// Returns the lock for `path`, creating it if absent.
    pub fn get_lock(&self, path: &DocPath) -> LockHandle {
        let lock = self
            .locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        LockHandle { lock }
    }

    /// Runs `f` while holding the current lock for `path`.
    ///
    /// A handle obtained before the document was deleted is stale once its
    /// entry is released; the caller then retries on the fresh entry so two
    /// writers never hold different locks for the same path.
    pub fn with_lock<R>(&self, path: &DocPath, f: impl FnOnce() -> R) -> R {
        loop {
            let handle = self.get_lock(path);
            let guard = handle.lock();
            if self.is_current(path, &handle) {
                let result = f();
                drop(guard);
                return result;
            }
        }
    }

    /// Whether `handle` is still the table's lock for `path`.
    pub fn is_current(&self, path: &DocPath, handle: &LockHandle) -> bool {
        self.locks
            .get(path)
            .is_some_and(|lock| Arc::ptr_eq(lock.value(), &handle.lock))
    }

    /// Drops the lock entry of a deleted document.
    pub fn release(&self, path: &DocPath) {
        self.locks.remove(path);
    }

    /// Drops every lock entry. Only called while the gate is held exclusively.
    pub fn clear(&self) {
        self.locks.clear();
    }

    /// Acquires the gate for a per-document operation.
    pub fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read()
    }

    /// Acquires the gate for a whole-collection operation.
    pub fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write()
    }

    /// Number of live lock entries.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
