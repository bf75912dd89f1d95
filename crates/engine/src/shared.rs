//! Thread-safe collection handle
//!
//! A [`Collection`] itself is single-threaded. [`SharedCollection`] puts the
//! whole aggregate (records, every index and the snapshot stack) behind one
//! read-write lock: each mutation holds the write lock for its full
//! duration, so readers never observe one index updated and another not.

use crate::collection::Collection;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use trellis_core::Result;

/// Cloneable handle to a collection shared across threads
#[derive(Debug, Clone, Default)]
pub struct SharedCollection {
    inner: Arc<RwLock<Collection>>,
}

impl SharedCollection {
    /// Wrap a collection
    pub fn new(collection: Collection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Lock for queries; any number of readers may hold it at once
    pub fn read(&self) -> RwLockReadGuard<'_, Collection> {
        self.inner.read()
    }

    /// Lock for a mutation
    pub fn write(&self) -> RwLockWriteGuard<'_, Collection> {
        self.inner.write()
    }

    /// Run `f` under the read lock
    pub fn with_read<T>(&self, f: impl FnOnce(&Collection) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` under the write lock
    pub fn with_write<T>(&self, f: impl FnOnce(&mut Collection) -> Result<T>) -> Result<T> {
        f(&mut self.inner.write())
    }
}

impl From<Collection> for SharedCollection {
    fn from(collection: Collection) -> Self {
        Self::new(collection)
    }
}
