use std::sync::RwLock;

use super::{Collections, DocumentBackend, StoreError};

/// In-memory store.
///
/// Intended for tests/dev. Writes run under the write lock; a failed write
/// leaves no partial change because every collection mutation validates
/// before it touches state.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections(collections: Collections) -> Self {
        Self {
            inner: RwLock::new(collections),
        }
    }
}

impl DocumentBackend for InMemoryStore {
    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&guard))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut guard)
    }
}
