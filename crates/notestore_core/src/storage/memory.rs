//! Process-local key-value store, mainly for tests.

use super::{KeyValueStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory key-value store.
///
/// Clones share the same map, so a test can keep a handle and inspect what a
/// repository persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> StorageResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Poisoned("memory store"))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Poisoned("memory store"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Poisoned("memory store"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
