//! Source registry implementation

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{FundamentError, Result};

use super::entry::SourceEntry;

/// Registered data sources by key
///
/// Keys are unique; registering an existing key fails with
/// [`FundamentError::DuplicateKey`] rather than replacing the source.
pub struct SourceRegistry<V> {
    sources: RwLock<HashMap<String, Arc<SourceEntry<V>>>>,
}

impl<V> SourceRegistry<V> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Insert an entry
    pub fn insert(&self, entry: SourceEntry<V>) -> Result<Arc<SourceEntry<V>>> {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);

        if sources.contains_key(entry.key()) {
            return Err(FundamentError::DuplicateKey(entry.key().to_string()));
        }

        let entry = Arc::new(entry);
        sources.insert(entry.key().to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Remove an entry and retire it
    pub fn remove(&self, key: &str) -> Option<Arc<SourceEntry<V>>> {
        let entry = self
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)?;
        entry.retire();
        Some(entry)
    }

    /// Remove and retire every entry
    pub fn drain(&self) -> Vec<Arc<SourceEntry<V>>> {
        let entries: Vec<_> = self
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in &entries {
            entry.retire();
        }
        entries
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<Arc<SourceEntry<V>>> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Check whether a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Snapshot of every entry
    pub fn entries(&self) -> Vec<Arc<SourceEntry<V>>> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.sources.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if no source is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for SourceRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
