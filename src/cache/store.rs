//! Bounded cache store

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use indexmap::IndexMap;

/// Why an entry left the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// The store was over capacity
    Capacity,
    /// Removed through [`ResultCache::evict`]
    Explicit,
    /// Dropped by a memory pressure signal
    Purge,
}

/// Callback invoked after an entry is evicted
pub type EvictionHook = Arc<dyn Fn(&str, EvictionReason) + Send + Sync>;

/// A cached value
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The value produced by the last successful fetch
    pub value: V,
    /// When the value was written
    pub inserted_at: Instant,
}

/// Key to value store with oldest-first eviction
///
/// Entries are kept in write order; an overwrite moves the key to the back.
pub struct ResultCache<V> {
    entries: RwLock<IndexMap<String, CacheEntry<V>>>,
    capacity: usize,
    hook: RwLock<Option<EvictionHook>>,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            capacity: capacity.max(1),
            hook: RwLock::new(None),
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the cached value for a key
    pub fn get(&self, key: &str) -> Option<V> {
        self.read_entries().get(key).map(|entry| entry.value.clone())
    }

    /// Get the cached value with its write time
    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.read_entries().get(key).cloned()
    }

    /// Check whether a key is cached
    pub fn contains(&self, key: &str) -> bool {
        self.read_entries().contains_key(key)
    }

    /// Store a value, overwriting any previous one
    pub fn put(&self, key: &str, value: V) {
        self.put_if(key, value, || true);
    }

    /// Store a value only if `admit` still holds once the write lock is taken
    ///
    /// Returns false if the value was discarded. A concurrent `evict` of the
    /// same key is ordered either before the check or after the write.
    pub fn put_if(&self, key: &str, value: V, admit: impl FnOnce() -> bool) -> bool {
        let evicted: Vec<String> = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if !admit() {
                return false;
            }
            entries.shift_remove(key);
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                },
            );

            let overflow = entries.len().saturating_sub(self.capacity);
            entries.drain(..overflow).map(|(k, _)| k).collect()
        };

        for key in evicted {
            tracing::debug!(key = %key, "Cache entry evicted (capacity)");
            self.fire_hook(&key, EvictionReason::Capacity);
        }
        true
    }

    /// Evict a single key
    ///
    /// Returns true if an entry was removed.
    pub fn evict(&self, key: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(key)
            .is_some();

        if removed {
            self.fire_hook(key, EvictionReason::Explicit);
        }
        removed
    }

    /// Drop every entry in response to memory pressure
    ///
    /// Returns the number of entries removed.
    pub fn purge(&self) -> usize {
        let keys: Vec<String> = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.drain(..).map(|(k, _)| k).collect()
        };

        tracing::debug!(count = keys.len(), "Cache purged");
        for key in &keys {
            self.fire_hook(key, EvictionReason::Purge);
        }
        keys.len()
    }

    /// Install a hook called after each eviction
    pub fn set_eviction_hook(&self, hook: EvictionHook) {
        *self.hook.write().unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// Remove the eviction hook
    pub fn clear_eviction_hook(&self) {
        *self.hook.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<String, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire_hook(&self, key: &str, reason: EvictionReason) {
        let hook = self
            .hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook(key, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_get_before_put_is_absent() {
        let cache: ResultCache<i32> = ResultCache::new(4);

        assert_eq!(cache.get("temp"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let cache = ResultCache::new(4);
        cache.put("temp", 20);
        assert_eq!(cache.get("temp"), Some(20));

        cache.put("temp", 21);
        assert_eq!(cache.get("temp"), Some(21));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResultCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 3); // a is now the newest
        cache.put("c", 4);

        assert!(!cache.contains("b"));
        assert_eq!(cache.get("a"), Some(3));
        assert_eq!(cache.get("c"), Some(4));
    }

    #[test]
    fn test_forced_eviction_reports_through_hook() {
        let cache = ResultCache::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cache.set_eviction_hook(Arc::new(move |key: &str, reason| {
            sink.lock().unwrap().push((key.to_string(), reason));
        }));

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        assert!(cache.evict("b"));
        assert!(!cache.evict("b"));
        assert_eq!(cache.purge(), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("a".to_string(), EvictionReason::Capacity),
                ("b".to_string(), EvictionReason::Explicit),
                ("c".to_string(), EvictionReason::Purge),
            ]
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_if_rejected_leaves_cache_untouched() {
        let cache = ResultCache::new(4);
        cache.put("temp", 20);

        assert!(!cache.put_if("temp", 99, || false));
        assert_eq!(cache.get("temp"), Some(20));
        assert!(!cache.put_if("wind", 5, || false));
        assert!(!cache.contains("wind"));

        assert!(cache.put_if("temp", 21, || true));
        assert_eq!(cache.get("temp"), Some(21));
    }

    #[test]
    fn test_entry_carries_write_time() {
        let cache = ResultCache::new(1);
        let before = Instant::now();
        cache.put("temp", 20);

        let entry = cache.entry("temp").unwrap();
        assert_eq!(entry.value, 20);
        assert!(entry.inserted_at >= before);
    }
}
