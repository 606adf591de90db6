//! Observer registry implementation

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::error::{FundamentError, Result};
use crate::ident::{qualify, IdAllocator};

use super::listener::{ListenerOptions, Notifiable};

type ListenerMap<V> = IndexMap<String, Arc<dyn Notifiable<V>>>;

/// Listeners per data source key
///
/// Delivery iterates over a snapshot, so listeners may add or remove
/// listeners (including themselves) from inside a notification.
pub struct ObserverRegistry<V> {
    listeners: RwLock<HashMap<String, ListenerMap<V>>>,
    allocator: IdAllocator,
}

impl<V> ObserverRegistry<V> {
    /// Create an empty registry using `allocator` for generated ids
    pub fn new(allocator: IdAllocator) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            allocator,
        }
    }

    /// Add a listener for `key`
    ///
    /// Namespaced ids only collide under `key`; unnamespaced ids are unique
    /// across every key. Returns the fully-qualified id, or
    /// `DuplicateListener` if the id is taken and overwriting is disabled.
    pub fn add(
        &self,
        key: &str,
        listener: Arc<dyn Notifiable<V>>,
        options: ListenerOptions,
    ) -> Result<String> {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let namespacing = options.namespacing;

        let local_id = match options.id {
            Some(id) => id,
            None => {
                let hint = listener.describe();
                self.allocator.allocate(hint.as_deref(), |candidate| {
                    let id = qualify(key, candidate, namespacing);
                    let taken = holders(&*listeners, key, &id, namespacing).next().is_some();
                    taken
                })
            }
        };
        let id = qualify(key, &local_id, namespacing);

        let taken: Vec<String> = holders(&*listeners, key, &id, namespacing).collect();
        if !taken.is_empty() {
            if !options.overwrite {
                tracing::debug!(key = %key, listener_id = %id, "Listener rejected: id in use");
                return Err(FundamentError::DuplicateListener(id));
            }
            for holder in &taken {
                if let Some(for_key) = listeners.get_mut(holder) {
                    for_key.shift_remove(&id);
                }
            }
            listeners.retain(|_, for_key| !for_key.is_empty());
            tracing::debug!(key = %key, listener_id = %id, "Listener overwritten");
        }

        let for_key = listeners.entry(key.to_string()).or_default();
        for_key.insert(id.clone(), listener);

        tracing::debug!(
            key = %key,
            listener_id = %id,
            listeners = for_key.len(),
            "Listener added"
        );

        Ok(id)
    }

    /// Remove every listener with this fully-qualified id
    ///
    /// Returns true if anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;

        for (key, for_key) in listeners.iter_mut() {
            if for_key.shift_remove(id).is_some() {
                removed = true;
                tracing::debug!(key = %key, listener_id = %id, "Listener removed");
            }
        }
        listeners.retain(|_, for_key| !for_key.is_empty());

        removed
    }

    /// Remove all listeners for a key
    ///
    /// Returns the number of listeners dropped.
    pub fn remove_key(&self, key: &str) -> usize {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map_or(0, |for_key| for_key.len())
    }

    /// Deliver a value to every listener of `key` in insertion order
    ///
    /// Returns the number of listeners notified.
    pub fn notify(&self, key: &str, value: &V) -> usize {
        let snapshot: Vec<(String, Arc<dyn Notifiable<V>>)> = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            match listeners.get(key) {
                Some(for_key) => for_key
                    .iter()
                    .map(|(id, listener)| (id.clone(), Arc::clone(listener)))
                    .collect(),
                None => return 0,
            }
        };

        for (id, listener) in &snapshot {
            tracing::trace!(key = %key, listener_id = %id, "Delivering update");
            listener.notify(value);
        }

        snapshot.len()
    }

    /// Fully-qualified ids for a key, in delivery order
    pub fn listener_ids(&self, key: &str) -> Vec<String> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|for_key| for_key.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of listeners for a key
    pub fn listener_count(&self, key: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |for_key| for_key.len())
    }

    /// Number of listeners across all keys
    pub fn total_listeners(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|for_key| for_key.len())
            .sum()
    }
}

/// Keys holding a listener with `id`
///
/// Only `key` itself is searched when the id is namespaced.
fn holders<'a, V>(
    listeners: &'a HashMap<String, ListenerMap<V>>,
    key: &'a str,
    id: &'a str,
    namespacing: bool,
) -> impl Iterator<Item = String> + 'a {
    listeners
        .iter()
        .filter(move |(holder, for_key)| {
            (!namespacing || holder.as_str() == key) && for_key.contains_key(id)
        })
        .map(|(holder, _)| holder.clone())
}
