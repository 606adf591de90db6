//! Best-effort result cache
//!
//! Holds the most recent successful value per data source key. Entries can
//! disappear at any time: the store is bounded, and the host can signal
//! memory pressure through [`ResultCache::purge`]. Callers must treat a
//! missing entry as "not known yet", never as an error.

pub mod store;

pub use store::{CacheEntry, EvictionHook, EvictionReason, ResultCache};
