//! Identifier allocation

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

/// How ids are generated when the caller does not supply one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMode {
    /// Human-readable ids built from the observer's name
    Descriptive,
    /// Random UUID v4 tokens
    Opaque,
}

/// Process-unique id generator
///
/// Descriptive ids are unique by construction: every hint carries its own
/// counter, and candidates the caller reports as taken are skipped.
#[derive(Debug)]
pub struct IdAllocator {
    mode: IdMode,
    /// Next suffix per descriptive hint
    issued: Mutex<HashMap<String, u64>>,
}

impl IdAllocator {
    /// Create an allocator in the given mode
    pub fn new(mode: IdMode) -> Self {
        Self {
            mode,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Allocation mode
    pub fn mode(&self) -> IdMode {
        self.mode
    }

    /// Generate a random token
    pub fn opaque(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Allocate an id
    ///
    /// Falls back to an opaque token when the allocator is opaque or no
    /// usable hint is given. `is_taken` lets the caller reject candidates
    /// that collide with ids it already holds.
    pub fn allocate(&self, hint: Option<&str>, is_taken: impl Fn(&str) -> bool) -> String {
        let hint = match (self.mode, hint.map(sanitize)) {
            (IdMode::Descriptive, Some(hint)) if !hint.is_empty() => hint,
            _ => return self.opaque(),
        };

        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        let next = issued.entry(hint.clone()).or_insert(1);

        loop {
            let candidate = if *next == 1 {
                hint.clone()
            } else {
                format!("{}-{}", hint, next)
            };
            *next += 1;

            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(IdMode::Opaque)
    }
}

/// Apply the namespacing rule to a local id
pub fn qualify(key: &str, local_id: &str, namespacing: bool) -> String {
    if namespacing {
        format!("{}.{}", key, local_id)
    } else {
        local_id.to_string()
    }
}

fn sanitize(hint: &str) -> String {
    hint.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '.' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("news", "x", true), "news.x");
        assert_eq!(qualify("news", "x", false), "x");
    }

    #[test]
    fn test_opaque_ids_are_uuids() {
        let alloc = IdAllocator::new(IdMode::Opaque);
        let id = alloc.allocate(Some("Inbox_refresh"), |_| false);

        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_opaque_ids_do_not_repeat() {
        let alloc = IdAllocator::default();
        let ids: HashSet<String> = (0..1000).map(|_| alloc.allocate(None, |_| false)).collect();

        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_descriptive_ids_are_suffixed() {
        let alloc = IdAllocator::new(IdMode::Descriptive);

        assert_eq!(alloc.allocate(Some("Inbox_refresh"), |_| false), "Inbox_refresh");
        assert_eq!(alloc.allocate(Some("Inbox_refresh"), |_| false), "Inbox_refresh-2");
        assert_eq!(alloc.allocate(Some("Inbox_refresh"), |_| false), "Inbox_refresh-3");
        assert_eq!(alloc.allocate(Some("Weather_show"), |_| false), "Weather_show");
    }

    #[test]
    fn test_descriptive_skips_taken_candidates() {
        let alloc = IdAllocator::new(IdMode::Descriptive);
        let taken: HashSet<&str> = ["Inbox_refresh", "Inbox_refresh-2"].into_iter().collect();

        let id = alloc.allocate(Some("Inbox_refresh"), |c| taken.contains(c));
        assert_eq!(id, "Inbox_refresh-3");
    }

    #[test]
    fn test_descriptive_without_hint_is_opaque() {
        let alloc = IdAllocator::new(IdMode::Descriptive);

        assert!(Uuid::parse_str(&alloc.allocate(None, |_| false)).is_ok());
        assert!(Uuid::parse_str(&alloc.allocate(Some("   "), |_| false)).is_ok());
    }

    #[test]
    fn test_hint_dots_are_replaced() {
        let alloc = IdAllocator::new(IdMode::Descriptive);

        assert_eq!(alloc.allocate(Some("a.b c"), |_| false), "a_b_c");
    }
}
