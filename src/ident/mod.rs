//! Listener and source identifiers
//!
//! Ids are either descriptive (`"Inbox_refresh"`, suffixed `-2`, `-3`, ... on
//! reuse) or opaque UUID v4 tokens. Namespacing prefixes a listener's local id
//! with its data source key: `"news" + "x" -> "news.x"`.

pub mod allocator;

pub use allocator::{qualify, IdAllocator, IdMode};
