//! Data source registry
//!
//! A data source is a value producer registered under a string key. Each
//! registration becomes a [`SourceEntry`] that owns the fetch function, the
//! refresh interval and the Idle/Busy flag the scheduler uses to keep at most
//! one fetch per key in flight.
//!
//! # Fetch contract
//!
//! A fetch receives a one-shot [`Completion`]. Calling
//! [`Completion::complete`] delivers a value. There is no failure channel:
//!
//! - never completing keeps the entry Busy, so no further fetch runs for that
//!   key (unless a fetch timeout is configured)
//! - dropping the completion unused counts as "no update this cycle"
//!
//! ```text
//!   tick ──► Idle? ──yes──► Busy ──► fetch(completion)
//!              │                          │
//!              no (skip)          complete(value)
//!                                         │
//!                     cache.put ──► Idle ──► notify listeners
//! ```

pub mod completion;
pub mod entry;
pub mod store;

pub use completion::{source_fn, Completion, DataSource, FnSource};
pub use entry::{SourceEntry, TimerStatus};
pub use store::SourceRegistry;
