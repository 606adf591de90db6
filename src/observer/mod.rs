//! Observer registry
//!
//! Listeners are kept per data source key in insertion order, which is also
//! the delivery order. Each listener has a fully-qualified id:
//!
//! ```text
//!   namespacing on:   "<key>.<local id>"    e.g. "news.ticker"
//!   namespacing off:  "<local id>"          e.g. "ticker"
//! ```
//!
//! The local id is caller-supplied or allocated. A namespaced id is unique
//! under its key; an unnamespaced id is unique across all keys. Adding a
//! listener whose id is already taken replaces the old one (the new one goes
//! to the back of its key) unless overwriting is disabled, in which case the
//! add is refused with [`crate::FundamentError::DuplicateListener`].

pub mod listener;
pub mod store;

pub use listener::{ListenerOptions, Notifiable, TargetAction};
pub use store::ObserverRegistry;
