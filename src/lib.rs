//! # fundament
//!
//! A key-addressed data refresh engine. Register asynchronous data sources
//! under string keys; each source is polled on its own interval, the latest
//! successful value is cached, and every update is fanned out to the
//! listeners of that key.
//!
//! ```text
//!   add_data_source ──► SourceRegistry ──► Scheduler (one timer per key)
//!                                               │ tick (skipped while Busy)
//!                                               ▼
//!                                        fetch(completion)
//!                                               │ complete(value)
//!                                               ▼
//!                           ResultCache.put ──► ObserverRegistry.notify
//!                                                  │   │   │
//!                                                  ▼   ▼   ▼
//!                                               listeners (insertion order)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fundament::{source_fn, Fundament, FundamentConfig};
//!
//! #[tokio::main]
//! async fn main() -> fundament::Result<()> {
//!     let engine: Fundament<f64> = Fundament::new(FundamentConfig::default())?;
//!
//!     engine.add_data_source_with_interval(
//!         "temperature",
//!         source_fn(|| async { Some(21.5) }),
//!         Duration::from_secs(10),
//!     )?;
//!     engine.add_listener("temperature", |t: &f64| println!("now {t}°C"))?;
//!
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!     println!("cached: {:?}", engine.get("temperature"));
//!     Ok(())
//! }
//! ```
//!
//! # Guarantees
//!
//! - At most one fetch per key is in flight; ticks that find the key Busy
//!   are skipped, not queued.
//! - Listeners of a key are notified in insertion order, on the task that
//!   completed the fetch, after the cache has been written.
//! - Cache reads never block on or trigger a fetch. A missing value means
//!   "unknown", never an error.
//!
//! # Known limitation
//!
//! Fetches have no failure channel. A fetch that never completes keeps its
//! key Busy forever, so no later fetch runs for it. Configure
//! [`FundamentConfig::fetch_timeout`] to bound this, and use
//! [`Fundament::source_stats`] to spot stalled sources.

pub mod cache;
pub mod config;
pub mod error;
pub mod fundament;
pub mod ident;
pub mod observer;
pub mod scheduler;
pub mod source;
pub mod stats;
pub mod url;

pub use cache::{EvictionReason, ResultCache};
pub use config::{FundamentConfig, FALLBACK_UPDATE_INTERVAL};
pub use error::{FundamentError, Result};
pub use fundament::Fundament;
pub use ident::IdMode;
pub use observer::{ListenerOptions, Notifiable, TargetAction};
pub use source::{source_fn, Completion, DataSource, TimerStatus};
pub use stats::{FundamentStats, SourceStats};
pub use url::{HttpFetcher, Payload, ResponseFormat, SourceManifest, UrlFetcher, UrlSourceSpec};
