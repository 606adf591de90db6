//! URL data sources
//!
//! Turns `(url, format)` pairs into data sources: the body is fetched with a
//! pluggable [`UrlFetcher`] (HTTP via `reqwest` by default) and decoded into a
//! [`Payload`] according to its [`ResponseFormat`]. Network and decode
//! failures are logged and treated as "no update this cycle".
//!
//! A [`SourceManifest`] registers many URL sources at once:
//!
//! ```json
//! {
//!   "weather": { "format": "json",  "url": "https://example.com/weather.json" },
//!   "motd":    { "format": "string", "url": "https://example.com/motd.txt" }
//! }
//! ```

pub mod error;
pub mod fetch;
pub mod format;
pub mod manifest;
pub mod source;

pub use error::UrlError;
pub use fetch::{HttpFetcher, UrlFetcher};
pub use format::{Payload, ResponseFormat};
pub use manifest::{SourceManifest, UrlSourceSpec, DEFAULT_MANIFEST_FILE};
pub use source::UrlSource;
