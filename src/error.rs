//! Error types
//!
//! Registry conflicts are reported synchronously through [`FundamentError`].
//! Fetch functions have no failure channel; a fetch that never completes is
//! visible only through [`crate::stats::SourceStats`].

use std::fmt;
use std::io;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, FundamentError>;

/// Error type for registry and facade operations
#[derive(Debug)]
pub enum FundamentError {
    /// A data source is already registered under this key
    DuplicateKey(String),
    /// A listener with this fully-qualified id exists and overwriting was disabled
    DuplicateListener(String),
    /// No data source is registered under this key
    UnknownSource(String),
    /// The facade was created outside of a Tokio runtime
    NoRuntime,
    /// A source manifest could not be parsed
    Manifest(String),
    /// I/O failure while reading a source manifest
    Io(io::Error),
}

impl fmt::Display for FundamentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundamentError::DuplicateKey(key) => {
                write!(f, "Data source already registered: {}", key)
            }
            FundamentError::DuplicateListener(id) => {
                write!(f, "Listener already registered: {}", id)
            }
            FundamentError::UnknownSource(key) => write!(f, "Unknown data source: {}", key),
            FundamentError::NoRuntime => write!(f, "No Tokio runtime available"),
            FundamentError::Manifest(msg) => write!(f, "Invalid source manifest: {}", msg),
            FundamentError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FundamentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FundamentError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FundamentError {
    fn from(e: io::Error) -> Self {
        FundamentError::Io(e)
    }
}

impl From<serde_json::Error> for FundamentError {
    fn from(e: serde_json::Error) -> Self {
        FundamentError::Manifest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_key() {
        let err = FundamentError::DuplicateKey("news".into());
        assert_eq!(err.to_string(), "Data source already registered: news");

        let err = FundamentError::DuplicateListener("news.x".into());
        assert_eq!(err.to_string(), "Listener already registered: news.x");
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;

        let err = FundamentError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(err.source().is_some());
        assert!(FundamentError::NoRuntime.source().is_none());
    }
}
