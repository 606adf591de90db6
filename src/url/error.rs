//! URL source error types

use std::fmt;

use super::format::ResponseFormat;

/// Error type for fetching and decoding URL sources
#[derive(Debug)]
pub enum UrlError {
    /// Transport-level failure
    Http(reqwest::Error),
    /// Non-success HTTP status
    Status(u16),
    /// Body could not be decoded as the expected format
    Decode {
        format: ResponseFormat,
        message: String,
    },
    /// Unknown format tag
    UnknownFormat(String),
}

impl UrlError {
    pub(crate) fn decode(format: ResponseFormat, err: impl fmt::Display) -> Self {
        UrlError::Decode {
            format,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlError::Http(e) => write!(f, "HTTP request failed: {}", e),
            UrlError::Status(code) => write!(f, "Unexpected HTTP status: {}", code),
            UrlError::Decode { format, message } => {
                write!(f, "Failed to decode {} response: {}", format, message)
            }
            UrlError::UnknownFormat(tag) => write!(f, "Unknown response format: {}", tag),
        }
    }
}

impl std::error::Error for UrlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UrlError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UrlError {
    fn from(e: reqwest::Error) -> Self {
        UrlError::Http(e)
    }
}
