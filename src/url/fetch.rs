//! URL fetchers

use std::time::Duration;

use bytes::Bytes;
use url::Url;

use super::error::UrlError;

/// Retrieves the body behind a URL
#[async_trait::async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Fetch the raw response body
    async fn fetch(&self, url: &Url) -> Result<Bytes, UrlError>;
}

/// HTTP(S) fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Request timeout used by [`HttpFetcher::default`]
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a fetcher with an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Create a fetcher with a request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, UrlError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait::async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, UrlError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UrlError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}
