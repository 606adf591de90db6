//! Data source fetching a URL

use std::marker::PhantomData;
use std::sync::Arc;

use url::Url;

use crate::source::{Completion, DataSource};

use super::fetch::UrlFetcher;
use super::format::{Payload, ResponseFormat};

/// Data source that fetches and decodes a URL on every cycle
pub struct UrlSource<V> {
    url: Url,
    format: ResponseFormat,
    fetcher: Arc<dyn UrlFetcher>,
    _value: PhantomData<fn() -> V>,
}

impl<V> UrlSource<V> {
    /// Create a URL source using `fetcher`
    pub fn new(url: Url, format: ResponseFormat, fetcher: Arc<dyn UrlFetcher>) -> Self {
        Self {
            url,
            format,
            fetcher,
            _value: PhantomData,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }
}

impl<V> DataSource<V> for UrlSource<V>
where
    V: From<Payload> + Send + 'static,
{
    fn fetch(&self, completion: Completion<V>) {
        let url = self.url.clone();
        let format = self.format;
        let fetcher = Arc::clone(&self.fetcher);

        tokio::spawn(async move {
            let body = match fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "URL fetch failed");
                    return;
                }
            };

            match format.decode(body) {
                Ok(payload) => completion.complete(V::from(payload)),
                Err(e) => {
                    tracing::warn!(url = %url, format = %format, error = %e, "URL decode failed")
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::url::UrlError;

    struct Canned(Result<&'static str, u16>);

    #[async_trait::async_trait]
    impl UrlFetcher for Canned {
        async fn fetch(&self, _url: &Url) -> Result<Bytes, UrlError> {
            match self.0 {
                Ok(body) => Ok(Bytes::from_static(body.as_bytes())),
                Err(code) => Err(UrlError::Status(code)),
            }
        }
    }

    fn source(fetcher: Canned, format: ResponseFormat) -> UrlSource<Payload> {
        let url = Url::parse("https://example.com/feed").unwrap();
        UrlSource::new(url, format, Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_decoded_body_completes() {
        let source = source(Canned(Ok(r#"{"unread": 4}"#)), ResponseFormat::Json);
        let (completion, rx) = Completion::channel();

        source.fetch(completion);
        let payload = rx.await.unwrap();
        assert_eq!(payload.as_json().unwrap()["unread"], 4);
    }

    #[tokio::test]
    async fn test_http_failure_is_silence() {
        let source = source(Canned(Err(503)), ResponseFormat::Json);
        let (completion, rx) = Completion::channel();

        source.fetch(completion);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_decode_failure_is_silence() {
        let source = source(Canned(Ok("<html>")), ResponseFormat::Json);
        let (completion, rx) = Completion::channel();

        source.fetch(completion);
        assert!(rx.await.is_err());
    }
}
