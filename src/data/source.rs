//! Document sources
//!
//! [`DocumentSource`] is the seam the cache fetches through. [`HttpSource`]
//! implements it against a static document store reachable over HTTP.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{DocId, FetchError};

/// Default request timeout for document fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// A store that returns raw Markdown text for a document identifier
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Retrieves the raw Markdown text of `id`
    async fn fetch_text(&self, id: &DocId) -> Result<String, FetchError>;

    /// Where a reader can view `id` outside this tool
    fn location(&self, id: &DocId) -> String;
}

#[async_trait]
impl<S: DocumentSource + ?Sized> DocumentSource for Arc<S> {
    async fn fetch_text(&self, id: &DocId) -> Result<String, FetchError> {
        (**self).fetch_text(id).await
    }

    fn location(&self, id: &DocId) -> String {
        (**self).location(id)
    }
}

/// Client for fetching documents from an HTTP document store
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpSource {
    /// Creates a source reading `<base_url>/<id>.md` with the default timeout
    pub fn new(base_url: Url) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, DEFAULT_FETCH_TIMEOUT)
    }

    /// Creates a source with a custom request timeout
    pub fn with_timeout(mut base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docdown/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the document named by `id`
    pub fn document_url(&self, id: &DocId) -> Url {
        // DocId only holds [A-Za-z0-9_-], so joining cannot leave the base path.
        self.base_url
            .join(&id.resource_path())
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch_text(&self, id: &DocId) -> Result<String, FetchError> {
        let url = self.document_url(id);
        debug!("GET {}", url);

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    id: id.to_string(),
                    after: self.timeout,
                }
            } else {
                FetchError::Network {
                    id: id.to_string(),
                    source: e,
                }
            }
        };

        let response = self.client.get(url.clone()).send().await.map_err(map_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.starts_with("text/") {
                debug!("Unexpected content type '{}' for {}", content_type, url);
            }
        }

        let text = response.text().await.map_err(map_err)?;
        info!("Fetched {} bytes from {}", text.len(), url);
        Ok(text)
    }

    fn location(&self, id: &DocId) -> String {
        self.document_url(id).to_string()
    }
}
