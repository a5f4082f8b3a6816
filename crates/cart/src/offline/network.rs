//! Network access for the offline cache.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::OfflineError;
use super::storage::CachedResponse;

/// Fetches responses from the network.
#[async_trait]
pub trait Network: Send + Sync {
    /// GET a URL.
    ///
    /// Any response the server sends, whatever its status, is `Ok`; only a
    /// transport failure is an error.
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, OfflineError>;
}

#[async_trait]
impl<T: Network + ?Sized> Network for std::sync::Arc<T> {
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, OfflineError> {
        (**self).fetch(url).await
    }
}

/// [`Network`] over `reqwest`.
#[derive(Clone, Default)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, OfflineError> {
        let network_error = |e: reqwest::Error| OfflineError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network_error)?.to_vec();

        debug!(url = %url, status, bytes = body.len(), "Fetched from network");

        Ok(CachedResponse {
            status,
            content_type,
            body,
            fetched_at: Utc::now(),
        })
    }
}
