//! Offline cache for storefront pages and assets.
//!
//! # Architecture
//!
//! - [`CacheStorage`] keeps named cache versions side by side
//! - [`OfflineCache`] owns the current version: it precaches on
//!   [`install`](OfflineCache::install), drops stale versions on
//!   [`activate`](OfflineCache::activate), and serves requests network-first
//!   with a cache fallback
//! - [`Network`] is the seam to the outside world; [`HttpNetwork`] uses
//!   `reqwest`
//! - [`events`] handles background-sync tags and push notifications

pub mod events;
mod network;
mod storage;

use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

pub use network::{HttpNetwork, Network};
pub use storage::{CacheStorage, CachedResponse, cache_key};

use crate::config::OfflineConfig;

/// Offline cache error.
#[derive(Debug, Error)]
pub enum OfflineError {
    /// The request failed in transit.
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// A precache URL answered with a non-success status.
    #[error("Precache of {url} returned {status}")]
    Status { url: String, status: u16 },

    /// Neither the network nor any cache could answer.
    #[error("{0} is unavailable offline")]
    Unavailable(String),
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
}

/// A response and its origin.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: CachedResponse,
    pub source: Source,
}

/// Versioned, network-first response cache.
pub struct OfflineCache<N> {
    name: String,
    storage: CacheStorage,
    network: N,
}

impl<N: Network> OfflineCache<N> {
    /// Cache version `name` in `storage`.
    #[must_use]
    pub fn new(name: impl Into<String>, storage: CacheStorage, network: N) -> Self {
        Self {
            name: name.into(),
            storage,
            network,
        }
    }

    /// Cache configured by `config`, with fresh storage.
    #[must_use]
    pub fn from_config(config: &OfflineConfig, network: N) -> Self {
        Self::new(
            config.cache_name.clone(),
            CacheStorage::new(config.capacity),
            network,
        )
    }

    /// Current cache version.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Fetch and store every URL.
    ///
    /// All URLs are fetched before anything is stored, so a failure leaves
    /// the cache untouched.
    ///
    /// # Errors
    ///
    /// Returns the first transport failure or non-success status.
    #[instrument(skip(self, urls), fields(cache = %self.name, urls = urls.len()))]
    pub async fn install(&self, urls: &[Url]) -> Result<usize, OfflineError> {
        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            let response = self.network.fetch(url).await?;
            if !response.is_success() {
                warn!(url = %url, status = response.status, "Precache request failed");
                return Err(OfflineError::Status {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            fetched.push((cache_key(url), response));
        }

        let cache = self.storage.open(&self.name);
        for (key, response) in fetched {
            cache.insert(key, response).await;
        }

        info!(count = urls.len(), "Precached offline resources");
        Ok(urls.len())
    }

    /// Delete every cache version except the current one.
    ///
    /// Returns the deleted names.
    #[instrument(skip(self), fields(cache = %self.name))]
    pub fn activate(&self) -> Vec<String> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|name| *name != self.name)
            .collect();

        for name in &stale {
            info!(stale = %name, "Clearing old cache");
            self.storage.delete(name);
        }
        stale
    }

    /// Fetch a URL, network first.
    ///
    /// Successful network responses are stored in the current version. When
    /// the network fails, any cached copy is served instead.
    ///
    /// # Errors
    ///
    /// Returns `OfflineError::Unavailable` when the network fails and no
    /// cache holds the URL.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<Served, OfflineError> {
        match self.network.fetch(url).await {
            Ok(response) => {
                if response.is_success() {
                    self.storage
                        .open(&self.name)
                        .insert(cache_key(url), response.clone())
                        .await;
                }
                Ok(Served {
                    response,
                    source: Source::Network,
                })
            }
            Err(e) => {
                warn!(error = %e, "Network failed, trying cache");
                self.storage
                    .match_url(url)
                    .await
                    .map(|response| Served {
                        response,
                        source: Source::Cache,
                    })
                    .ok_or_else(|| OfflineError::Unavailable(url.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    /// Serves canned statuses; URLs without one fail in transit.
    #[derive(Default)]
    struct FakeNetwork {
        routes: Mutex<HashMap<String, u16>>,
    }

    impl FakeNetwork {
        fn route(&self, url: &Url, status: u16) {
            self.routes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(url.to_string(), status);
        }

        fn go_offline(&self) {
            self.routes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, url: &Url) -> Result<CachedResponse, OfflineError> {
            let status = self
                .routes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(url.as_str())
                .copied()
                .ok_or_else(|| OfflineError::Network {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                })?;
            Ok(CachedResponse {
                status,
                content_type: Some("text/html".to_string()),
                body: url.path().as_bytes().to_vec(),
                fetched_at: Utc::now(),
            })
        }
    }

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:5000").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_install_stores_every_url() {
        let network = Arc::new(FakeNetwork::default());
        let urls = [url("/"), url("/beans")];
        for u in &urls {
            network.route(u, 200);
        }
        let cache = OfflineCache::new("v1", CacheStorage::new(10), Arc::clone(&network));

        assert_eq!(cache.install(&urls).await.unwrap(), 2);

        network.go_offline();
        let served = cache.fetch(&url("/beans")).await.unwrap();
        assert_eq!(served.source, Source::Cache);
        assert_eq!(served.response.body, b"/beans");
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let network = Arc::new(FakeNetwork::default());
        network.route(&url("/"), 200);
        network.route(&url("/machines"), 404);
        let cache = OfflineCache::new("v1", CacheStorage::new(10), Arc::clone(&network));

        let err = cache
            .install(&[url("/"), url("/machines")])
            .await
            .unwrap_err();
        assert!(matches!(err, OfflineError::Status { status: 404, .. }));

        network.go_offline();
        assert!(matches!(
            cache.fetch(&url("/")).await.unwrap_err(),
            OfflineError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_install_aborts_on_transport_failure() {
        let network = Arc::new(FakeNetwork::default());
        network.route(&url("/"), 200);
        let cache = OfflineCache::new("v1", CacheStorage::new(10), Arc::clone(&network));

        let err = cache.install(&[url("/"), url("/beans")]).await.unwrap_err();
        assert!(matches!(err, OfflineError::Network { .. }));
        assert!(cache.storage().match_url(&url("/")).await.is_none());
    }

    #[tokio::test]
    async fn test_activate_removes_only_other_versions() {
        let storage = CacheStorage::new(10);
        let _ = storage.open("cruzy-coffee-v0");
        let _ = storage.open("cruzy-coffee-v1");
        let _ = storage.open("scratch");
        let network = Arc::new(FakeNetwork::default());
        let cache = OfflineCache::new("cruzy-coffee-v1", storage.clone(), Arc::clone(&network));

        let deleted = cache.activate();

        assert_eq!(deleted, vec!["cruzy-coffee-v0", "scratch"]);
        assert_eq!(storage.keys(), vec!["cruzy-coffee-v1"]);
    }

    #[tokio::test]
    async fn test_fetch_prefers_network() {
        let network = Arc::new(FakeNetwork::default());
        network.route(&url("/accessories"), 200);
        let cache = OfflineCache::new("v1", CacheStorage::new(10), Arc::clone(&network));

        let served = cache.fetch(&url("/accessories")).await.unwrap();
        assert_eq!(served.source, Source::Network);

        // Stored on the way through
        network.go_offline();
        let served = cache.fetch(&url("/accessories")).await.unwrap();
        assert_eq!(served.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_error_status_is_served_but_not_stored() {
        let network = Arc::new(FakeNetwork::default());
        network.route(&url("/orders"), 500);
        let cache = OfflineCache::new("v1", CacheStorage::new(10), Arc::clone(&network));

        let served = cache.fetch(&url("/orders")).await.unwrap();
        assert_eq!(served.response.status, 500);
        assert_eq!(served.source, Source::Network);
        assert!(cache.storage().match_url(&url("/orders")).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_without_network_or_cache() {
        let network = Arc::new(FakeNetwork::default());
        let cache = OfflineCache::new("v1", CacheStorage::new(10), Arc::clone(&network));

        let err = cache.fetch(&url("/")).await.unwrap_err();
        assert_eq!(err.to_string(), "http://localhost:5000/ is unavailable offline");
    }
}
