//! Named response caches.
//!
//! [`CacheStorage`] holds every cache version side by side, the way a
//! browser keeps old service-worker caches until they are deleted. Each
//! cache is a bounded `moka` cache keyed by URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use url::Url;

/// A stored response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// When the response came off the network.
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Cache key for a URL. Fragments never reach the server, so they are dropped.
#[must_use]
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// Every named cache, shared between clones.
#[derive(Clone)]
pub struct CacheStorage {
    capacity: u64,
    caches: Arc<Mutex<HashMap<String, Cache<String, CachedResponse>>>>,
}

impl CacheStorage {
    /// Storage whose caches hold at most `capacity` responses each.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            caches: Arc::default(),
        }
    }

    /// Open a cache, creating it if needed.
    #[must_use]
    pub fn open(&self, name: &str) -> Cache<String, CachedResponse> {
        self.lock()
            .entry(name.to_string())
            .or_insert_with(|| Cache::builder().max_capacity(self.capacity).build())
            .clone()
    }

    /// Whether a cache exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of every cache, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Delete a cache and everything in it. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let removed = self.lock().remove(name);
        if let Some(cache) = &removed {
            cache.invalidate_all();
        }
        removed.is_some()
    }

    /// Look a URL up in every cache, in name order.
    pub async fn match_url(&self, url: &Url) -> Option<CachedResponse> {
        let key = cache_key(url);
        let caches: Vec<_> = {
            let caches = self.lock();
            let mut named: Vec<_> = caches.iter().collect();
            named.sort_by(|a, b| a.0.cmp(b.0));
            named.into_iter().map(|(_, cache)| cache.clone()).collect()
        };

        for cache in caches {
            if let Some(response) = cache.get(&key).await {
                return Some(response);
            }
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Cache<String, CachedResponse>>> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
