//! Offline cache tests against the fake storefront.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use cruzy_cart::config::RegionIds;
use cruzy_cart::notify::RecordingNotifier;
use cruzy_cart::offline::events::SyncTag;
use cruzy_cart::offline::{CacheStorage, HttpNetwork, OfflineCache, OfflineError, Source};
use cruzy_cart::page::MemoryPage;
use cruzy_cart::{CartApi, CartSync, HttpCartApi};
use cruzy_core::{CurrencyCode, ProductId};
use cruzy_integration_tests::FakeStorefront;
use url::Url;

fn urls(base: &Url, paths: &[&str]) -> Vec<Url> {
    paths.iter().map(|p| base.join(p).unwrap()).collect()
}

#[tokio::test]
async fn test_precached_pages_survive_the_server_going_away() {
    let store = FakeStorefront::spawn().await.unwrap();
    let base = store.base_url().clone();
    let storage = CacheStorage::new(100);

    let cache = OfflineCache::new("cruzy-coffee-v1", storage.clone(), HttpNetwork::default());
    let stored = cache
        .install(&urls(&base, &["/", "/machines", "/beans"]))
        .await
        .unwrap();
    assert_eq!(stored, 3);

    store.shutdown().await;

    // A fresh client has no pooled connections to the dead server
    let cache = OfflineCache::new("cruzy-coffee-v1", storage, HttpNetwork::default());
    let served = cache.fetch(&base.join("/beans").unwrap()).await.unwrap();
    assert_eq!(served.source, Source::Cache);
    assert_eq!(served.response.body, b"<h1>Cruzy Coffee /beans</h1>");

    let err = cache.fetch(&base.join("/accessories").unwrap()).await.unwrap_err();
    assert!(matches!(err, OfflineError::Unavailable(_)));
}

#[tokio::test]
async fn test_install_fails_on_missing_page() {
    let store = FakeStorefront::spawn().await.unwrap();
    let base = store.base_url().clone();
    let cache = OfflineCache::new("v1", CacheStorage::new(100), HttpNetwork::default());

    let err = cache
        .install(&urls(&base, &["/", "/no-such-page"]))
        .await
        .unwrap_err();

    assert!(matches!(err, OfflineError::Status { status: 404, .. }));
    assert!(cache.storage().match_url(&base).await.is_none());
}

#[tokio::test]
async fn test_network_first_serves_live_content() {
    let store = FakeStorefront::spawn().await.unwrap();
    let cache = OfflineCache::new("v1", CacheStorage::new(100), HttpNetwork::default());

    let served = cache
        .fetch(&store.base_url().join("/machines").unwrap())
        .await
        .unwrap();

    assert_eq!(served.source, Source::Network);
    assert_eq!(served.response.status, 200);
    assert!(
        served
            .response
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("text/html")
    );
}

#[tokio::test]
async fn test_activate_after_upgrade() {
    let storage = CacheStorage::new(100);
    let old = OfflineCache::new("cruzy-coffee-v1", storage.clone(), HttpNetwork::default());
    let store = FakeStorefront::spawn().await.unwrap();
    old.install(&urls(store.base_url(), &["/"])).await.unwrap();

    let new = OfflineCache::new("cruzy-coffee-v2", storage.clone(), HttpNetwork::default());
    new.install(&urls(store.base_url(), &["/"])).await.unwrap();

    assert_eq!(new.activate(), vec!["cruzy-coffee-v1"]);
    assert_eq!(storage.keys(), vec!["cruzy-coffee-v2"]);
}

#[tokio::test]
async fn test_sync_cart_tag_refreshes_mini_cart() {
    let store = FakeStorefront::spawn().await.unwrap();
    let ids = RegionIds::default();
    let api = HttpCartApi::with_base_url(store.base_url().clone(), CurrencyCode::USD, None).unwrap();
    let page = MemoryPage::new().with_region(&ids.badge).with_region(&ids.panel);
    let cart = CartSync::attach(api, &page, Arc::new(RecordingNotifier::new()), &ids);
    cart.api().add(ProductId::new(2), 3).await.unwrap();
    assert_eq!(page.text(&ids.badge).unwrap(), "");

    let snapshot = SyncTag::parse("sync-cart").run(&cart).await.unwrap().unwrap();
    assert_eq!(snapshot.item_count(), 3);
    assert_eq!(page.text(&ids.badge).unwrap(), "3");

    assert!(SyncTag::parse("sync-orders").run(&cart).await.unwrap().is_none());
}
