//! Offline cache and service-worker event commands.

use cruzy_cart::CartConfig;
use cruzy_cart::offline::events::{PushNotification, SyncTag};
use cruzy_cart::offline::{HttpNetwork, OfflineCache};

use super::cart::{mini_cart, print_snapshot};

/// Precache the configured URLs and activate the cache.
///
/// The cache lives in memory for this process only, so this checks that
/// every precache URL can be fetched rather than persisting anything.
#[allow(clippy::print_stdout)]
pub async fn precache(config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache = OfflineCache::from_config(&config.offline, HttpNetwork::default());

    let stored = cache.install(&config.offline.precache_urls).await?;
    cache.activate();

    println!("Cached {stored} resources in {}", cache.name());
    Ok(())
}

/// Run a background-sync tag.
#[allow(clippy::print_stdout)]
pub async fn sync(config: &CartConfig, tag: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (cart, _page) = mini_cart(config)?;
    match SyncTag::parse(tag).run(&cart).await? {
        Some(snapshot) => print_snapshot(&snapshot),
        None => println!("Nothing to do for tag {tag}"),
    }
    Ok(())
}

/// Print the notification for a push payload as JSON.
#[allow(clippy::print_stdout)]
pub fn push(payload: Option<&str>) {
    let notification = PushNotification::from_payload(payload);
    match serde_json::to_string_pretty(&notification) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to encode notification"),
    }
}
