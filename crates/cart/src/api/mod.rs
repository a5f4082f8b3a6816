//! Storefront cart API.
//!
//! # Architecture
//!
//! - [`CartApi`] is the seam between the mini cart and the server; the mini
//!   cart only ever talks to this trait, so tests and other transports can
//!   stand in for HTTP
//! - [`HttpCartApi`] speaks the storefront's `/cart/*` endpoints over
//!   `reqwest`, keeping the session cookie between calls
//! - [`wire`] holds the single JSON schema used by every endpoint
//!
//! # Example
//!
//! ```rust,ignore
//! use cruzy_cart::api::{CartApi, HttpCartApi};
//!
//! let api = HttpCartApi::new(&config)?;
//! api.add(ProductId::new(12), 1).await?;
//! let snapshot = api.snapshot().await?;
//! ```

mod http;
pub mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use cruzy_core::{CartSnapshot, LineKey, ProductId};

pub use http::HttpCartApi;

use crate::error::Result;

/// Acknowledgement of a successful mutation.
///
/// The authoritative cart state is always fetched separately; the count here
/// is informational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Server message, if any.
    pub message: Option<String>,
    /// Item count the server reported alongside the acknowledgement.
    pub item_count: Option<u32>,
}

/// Operations the server exposes on the shopper's cart.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Add `quantity` units of a product.
    async fn add(&self, product_id: ProductId, quantity: u32) -> Result<MutationOutcome>;

    /// Set the quantity of a line; zero removes it.
    async fn update(&self, line_key: &LineKey, quantity: u32) -> Result<MutationOutcome>;

    /// Remove a line.
    async fn remove(&self, line_key: &LineKey) -> Result<MutationOutcome>;

    /// Remove every line.
    async fn clear(&self) -> Result<MutationOutcome>;

    /// Fetch the current cart.
    async fn snapshot(&self) -> Result<CartSnapshot>;

    /// Fetch only the item count.
    async fn count(&self) -> Result<u32>;
}

#[async_trait]
impl<T: CartApi + ?Sized> CartApi for Arc<T> {
    async fn add(&self, product_id: ProductId, quantity: u32) -> Result<MutationOutcome> {
        (**self).add(product_id, quantity).await
    }

    async fn update(&self, line_key: &LineKey, quantity: u32) -> Result<MutationOutcome> {
        (**self).update(line_key, quantity).await
    }

    async fn remove(&self, line_key: &LineKey) -> Result<MutationOutcome> {
        (**self).remove(line_key).await
    }

    async fn clear(&self) -> Result<MutationOutcome> {
        (**self).clear().await
    }

    async fn snapshot(&self) -> Result<CartSnapshot> {
        (**self).snapshot().await
    }

    async fn count(&self) -> Result<u32> {
        (**self).count().await
    }
}
