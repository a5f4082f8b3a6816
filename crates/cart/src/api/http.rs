//! HTTP implementation of the storefront cart API.
//!
//! Uses `reqwest` with a cookie store so the storefront session (and the cart
//! it holds) survives between calls. Requests are sent once: no retries, no
//! timeouts.

use std::sync::Arc;

use async_trait::async_trait;
use cruzy_core::{CartSnapshot, CurrencyCode, LineKey, ProductId};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::wire::{AddRequest, CountResponse, MiniCartResponse, MutationEnvelope, UpdateRequest};
use super::{CartApi, MutationOutcome};
use crate::config::CartConfig;
use crate::error::{CartError, Result};

/// Characters of a response body kept in logs and error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// Shown when a mutation targets a product or line the server no longer has.
const GONE_MESSAGE: &str = "That item is no longer available.";

// =============================================================================
// HttpCartApi
// =============================================================================

/// Client for the storefront `/cart/*` endpoints.
///
/// Cheap to clone; clones share the connection pool and cookie store.
#[derive(Clone)]
pub struct HttpCartApi {
    inner: Arc<HttpCartApiInner>,
}

struct HttpCartApiInner {
    client: reqwest::Client,
    base_url: Url,
    currency: CurrencyCode,
}

impl HttpCartApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CartConfig) -> Result<Self> {
        Self::with_base_url(
            config.base_url.clone(),
            config.currency,
            config.session_cookie.as_ref(),
        )
    }

    /// Create a client for the storefront at `base_url`.
    ///
    /// `session_cookie` (`name=value`) seeds the cookie store so an existing
    /// cart is picked up.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_base_url(
        mut base_url: Url,
        currency: CurrencyCode,
        session_cookie: Option<&SecretString>,
    ) -> Result<Self> {
        // Endpoints are joined relative to the base, which needs a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(reqwest::cookie::Jar::default());
        if let Some(cookie) = session_cookie {
            jar.add_cookie_str(cookie.expose_secret(), &base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let client = reqwest::Client::builder()
            .cookie_provider(jar)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCartApiInner {
                client,
                base_url,
                currency,
            }),
        })
    }

    /// Storefront origin the client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and decode a JSON reply.
    async fn fetch_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.inspect_err(|e| {
            tracing::error!(error = %e, "Cart request failed");
        })?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            // Storefronts report refusals like unknown products as JSON errors
            if let Ok(MutationEnvelope {
                error: Some(error), ..
            }) = serde_json::from_str::<MutationEnvelope>(&body)
            {
                tracing::warn!(status = %status, error = %error, "Cart request refused");
                return Err(CartError::Rejected(error));
            }

            tracing::error!(
                status = %status,
                body = %preview(&body),
                "Cart endpoint returned non-success status"
            );
            return Err(CartError::Status {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&body),
                "Failed to parse cart response"
            );
            CartError::Parse(e)
        })
    }

    async fn mutate(&self, request: reqwest::RequestBuilder) -> Result<MutationOutcome> {
        let envelope: MutationEnvelope = self
            .fetch_json(request)
            .await
            .map_err(mutation_failure)?;
        let outcome = envelope.into_outcome().inspect_err(|e| {
            tracing::warn!(error = %e, "Cart mutation rejected");
        })?;
        debug!(item_count = ?outcome.item_count, "Cart mutation accepted");
        Ok(outcome)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add(&self, product_id: ProductId, quantity: u32) -> Result<MutationOutcome> {
        let url = self.endpoint("cart/add")?;
        let body = AddRequest {
            product_id,
            quantity,
        };
        self.mutate(self.inner.client.post(url).json(&body)).await
    }

    #[instrument(skip(self), fields(line_key = %line_key))]
    async fn update(&self, line_key: &LineKey, quantity: u32) -> Result<MutationOutcome> {
        let url = self.endpoint("cart/update")?;
        let body = UpdateRequest {
            line_key: line_key.clone(),
            quantity,
        };
        self.mutate(self.inner.client.post(url).json(&body)).await
    }

    #[instrument(skip(self), fields(line_key = %line_key))]
    async fn remove(&self, line_key: &LineKey) -> Result<MutationOutcome> {
        let url = self.endpoint(&format!(
            "cart/remove/{}",
            urlencoding::encode(line_key.as_str())
        ))?;
        self.mutate(self.inner.client.post(url)).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<MutationOutcome> {
        let url = self.endpoint("cart/clear")?;
        self.mutate(self.inner.client.post(url)).await
    }

    #[instrument(skip(self))]
    async fn snapshot(&self) -> Result<CartSnapshot> {
        let url = self.endpoint("cart/mini")?;
        let response: MiniCartResponse = self.fetch_json(self.inner.client.get(url)).await?;
        let snapshot = response.into_snapshot(self.inner.currency).inspect_err(|e| {
            tracing::warn!(error = %e, "Unusable cart snapshot");
        })?;
        debug!(
            item_count = snapshot.item_count(),
            lines = snapshot.items().len(),
            "Fetched cart snapshot"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> Result<u32> {
        let url = self.endpoint("cart/count")?;
        let response: CountResponse = self.fetch_json(self.inner.client.get(url)).await?;
        Ok(response.count)
    }
}

/// A bare 404 on a mutation means the item is gone; say so to the shopper.
fn mutation_failure(err: CartError) -> CartError {
    match err {
        CartError::Status { status: 404, .. } => CartError::Rejected(GONE_MESSAGE.to_string()),
        other => other,
    }
}

/// First characters of a body, for logs.
fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
