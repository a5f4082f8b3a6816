//! Mini-cart view-model.
//!
//! [`CartSync`] keeps the item-count badge and the mini-cart panel in step
//! with the server after every mutation. The server owns the cart: each
//! mutation is followed by a fresh snapshot, which replaces whatever is on
//! display and is then dropped.
//!
//! Concurrent refreshes are not coordinated. Whichever response resolves
//! last is displayed; a render writes both regions under one lock so the
//! display always shows a single snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use cruzy_core::{CartSnapshot, LineKey, ProductId};
use tracing::{error, info, instrument, warn};

use crate::api::{CartApi, MutationOutcome};
use crate::config::RegionIds;
use crate::error::{CartError, FailureKind, Result};
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::page::{Page, Region};
use crate::view;

/// Mini cart bound to a page.
///
/// Region handles are looked up once in [`CartSync::attach`] and released by
/// [`CartSync::detach`].
pub struct CartSync<A, R, N = LogNotifier> {
    api: A,
    badge: Option<R>,
    panel: Option<R>,
    notifier: N,
    visible: AtomicBool,
    render_lock: Mutex<()>,
}

impl<A, R, N> CartSync<A, R, N>
where
    A: CartApi,
    R: Region,
    N: Notifier,
{
    /// Bind to the badge and panel regions of `page`.
    ///
    /// A missing region is logged and announced once; rendering then skips
    /// it. The panel starts hidden.
    pub fn attach<P>(api: A, page: &P, notifier: N, ids: &RegionIds) -> Self
    where
        P: Page<Region = R>,
    {
        let badge = page.region(&ids.badge);
        let panel = page.region(&ids.panel);

        let missing: Vec<&str> = [(&badge, &ids.badge), (&panel, &ids.panel)]
            .into_iter()
            .filter(|(region, _)| region.is_none())
            .map(|(_, id)| id.as_str())
            .collect();

        if !missing.is_empty() {
            let err = CartError::MissingRegion(missing.join(", "));
            warn!(error = %err, "Mini cart attached without all regions");
            notifier.notify(Notice::warning(err.user_message()));
        }

        if let Some(panel) = &panel {
            panel.set_visible(false);
        }

        Self {
            api,
            badge,
            panel,
            notifier,
            visible: AtomicBool::new(false),
            render_lock: Mutex::new(()),
        }
    }

    /// Release the region handles and hand back the API.
    pub fn detach(self) -> A {
        self.api
    }

    /// The API this mini cart talks to.
    pub const fn api(&self) -> &A {
        &self.api
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add units of a product, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the failure after notifying the shopper; the display is left
    /// unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartSnapshot> {
        if quantity == 0 {
            return Err(self.fail(CartError::InvalidQuantity(quantity)));
        }
        let outcome = self.api.add(product_id, quantity).await;
        self.after_mutation(outcome).await
    }

    /// Set a line's quantity (zero removes it), then refresh.
    ///
    /// # Errors
    ///
    /// Returns the failure after notifying the shopper; the display is left
    /// unchanged.
    #[instrument(skip(self), fields(line_key = %line_key))]
    pub async fn update(&self, line_key: &LineKey, quantity: u32) -> Result<CartSnapshot> {
        let outcome = self.api.update(line_key, quantity).await;
        self.after_mutation(outcome).await
    }

    /// Remove a line, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the failure after notifying the shopper; the display is left
    /// unchanged.
    #[instrument(skip(self), fields(line_key = %line_key))]
    pub async fn remove(&self, line_key: &LineKey) -> Result<CartSnapshot> {
        let outcome = self.api.remove(line_key).await;
        self.after_mutation(outcome).await
    }

    /// Empty the cart, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the failure after notifying the shopper; the display is left
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartSnapshot> {
        let outcome = self.api.clear().await;
        self.after_mutation(outcome).await
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Fetch the current cart and display it.
    ///
    /// # Errors
    ///
    /// Returns the failure after notifying the shopper; the display is left
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CartSnapshot> {
        let snapshot = match self.api.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.fail(e)),
        };

        if let Err(e) = self.render(&snapshot) {
            return Err(self.fail(e));
        }

        info!(item_count = snapshot.item_count(), "Mini cart refreshed");
        Ok(snapshot)
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Show the panel.
    pub fn show(&self) {
        self.set_visible(true);
    }

    /// Hide the panel.
    pub fn hide(&self) {
        self.set_visible(false);
    }

    /// Flip panel visibility; returns the new state.
    pub fn toggle(&self) -> bool {
        let visible = !self.visible.fetch_xor(true, Ordering::AcqRel);
        self.push_visibility(visible);
        visible
    }

    /// Whether the panel is shown.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
        self.push_visibility(visible);
    }

    fn push_visibility(&self, visible: bool) {
        if let Some(panel) = &self.panel {
            panel.set_visible(visible);
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn after_mutation(&self, outcome: Result<MutationOutcome>) -> Result<CartSnapshot> {
        let outcome = outcome.map_err(|e| self.fail(e))?;
        let snapshot = self.refresh().await?;

        if let Some(reported) = outcome.item_count
            && reported != snapshot.item_count()
        {
            // Another tab may have changed the cart in between
            warn!(
                reported,
                fetched = snapshot.item_count(),
                "Mutation count differs from fetched snapshot"
            );
        }

        Ok(snapshot)
    }

    /// Replace both regions with one snapshot.
    fn render(&self, snapshot: &CartSnapshot) -> Result<()> {
        // Render before locking so the critical section is only the writes
        let html = view::render_panel(snapshot)?;
        let badge = view::badge_text(snapshot);

        let _guard = self
            .render_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(region) = &self.badge {
            region.set_text(&badge);
        }
        if let Some(region) = &self.panel {
            region.set_html(&html);
        }
        Ok(())
    }

    /// Log and announce a failure, then hand it back.
    fn fail(&self, err: CartError) -> CartError {
        match err.kind() {
            FailureKind::Application => warn!(error = %err, "Cart operation rejected"),
            _ => error!(error = %err, "Cart operation failed"),
        }
        self.notifier.notify(Notice::error(err.user_message()));
        err
    }
}
