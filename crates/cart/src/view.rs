//! Mini-cart panel rendering.
//!
//! Snapshots are converted into display-ready views (formatted prices,
//! resolved image URLs) and rendered with an Askama template.

use askama::Template;
use cruzy_core::{CartLine, CartSnapshot};

/// Directory product images are served from when the snapshot holds a bare
/// file name.
const IMAGE_DIR: &str = "/static/img/";

/// Cart item display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub line_key: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<ImageView>,
}

/// Image display data for templates.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    pub item_label: &'static str,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Resolve an image reference to a URL.
fn image_url(image_ref: &str) -> String {
    if image_ref.starts_with('/') || image_ref.contains("://") {
        image_ref.to_string()
    } else {
        format!("{IMAGE_DIR}{image_ref}")
    }
}

impl From<&CartSnapshot> for CartView {
    fn from(cart: &CartSnapshot) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.total().display(),
            item_count: cart.item_count(),
            item_label: if cart.item_count() == 1 { "item" } else { "items" },
        }
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            line_key: line.line_key.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.unit_price.display(),
            line_price: line.line_subtotal.display(),
            image: line
                .image_ref
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .map(|r| ImageView { url: image_url(r) }),
        }
    }
}

/// Mini-cart panel body.
#[derive(Template)]
#[template(path = "partials/mini_cart.html")]
pub struct MiniCartTemplate {
    pub cart: CartView,
}

/// Render the panel body for a snapshot.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_panel(snapshot: &CartSnapshot) -> askama::Result<String> {
    MiniCartTemplate {
        cart: CartView::from(snapshot),
    }
    .render()
}

/// Badge text for a snapshot.
#[must_use]
pub fn badge_text(snapshot: &CartSnapshot) -> String {
    snapshot.item_count().to_string()
}
