//! Integration tests for the Cruzy Coffee cart.
//!
//! [`FakeStorefront`] is an in-process `axum` server speaking the storefront
//! cart endpoints, so the HTTP client and the mini cart can be exercised end
//! to end without a real shop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cruzy-integration-tests
//! ```
//!
//! # Catalog
//!
//! | Id | Product | Price |
//! |----|---------|-------|
//! | 1 | Breville Bambino | 299.95 |
//! | 2 | House Blend 1kg | 32.00 |
//! | 3 | Tamper | 25.00 |

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cruzy_cart::api::wire::{
    AddRequest, CountResponse, MiniCartResponse, MutationEnvelope, UpdateRequest,
};
use cruzy_core::{CartLine, CartSnapshot, CurrencyCode, LineKey, Price, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

/// Name of the session cookie the fake storefront hands out.
pub const SESSION_COOKIE: &str = "cruzy_session";

/// Pages served outside `/cart`, for offline cache tests.
const PAGES: &[&str] = &["", "machines", "beans", "accessories"];

struct Product {
    name: &'static str,
    image: Option<&'static str>,
    price: Decimal,
}

/// Lines of one session's cart, in insertion order.
type Lines = Vec<(ProductId, u32)>;

struct StoreState {
    catalog: HashMap<ProductId, Product>,
    sessions: Mutex<HashMap<String, Lines>>,
    next_session: AtomicU64,
    failing: AtomicBool,
}

impl StoreState {
    fn new() -> Self {
        let catalog = [
            (1, "Breville Bambino", Some("bambino.webp"), Decimal::new(29_995, 2)),
            (2, "House Blend 1kg", None, Decimal::new(3_200, 2)),
            (3, "Tamper", Some("/static/img/tamper.png"), Decimal::new(2_500, 2)),
        ]
        .into_iter()
        .map(|(id, name, image, price)| (ProductId::new(id), Product { name, image, price }))
        .collect();

        Self {
            catalog,
            sessions: Mutex::default(),
            next_session: AtomicU64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Lines>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session named by the request cookie, or a new one.
    fn session(&self, headers: &HeaderMap) -> (String, Option<HeaderValue>) {
        let existing = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string());

        if let Some(id) = existing {
            return (id, None);
        }

        let id = self.next_session.fetch_add(1, Ordering::Relaxed).to_string();
        let cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={id}; Path=/")).ok();
        (id, cookie)
    }

    fn snapshot(&self, lines: &Lines) -> CartSnapshot {
        let lines = lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                let product = self.catalog.get(product_id)?;
                let line_key = LineKey::from(*product_id);
                Some(CartLine::new(
                    line_key,
                    *product_id,
                    product.name,
                    product.image.map(str::to_string),
                    Price::new(product.price, CurrencyCode::USD),
                    *quantity,
                ))
            })
            .collect();

        CartSnapshot::from_lines(lines, CurrencyCode::USD)
            .unwrap_or_else(|_| CartSnapshot::empty(CurrencyCode::USD))
    }
}

fn item_count(lines: &Lines) -> u32 {
    lines.iter().map(|(_, quantity)| quantity).sum()
}

/// JSON reply, setting the session cookie when one was just created.
fn reply<T: Serialize>(status: StatusCode, cookie: Option<HeaderValue>, body: &T) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

// =============================================================================
// Handlers
// =============================================================================

async fn add(
    State(state): State<Arc<StoreState>>,
    headers: HeaderMap,
    Json(body): Json<AddRequest>,
) -> Response {
    let (session, cookie) = state.session(&headers);

    if !state.catalog.contains_key(&body.product_id) {
        return reply(
            StatusCode::NOT_FOUND,
            cookie,
            &MutationEnvelope::rejected("Product not found"),
        );
    }
    if body.quantity == 0 {
        return reply(
            StatusCode::BAD_REQUEST,
            cookie,
            &MutationEnvelope::rejected("Quantity must be at least 1"),
        );
    }

    let mut sessions = state.sessions();
    let lines = sessions.entry(session).or_default();
    match lines.iter_mut().find(|(id, _)| *id == body.product_id) {
        Some((_, quantity)) => *quantity += body.quantity,
        None => lines.push((body.product_id, body.quantity)),
    }

    let envelope = MutationEnvelope::ok("Added to cart", item_count(lines));
    reply(StatusCode::OK, cookie, &envelope)
}

async fn update(
    State(state): State<Arc<StoreState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateRequest>,
) -> Response {
    let (session, cookie) = state.session(&headers);
    let mut sessions = state.sessions();
    let lines = sessions.entry(session).or_default();

    let Some(index) = lines
        .iter()
        .position(|(id, _)| LineKey::from(*id) == body.line_key)
    else {
        return reply(
            StatusCode::NOT_FOUND,
            cookie,
            &MutationEnvelope::rejected("Item not in cart"),
        );
    };

    if body.quantity == 0 {
        lines.remove(index);
    } else if let Some((_, quantity)) = lines.get_mut(index) {
        *quantity = body.quantity;
    }

    let envelope = MutationEnvelope::ok("Cart updated", item_count(lines));
    reply(StatusCode::OK, cookie, &envelope)
}

async fn remove(
    State(state): State<Arc<StoreState>>,
    headers: HeaderMap,
    Path(line_key): Path<String>,
) -> Response {
    let (session, cookie) = state.session(&headers);
    let mut sessions = state.sessions();
    let lines = sessions.entry(session).or_default();

    let before = lines.len();
    lines.retain(|(id, _)| LineKey::from(*id).as_str() != line_key);
    if lines.len() == before {
        return reply(
            StatusCode::NOT_FOUND,
            cookie,
            &MutationEnvelope::rejected("Item not in cart"),
        );
    }

    let envelope = MutationEnvelope::ok("Item removed", item_count(lines));
    reply(StatusCode::OK, cookie, &envelope)
}

async fn clear(State(state): State<Arc<StoreState>>, headers: HeaderMap) -> Response {
    let (session, cookie) = state.session(&headers);
    state.sessions().insert(session, Vec::new());
    reply(StatusCode::OK, cookie, &MutationEnvelope::ok("Cart cleared", 0))
}

async fn mini(State(state): State<Arc<StoreState>>, headers: HeaderMap) -> Response {
    if state.failing.load(Ordering::Acquire) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response();
    }

    let (session, cookie) = state.session(&headers);
    let lines = state.sessions().get(&session).cloned().unwrap_or_default();
    let snapshot = state.snapshot(&lines);
    reply(StatusCode::OK, cookie, &MiniCartResponse::from_snapshot(&snapshot))
}

async fn count(State(state): State<Arc<StoreState>>, headers: HeaderMap) -> Response {
    let (session, cookie) = state.session(&headers);
    let count = state.sessions().get(&session).map_or(0, item_count);
    reply(StatusCode::OK, cookie, &CountResponse { count })
}

async fn home() -> Html<String> {
    page_html("")
}

async fn page(Path(page): Path<String>) -> Response {
    if PAGES.contains(&page.as_str()) {
        page_html(&page).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn page_html(page: &str) -> Html<String> {
    Html(format!("<h1>Cruzy Coffee /{page}</h1>"))
}

fn router(state: Arc<StoreState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/{page}", get(page))
        .route("/cart/add", post(add))
        .route("/cart/update", post(update))
        .route("/cart/remove/{line_key}", post(remove))
        .route("/cart/clear", post(clear))
        .route("/cart/mini", get(mini))
        .route("/cart/count", get(count))
        .with_state(state)
}

// =============================================================================
// FakeStorefront
// =============================================================================

/// A running fake storefront on a random local port.
pub struct FakeStorefront {
    base_url: Url,
    state: Arc<StoreState>,
    server: JoinHandle<std::io::Result<()>>,
}

impl FakeStorefront {
    /// Start a server.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)?;

        let state = Arc::new(StoreState::new());
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make `GET /cart/mini` answer 500 until turned off again.
    pub fn fail_snapshots(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::Release);
    }

    /// Stop accepting connections.
    pub async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

/// A local URL nothing is listening on.
///
/// # Errors
///
/// Returns an error if no local port can be bound.
pub async fn closed_port_url() -> std::io::Result<Url> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)
}
