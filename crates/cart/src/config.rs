//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_BASE_URL` - Storefront origin serving the `/cart/*` endpoints
//!
//! ## Optional
//! - `CART_CURRENCY` - ISO 4217 code for snapshots that omit one (default: USD)
//! - `CART_SESSION_COOKIE` - Existing storefront session cookie (`name=value`)
//! - `CART_BADGE_ID` - Id of the item-count badge region (default: mini-cart-count)
//! - `CART_PANEL_ID` - Id of the mini-cart panel region (default: mini-cart-content)
//! - `OFFLINE_CACHE_NAME` - Versioned offline cache name (default: cruzy-coffee-v1)
//! - `OFFLINE_CACHE_CAPACITY` - Maximum cached responses (default: 1000)
//! - `OFFLINE_PRECACHE_URLS` - Comma-separated URLs to precache on install
//! - `SENTRY_DSN` - Sentry error tracking DSN

use cruzy_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default offline cache version.
pub const DEFAULT_CACHE_NAME: &str = "cruzy-coffee-v1";

/// Pages and assets stored on install when `OFFLINE_PRECACHE_URLS` is unset.
///
/// Relative entries resolve against `CART_BASE_URL`.
pub const DEFAULT_PRECACHE_URLS: &[&str] = &[
    "/",
    "/static/css/styles.css",
    "/static/js/cart.js",
    "/static/img/coffee_logo.png",
    "/machines",
    "/beans",
    "/accessories",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js",
    "https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.1/font/bootstrap-icons.css",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Storefront origin
    pub base_url: Url,
    /// Currency assumed when the server omits one
    pub currency: CurrencyCode,
    /// Storefront session cookie to resume an existing cart
    pub session_cookie: Option<SecretString>,
    /// Display region ids
    pub regions: RegionIds,
    /// Offline cache configuration
    pub offline: OfflineConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Ids of the display regions the mini cart writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionIds {
    /// Item-count badge
    pub badge: String,
    /// Mini-cart panel body
    pub panel: String,
}

impl Default for RegionIds {
    fn default() -> Self {
        Self {
            badge: "mini-cart-count".to_string(),
            panel: "mini-cart-content".to_string(),
        }
    }
}

/// Offline cache configuration.
#[derive(Debug, Clone)]
pub struct OfflineConfig {
    /// Current cache version; other versions are deleted on activate
    pub cache_name: String,
    /// Maximum cached responses per cache
    pub capacity: u64,
    /// URLs stored on install
    pub precache_urls: Vec<Url>,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_url("CART_BASE_URL", &get_required_env("CART_BASE_URL")?)?;
        let currency = get_env_or_default("CART_CURRENCY", "USD")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_CURRENCY".to_string(), e.to_string()))?;
        let session_cookie = get_optional_env("CART_SESSION_COOKIE").map(SecretString::from);

        let regions = RegionIds {
            badge: get_env_or_default("CART_BADGE_ID", "mini-cart-count"),
            panel: get_env_or_default("CART_PANEL_ID", "mini-cart-content"),
        };

        let offline = OfflineConfig::from_env(&base_url)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            base_url,
            currency,
            session_cookie,
            regions,
            offline,
            sentry_dsn,
        })
    }
}

impl OfflineConfig {
    fn from_env(base_url: &Url) -> Result<Self, ConfigError> {
        let capacity = get_env_or_default("OFFLINE_CACHE_CAPACITY", "1000")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("OFFLINE_CACHE_CAPACITY".to_string(), e.to_string())
            })?;

        let precache_urls = match get_optional_env("OFFLINE_PRECACHE_URLS") {
            Some(list) => resolve_urls(base_url, list.split(','))?,
            None => resolve_urls(base_url, DEFAULT_PRECACHE_URLS.iter().copied())?,
        };

        Ok(Self {
            cache_name: get_env_or_default("OFFLINE_CACHE_NAME", DEFAULT_CACHE_NAME),
            capacity,
            precache_urls,
        })
    }

    /// Defaults for a storefront at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a default entry fails to resolve.
    pub fn defaults(base_url: &Url) -> Result<Self, ConfigError> {
        Ok(Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            capacity: 1000,
            precache_urls: resolve_urls(base_url, DEFAULT_PRECACHE_URLS.iter().copied())?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an absolute http(s) URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// Resolve each entry against the storefront origin, skipping blanks.
fn resolve_urls<'a>(
    base_url: &Url,
    entries: impl Iterator<Item = &'a str>,
) -> Result<Vec<Url>, ConfigError> {
    entries
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            base_url.join(entry).map_err(|e| {
                ConfigError::InvalidEnvVar("OFFLINE_PRECACHE_URLS".to_string(), format!("{entry}: {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.cruzycoffee.com/").unwrap()
    }

    #[test]
    fn test_parse_url_accepts_http() {
        assert!(parse_url("TEST_VAR", "http://localhost:5000").is_ok());
        assert!(parse_url("TEST_VAR", " https://shop.cruzycoffee.com ").is_ok());
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        let err = parse_url("TEST_VAR", "ftp://shop.cruzycoffee.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(parse_url("TEST_VAR", "not a url").is_err());
    }

    #[test]
    fn test_resolve_urls_relative_and_absolute() {
        let urls = resolve_urls(
            &base(),
            ["/beans", " ", "https://cdn.example.net/app.css"].into_iter(),
        )
        .unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://shop.cruzycoffee.com/beans");
        assert_eq!(urls[1].host_str(), Some("cdn.example.net"));
    }

    #[test]
    fn test_offline_defaults() {
        let offline = OfflineConfig::defaults(&base()).unwrap();
        assert_eq!(offline.cache_name, "cruzy-coffee-v1");
        assert_eq!(offline.precache_urls.len(), DEFAULT_PRECACHE_URLS.len());
        assert!(
            offline
                .precache_urls
                .iter()
                .any(|u| u.as_str() == "https://shop.cruzycoffee.com/static/js/cart.js")
        );
    }

    #[test]
    fn test_region_id_defaults() {
        let ids = RegionIds::default();
        assert_eq!(ids.badge, "mini-cart-count");
        assert_eq!(ids.panel, "mini-cart-content");
    }

    #[test]
    fn test_debug_redacts_session_cookie() {
        let config = CartConfig {
            base_url: base(),
            currency: CurrencyCode::USD,
            session_cookie: Some(SecretString::from("session=super_secret_cookie")),
            regions: RegionIds::default(),
            offline: OfflineConfig::defaults(&base()).unwrap(),
            sentry_dsn: None,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("shop.cruzycoffee.com"));
        assert!(!debug_output.contains("super_secret_cookie"));
    }
}
