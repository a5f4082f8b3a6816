//! Cruzy Cart - mini-cart synchronisation for the Cruzy Coffee storefront.
//!
//! The mini cart is a view of server state: every mutation goes to the
//! storefront and is followed by a fresh snapshot, which is rendered into the
//! item-count badge and the mini-cart panel.
//!
//! # Modules
//!
//! - [`api`] - `CartApi` trait and its HTTP implementation
//! - [`sync`] - `CartSync`, the view-model bound to a page
//! - [`page`] - Display regions
//! - [`view`] - Panel rendering
//! - [`notify`] - Shopper-facing notices
//! - [`offline`] - Network-first offline cache and service-worker hooks
//! - [`config`] / [`error`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod offline;
pub mod page;
pub mod sync;
pub mod view;

pub use api::{CartApi, HttpCartApi, MutationOutcome};
pub use config::CartConfig;
pub use error::{CartError, FailureKind};
pub use sync::CartSync;
