//! Core types for Cruzy carts.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod line_key;
pub mod price;

pub use cart::{CartLine, CartSnapshot, SnapshotError};
pub use id::*;
pub use line_key::{LineKey, LineKeyError};
pub use price::{CurrencyCode, Price, UnknownCurrency};
