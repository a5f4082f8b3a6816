//! Cruzy Core - Shared cart types.
//!
//! This crate provides the types shared by every Cruzy cart component:
//! - `cart` - Mini-cart synchronisation and offline cache library
//! - `cli` - Command-line driver for a running storefront
//!
//! # Architecture
//!
//! The core crate contains only types and invariants - no I/O, no HTTP
//! clients, no rendering. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, line keys, decimal prices, and cart snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
