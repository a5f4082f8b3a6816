//! JSON shapes exchanged with the storefront.
//!
//! Every endpoint uses these types. Legacy servers that answer mutations
//! with `cart_count` instead of `count` are read through a serde alias; no
//! other variation is accepted.

use cruzy_core::{CartLine, CartSnapshot, CurrencyCode, LineKey, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MutationOutcome;
use crate::error::CartError;

/// Message used when the server refuses a mutation without saying why.
const GENERIC_REJECTION: &str = "The cart could not be updated.";

/// Body of `POST /cart/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /cart/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub line_key: LineKey,
    pub quantity: u32,
}

/// Reply to every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, alias = "cart_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl MutationEnvelope {
    /// A successful acknowledgement.
    #[must_use]
    pub fn ok(message: impl Into<String>, count: u32) -> Self {
        Self {
            success: Some(true),
            error: None,
            message: Some(message.into()),
            count: Some(count),
        }
    }

    /// A refusal carrying a shopper-facing message.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(error.into()),
            message: None,
            count: None,
        }
    }

    /// Interpret the envelope.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Rejected` when the envelope carries an `error` or
    /// `success: false`.
    pub fn into_outcome(self) -> Result<MutationOutcome, CartError> {
        if let Some(error) = self.error {
            return Err(CartError::Rejected(error));
        }

        if self.success == Some(false) {
            return Err(CartError::Rejected(
                self.message.unwrap_or_else(|| GENERIC_REJECTION.to_string()),
            ));
        }

        Ok(MutationOutcome {
            message: self.message,
            item_count: self.count,
        })
    }
}

/// One line of `GET /cart/mini`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniCartLine {
    pub line_key: String,
    pub product_id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_subtotal: Decimal,
}

/// Reply to `GET /cart/mini`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniCartResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub items: Vec<MiniCartLine>,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

const fn default_success() -> bool {
    true
}

impl MiniCartResponse {
    /// Wire form of a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        Self {
            success: true,
            error: None,
            items: snapshot
                .items()
                .iter()
                .map(|line| MiniCartLine {
                    line_key: line.line_key.to_string(),
                    product_id: line.product_id,
                    name: line.name.clone(),
                    image: line.image_ref.clone(),
                    unit_price: line.unit_price.amount,
                    quantity: line.quantity,
                    line_subtotal: line.line_subtotal.amount,
                })
                .collect(),
            total: snapshot.total().amount,
            count: snapshot.item_count(),
            currency: Some(snapshot.currency()),
        }
    }

    /// Validate the reply and turn it into a snapshot.
    ///
    /// `fallback` is the currency assumed when the reply names none.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Rejected` for a failed reply, or the broken
    /// invariant when the data is inconsistent.
    pub fn into_snapshot(self, fallback: CurrencyCode) -> Result<CartSnapshot, CartError> {
        if !self.success || self.error.is_some() {
            return Err(CartError::Rejected(
                self.error.unwrap_or_else(|| GENERIC_REJECTION.to_string()),
            ));
        }

        let currency = self.currency.unwrap_or(fallback);
        let items = self
            .items
            .into_iter()
            .map(|line| {
                Ok(CartLine {
                    line_key: LineKey::parse(&line.line_key)?,
                    product_id: line.product_id,
                    name: line.name,
                    image_ref: line.image,
                    unit_price: Price::new(line.unit_price, currency),
                    quantity: line.quantity,
                    line_subtotal: Price::new(line.line_subtotal, currency),
                })
            })
            .collect::<Result<Vec<_>, CartError>>()?;

        Ok(CartSnapshot::try_new(
            self.count,
            items,
            Price::new(self.total, currency),
        )?)
    }
}

/// Reply to `GET /cart/count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    #[serde(alias = "cart_count")]
    pub count: u32,
}
