//! Cart snapshot and line types.
//!
//! A [`CartSnapshot`] is the full, server-derived state of a cart at one
//! instant. It is never mutated on the client: every mutation is followed by
//! fetching a new snapshot, and the old one is dropped after rendering.
//!
//! # Invariants
//!
//! - every line has `quantity >= 1` and a non-negative unit price
//! - `line_subtotal == unit_price * quantity`
//! - `total == sum(line_subtotal)`
//! - `item_count == sum(quantity)`
//! - line keys are unique within a snapshot
//! - all prices share the snapshot currency

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyCode, LineKey, Price, ProductId};

/// Ways a snapshot can break its invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A line has a quantity of zero.
    #[error("line {0} has zero quantity")]
    ZeroQuantity(LineKey),

    /// A line has a negative unit price.
    #[error("line {0} has a negative unit price")]
    NegativePrice(LineKey),

    /// A line is priced in a different currency than the snapshot.
    #[error("line {line_key} is priced in {found}, cart is in {expected}")]
    CurrencyMismatch {
        line_key: LineKey,
        expected: CurrencyCode,
        found: CurrencyCode,
    },

    /// A line subtotal is not unit price times quantity.
    #[error("line {line_key} subtotal is {actual}, expected {expected}")]
    SubtotalMismatch {
        line_key: LineKey,
        expected: Decimal,
        actual: Decimal,
    },

    /// Two lines share a key.
    #[error("duplicate line key: {0}")]
    DuplicateLineKey(LineKey),

    /// The total is not the sum of line subtotals.
    #[error("cart total is {actual}, expected {expected}")]
    TotalMismatch { expected: Decimal, actual: Decimal },

    /// The item count is not the sum of quantities.
    #[error("cart item count is {actual}, expected {expected}")]
    CountMismatch { expected: u64, actual: u32 },

    /// An amount at this line is too large to represent.
    #[error("amount overflows at line {0}")]
    Overflow(LineKey),
}

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identity (distinct per product variant).
    pub line_key: LineKey,
    /// Product this line is for.
    pub product_id: ProductId,
    /// Product display name.
    pub name: String,
    /// Image file name or URL.
    pub image_ref: Option<String>,
    /// Price per unit.
    pub unit_price: Price,
    /// Units of the product, at least one.
    pub quantity: u32,
    /// `unit_price * quantity`.
    pub line_subtotal: Price,
}

impl CartLine {
    /// Build a line with its subtotal derived from price and quantity.
    #[must_use]
    pub fn new(
        line_key: LineKey,
        product_id: ProductId,
        name: impl Into<String>,
        image_ref: Option<String>,
        unit_price: Price,
        quantity: u32,
    ) -> Self {
        Self {
            line_key,
            product_id,
            name: name.into(),
            image_ref,
            unit_price,
            quantity,
            line_subtotal: unit_price.times(quantity),
        }
    }

    fn check(&self, currency: CurrencyCode) -> Result<(), SnapshotError> {
        if self.quantity == 0 {
            return Err(SnapshotError::ZeroQuantity(self.line_key.clone()));
        }

        if self.unit_price.is_negative() {
            return Err(SnapshotError::NegativePrice(self.line_key.clone()));
        }

        for price in [self.unit_price, self.line_subtotal] {
            if price.currency_code != currency {
                return Err(SnapshotError::CurrencyMismatch {
                    line_key: self.line_key.clone(),
                    expected: currency,
                    found: price.currency_code,
                });
            }
        }

        let expected = self
            .unit_price
            .checked_times(self.quantity)
            .ok_or_else(|| SnapshotError::Overflow(self.line_key.clone()))?;
        // Servers that compute in floats send amounts like 13.049999999999999
        if self.line_subtotal.rounded() != expected.rounded() {
            return Err(SnapshotError::SubtotalMismatch {
                line_key: self.line_key.clone(),
                expected: expected.amount,
                actual: self.line_subtotal.amount,
            });
        }

        Ok(())
    }
}

/// Full cart state as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    item_count: u32,
    items: Vec<CartLine>,
    total: Price,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub const fn empty(currency: CurrencyCode) -> Self {
        Self {
            item_count: 0,
            items: Vec::new(),
            total: Price::zero(currency),
        }
    }

    /// Build a snapshot whose count and total are derived from its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if any line is invalid or two lines share a key.
    pub fn from_lines(items: Vec<CartLine>, currency: CurrencyCode) -> Result<Self, SnapshotError> {
        let total = Price::new(sum_subtotals(&items)?, currency);
        let quantity: u64 = items.iter().map(|l| u64::from(l.quantity)).sum();
        let item_count = u32::try_from(quantity).map_err(|_| SnapshotError::CountMismatch {
            expected: quantity,
            actual: u32::MAX,
        })?;
        Self::try_new(item_count, items, total)
    }

    /// Build a snapshot from server-reported parts, checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn try_new(item_count: u32, items: Vec<CartLine>, total: Price) -> Result<Self, SnapshotError> {
        let snapshot = Self {
            item_count,
            items,
            total,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check every invariant of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let currency = self.total.currency_code;
        let mut seen = HashSet::with_capacity(self.items.len());

        for line in &self.items {
            line.check(currency)?;
            if !seen.insert(&line.line_key) {
                return Err(SnapshotError::DuplicateLineKey(line.line_key.clone()));
            }
        }

        let expected_total = Price::new(sum_subtotals(&self.items)?, currency);
        if self.total.rounded() != expected_total.rounded() {
            return Err(SnapshotError::TotalMismatch {
                expected: expected_total.amount,
                actual: self.total.amount,
            });
        }

        let expected_count: u64 = self.items.iter().map(|l| u64::from(l.quantity)).sum();
        if u64::from(self.item_count) != expected_count {
            return Err(SnapshotError::CountMismatch {
                expected: expected_count,
                actual: self.item_count,
            });
        }

        Ok(())
    }

    /// Total units across all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Lines in server order.
    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// Sum of line subtotals.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Currency every price in the snapshot uses.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.total.currency_code
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by key.
    #[must_use]
    pub fn line(&self, line_key: &LineKey) -> Option<&CartLine> {
        self.items.iter().find(|l| &l.line_key == line_key)
    }
}

/// Sum of line subtotals, failing at the line where the sum overflows.
fn sum_subtotals(items: &[CartLine]) -> Result<Decimal, SnapshotError> {
    items.iter().try_fold(Decimal::ZERO, |sum, line| {
        sum.checked_add(line.line_subtotal.amount)
            .ok_or_else(|| SnapshotError::Overflow(line.line_key.clone()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(key: &str, product: i32, cents: i64, quantity: u32) -> CartLine {
        CartLine::new(
            LineKey::parse(key).unwrap(),
            ProductId::new(product),
            format!("Product {product}"),
            None,
            Price::from_cents(cents, CurrencyCode::USD),
            quantity,
        )
    }

    #[test]
    fn test_from_lines_derives_aggregates() {
        let snapshot = CartSnapshot::from_lines(
            vec![line("1", 1, 1_250, 2), line("2", 2, 899, 1)],
            CurrencyCode::USD,
        )
        .unwrap();

        assert_eq!(snapshot.item_count(), 3);
        assert_eq!(snapshot.total().amount, Decimal::new(3_399, 2));
        assert_eq!(snapshot.items().len(), 2);
    }

    #[test]
    fn test_total_is_sum_of_price_times_quantity() {
        let snapshot = CartSnapshot::from_lines(
            vec![line("a", 1, 333, 3), line("b", 2, 1, 7), line("c", 3, 0, 4)],
            CurrencyCode::USD,
        )
        .unwrap();

        let expected: Decimal = snapshot
            .items()
            .iter()
            .map(|l| l.unit_price.amount * Decimal::from(l.quantity))
            .sum();
        assert_eq!(snapshot.total().amount, expected);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::empty(CurrencyCode::EUR);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.item_count(), 0);
        assert_eq!(snapshot.total().display(), "€0.00");
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let result = CartSnapshot::from_lines(vec![line("1", 1, 100, 0)], CurrencyCode::USD);
        assert!(matches!(result, Err(SnapshotError::ZeroQuantity(_))));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let result = CartSnapshot::from_lines(
            vec![line("1", 1, 100, 1), line("1", 2, 200, 1)],
            CurrencyCode::USD,
        );
        assert!(matches!(result, Err(SnapshotError::DuplicateLineKey(_))));
    }

    #[test]
    fn test_same_product_on_distinct_lines() {
        let snapshot = CartSnapshot::from_lines(
            vec![line("7:whole", 7, 1_500, 1), line("7:ground", 7, 1_500, 2)],
            CurrencyCode::USD,
        )
        .unwrap();
        assert_eq!(snapshot.item_count(), 3);
    }

    #[test]
    fn test_rejects_bad_subtotal() {
        let mut bad = line("1", 1, 500, 2);
        bad.line_subtotal = Price::from_cents(900, CurrencyCode::USD);
        let result = CartSnapshot::from_lines(vec![bad], CurrencyCode::USD);
        assert!(matches!(result, Err(SnapshotError::SubtotalMismatch { .. })));
    }

    #[test]
    fn test_rejects_bad_total() {
        let result = CartSnapshot::try_new(
            1,
            vec![line("1", 1, 500, 1)],
            Price::from_cents(400, CurrencyCode::USD),
        );
        assert!(matches!(result, Err(SnapshotError::TotalMismatch { .. })));
    }

    #[test]
    fn test_rejects_bad_count() {
        let result = CartSnapshot::try_new(
            5,
            vec![line("1", 1, 500, 2)],
            Price::from_cents(1_000, CurrencyCode::USD),
        );
        assert!(matches!(
            result,
            Err(SnapshotError::CountMismatch {
                expected: 2,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_rejects_currency_mismatch() {
        let result = CartSnapshot::from_lines(vec![line("1", 1, 500, 1)], CurrencyCode::GBP);
        assert!(matches!(result, Err(SnapshotError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_trailing_zeros_compare_equal() {
        let mut l = line("1", 1, 1_250, 2);
        l.line_subtotal = Price::new(Decimal::new(25, 0), CurrencyCode::USD);
        let snapshot = CartSnapshot::try_new(
            2,
            vec![l],
            Price::new(Decimal::new(2_500_000, 5), CurrencyCode::USD),
        );
        assert!(snapshot.is_ok());
    }

    #[test]
    fn test_overflowing_subtotal_is_an_error() {
        let unit = Price::new(Decimal::MAX, CurrencyCode::USD);
        let mut huge = line("1", 1, 0, 2);
        huge.unit_price = unit;
        huge.line_subtotal = unit;
        let result = CartSnapshot::try_new(2, vec![huge], unit);
        assert!(matches!(result, Err(SnapshotError::Overflow(ref key)) if key.as_str() == "1"));
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let max = Price::new(Decimal::MAX, CurrencyCode::USD);
        let mut a = line("a", 1, 0, 1);
        a.unit_price = max;
        a.line_subtotal = max;
        let mut b = a.clone();
        b.line_key = LineKey::parse("b").unwrap();

        let result = CartSnapshot::from_lines(vec![a, b], CurrencyCode::USD);
        assert!(matches!(result, Err(SnapshotError::Overflow(ref key)) if key.as_str() == "b"));
    }

    #[test]
    fn test_float_noise_within_a_cent_is_accepted() {
        let mut l = line("1", 1, 435, 3);
        l.line_subtotal = Price::new("13.049999999999999".parse().unwrap(), CurrencyCode::USD);
        let snapshot = CartSnapshot::try_new(
            3,
            vec![l],
            Price::new("13.049999999999999".parse().unwrap(), CurrencyCode::USD),
        );
        assert!(snapshot.is_ok());
    }

    #[test]
    fn test_cent_difference_is_still_rejected() {
        let mut l = line("1", 1, 435, 3);
        l.line_subtotal = Price::from_cents(1_304, CurrencyCode::USD);
        let result = CartSnapshot::from_lines(vec![l], CurrencyCode::USD);
        assert!(matches!(result, Err(SnapshotError::SubtotalMismatch { .. })));
    }

    #[test]
    fn test_line_lookup() {
        let snapshot =
            CartSnapshot::from_lines(vec![line("9", 9, 100, 1)], CurrencyCode::USD).unwrap();
        assert!(snapshot.line(&LineKey::parse("9").unwrap()).is_some());
        assert!(snapshot.line(&LineKey::parse("8").unwrap()).is_none());
    }
}
