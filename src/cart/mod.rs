//! Cart
//!
//! The customer's unconfirmed selections. Lines are keyed by product code and
//! kept in first-scanned order; a line never holds a zero quantity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::Product;

pub mod store;

pub use store::{CART_KEY, CartStore};

/// Errors raised when building a cart from untrusted lines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The same product code appears on more than one line.
    #[error("duplicate cart line for product {0}")]
    DuplicateCode(String),

    /// A line was stored with a zero quantity.
    #[error("cart line for product {0} has zero quantity")]
    ZeroQuantity(String),

    /// A line carries a negative unit price or weight.
    #[error("cart line for product {0} has a negative price or weight")]
    NegativeMeasure(String),
}

/// One product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product code, unique within a cart.
    pub code: String,

    /// Product name as first seen.
    pub name: String,

    /// Unit price as first seen; repeat scans do not refresh it.
    #[serde(rename = "price_per_unit")]
    pub unit_price: Decimal,

    /// Unit net weight in kilograms.
    #[serde(rename = "weight_per_unit")]
    pub unit_weight: Decimal,

    /// Number of units, always at least one.
    pub quantity: u32,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            unit_weight: product.unit_weight,
            quantity: 1,
        }
    }

    /// Price of all units on this line.
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Net weight of all units on this line.
    pub fn net_weight(&self) -> Decimal {
        self.unit_weight * Decimal::from(self.quantity)
    }
}

/// Aggregate figures for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of line subtotals
    pub total: Decimal,

    /// Sum of line net weights in kilograms
    pub total_weight: Decimal,

    /// Total number of units
    pub units: u64,
}

/// Ordered collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from previously stored lines, checking cart invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] when a code repeats, a quantity is zero, or a
    /// price or weight is negative.
    pub fn from_lines(lines: Vec<CartLine>) -> Result<Self, CartError> {
        for (idx, line) in lines.iter().enumerate() {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity(line.code.clone()));
            }

            if line.unit_price.is_sign_negative() || line.unit_weight.is_sign_negative() {
                return Err(CartError::NegativeMeasure(line.code.clone()));
            }

            if lines.iter().take(idx).any(|seen| seen.code == line.code) {
                return Err(CartError::DuplicateCode(line.code.clone()));
            }
        }

        Ok(Self { lines })
    }

    /// Add one unit of `product`.
    ///
    /// A product already in the cart has its quantity bumped in place and keeps
    /// the name and price it was first added with. A new product is appended.
    /// Returns the resulting quantity for the product.
    pub fn add_item(&mut self, product: &Product) -> u32 {
        if let Some(line) = self.line_mut(&product.code) {
            line.quantity = line.quantity.saturating_add(1);

            return line.quantity;
        }

        self.lines.push(CartLine::from_product(product));

        1
    }

    /// Replace the quantity of the line for `code`.
    ///
    /// Negative quantities are clamped to zero and a zero quantity removes the
    /// line. Returns `false` (and leaves the cart alone) when no line has `code`.
    pub fn set_quantity(&mut self, code: &str, quantity: i64) -> bool {
        let Some(position) = self.lines.iter().position(|line| line.code == code) else {
            return false;
        };

        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);

        if quantity == 0 {
            self.lines.remove(position);
        } else if let Some(line) = self.lines.get_mut(position) {
            line.quantity = quantity;
        }

        true
    }

    /// Remove the line for `code`, if any.
    pub fn remove_item(&mut self, code: &str) -> bool {
        self.set_quantity(code, 0)
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Look up the line for `code`.
    pub fn line(&self, code: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.code == code)
    }

    fn line_mut(&mut self, code: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.code == code)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Iterate over lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum price, weight and units across all lines.
    pub fn totals(&self) -> CartTotals {
        self.lines
            .iter()
            .fold(CartTotals::default(), |acc, line| CartTotals {
                total: acc.total + line.subtotal(),
                total_weight: acc.total_weight + line.net_weight(),
                units: acc.units + u64::from(line.quantity),
            })
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Vec::<CartLine>::deserialize(deserializer)?;

        Self::from_lines(lines).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use testresult::TestResult;

    use super::*;

    fn product(code: &str, price: i64) -> Product {
        Product {
            code: code.to_string(),
            name: format!("Product {code}"),
            description: None,
            unit_price: Decimal::new(price, 2),
            unit_weight: Decimal::new(250, 3),
        }
    }

    #[test]
    fn adding_new_product_appends_line_with_quantity_one() {
        let mut cart = Cart::new();

        assert_eq!(cart.add_item(&product("P1001", 12_50)), 1);
        assert_eq!(cart.add_item(&product("P1002", 3_00)), 1);

        let codes: Vec<_> = cart.iter().map(|line| line.code.as_str()).collect();

        assert_eq!(codes, ["P1001", "P1002"]);
    }

    #[test]
    fn adding_existing_product_increments_quantity() {
        let mut cart = Cart::new();

        cart.add_item(&product("P1001", 12_50));

        assert_eq!(cart.add_item(&product("P1001", 12_50)), 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line("P1001").map(|line| line.quantity), Some(2));
    }

    #[test]
    fn repeat_scan_keeps_first_seen_price_and_position() {
        let mut cart = Cart::new();

        cart.add_item(&product("P1001", 12_50));
        cart.add_item(&product("P1002", 3_00));
        cart.add_item(&product("P1001", 99_99));

        assert_eq!(
            cart.lines().first().map(|line| (line.code.as_str(), line.unit_price)),
            Some(("P1001", Decimal::new(12_50, 2)))
        );
    }

    #[test]
    fn set_quantity_replaces_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&product("P1001", 12_50));

        assert!(cart.set_quantity("P1001", 5));
        assert_eq!(cart.line("P1001").map(|line| line.quantity), Some(5));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn set_quantity_zero_or_negative_removes_line() {
        let mut cart = Cart::new();
        cart.add_item(&product("P1001", 12_50));
        cart.add_item(&product("P1002", 3_00));

        assert!(cart.set_quantity("P1001", 0));
        assert!(cart.set_quantity("P1002", -4));
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_unknown_code_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(&product("P1001", 12_50));
        let before = cart.clone();

        assert!(!cart.set_quantity("NOPE", 3));
        assert_eq!(cart, before);
    }

    #[test]
    fn totals_sum_price_and_weight() {
        let mut cart = Cart::new();
        cart.add_item(&product("P1001", 12_50));
        cart.add_item(&product("P1001", 12_50));
        cart.add_item(&product("P1002", 3_00));

        let totals = cart.totals();

        assert_eq!(totals.total, Decimal::new(28_00, 2));
        assert_eq!(totals.total_weight, Decimal::new(750, 3));
        assert_eq!(totals.units, 3);
    }

    #[test]
    fn deserializing_rejects_duplicate_codes() {
        let json = r#"[
            {"code":"P1","name":"A","price_per_unit":"1","weight_per_unit":"0","quantity":1},
            {"code":"P1","name":"A","price_per_unit":"1","weight_per_unit":"0","quantity":2}
        ]"#;

        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn from_lines_rejects_zero_quantity() {
        let result = Cart::from_lines(vec![CartLine {
            code: "P1".to_string(),
            name: "A".to_string(),
            unit_price: Decimal::ONE,
            unit_weight: Decimal::ZERO,
            quantity: 0,
        }]);

        assert_eq!(result, Err(CartError::ZeroQuantity("P1".to_string())));
    }

    #[test]
    fn serializes_as_plain_line_array() -> TestResult {
        let mut cart = Cart::new();
        cart.add_item(&product("P1001", 12_50));

        let value = serde_json::to_value(&cart)?;

        assert!(value.is_array());
        assert_eq!(value.pointer("/0/code").and_then(|v| v.as_str()), Some("P1001"));
        assert_eq!(value.pointer("/0/quantity").and_then(serde_json::Value::as_u64), Some(1));

        Ok(())
    }

    proptest! {
        #[test]
        fn add_item_counts_every_addition(codes in prop::collection::vec(0u8..6, 0..40)) {
            let mut cart = Cart::new();

            for code in &codes {
                cart.add_item(&product(&format!("P{code}"), 1_00));
            }

            for line in cart.iter() {
                let added = codes
                    .iter()
                    .filter(|code| format!("P{code}") == line.code)
                    .count();

                prop_assert_eq!(u32::try_from(added).unwrap_or(u32::MAX), line.quantity);
                prop_assert_eq!(cart.iter().filter(|other| other.code == line.code).count(), 1);
            }

            let mut distinct = codes.clone();
            distinct.sort_unstable();
            distinct.dedup();

            prop_assert_eq!(cart.len(), distinct.len());
        }
    }
}
