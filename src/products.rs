//! Products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product as resolved from a scanned or typed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store product code (the barcode payload).
    pub code: String,

    /// Display name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Price of a single unit
    #[serde(rename = "price_per_unit")]
    pub unit_price: Decimal,

    /// Net weight of a single unit in kilograms
    #[serde(rename = "weight_per_unit")]
    pub unit_weight: Decimal,
}

impl Product {
    /// Whether price and weight are both non-negative.
    pub fn has_valid_measures(&self) -> bool {
        !self.unit_price.is_sign_negative() && !self.unit_weight.is_sign_negative()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn deserializes_service_product_payload() -> TestResult {
        let product: Product = serde_json::from_str(
            r#"{
                "id": 3,
                "name": "Basmati Rice 1kg",
                "description": null,
                "code": "P1001",
                "price_per_unit": 125.5,
                "weight_per_unit": 1.0,
                "available_qty": 40
            }"#,
        )?;

        assert_eq!(product.code, "P1001");
        assert_eq!(product.unit_price, Decimal::new(1255, 1));
        assert_eq!(product.unit_weight, Decimal::ONE);
        assert!(product.description.is_none());
        assert!(product.has_valid_measures());

        Ok(())
    }

    #[test]
    fn negative_price_is_not_valid() {
        let product = Product {
            code: "P1".to_string(),
            name: "Broken".to_string(),
            description: None,
            unit_price: Decimal::NEGATIVE_ONE,
            unit_weight: Decimal::new(5, 1),
        };

        assert!(!product.has_valid_measures());
    }
}
