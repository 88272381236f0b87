//! Request and response bodies of the remote service.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{cart::Cart, ids::TypedId, session::Role};

/// Marker for carts attached on the server.
#[derive(Debug)]
pub enum AttachedCart {}

/// Server-side cart identifier returned by attach.
pub type ServerCartId = TypedId<AttachedCart>;

/// Marker for customer accounts.
#[derive(Debug)]
pub enum CustomerAccount {}

/// Customer identifier.
pub type CustomerId = TypedId<CustomerAccount>;

/// One `(code, quantity)` pair submitted on attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachItem {
    /// Product code
    pub code: String,

    /// Units requested
    pub quantity: u32,
}

/// Attach request body. Prices are deliberately absent: the service prices
/// the cart itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachRequest {
    /// Cart lines
    pub items: Vec<AttachItem>,
}

impl From<&Cart> for AttachRequest {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .iter()
                .map(|line| AttachItem {
                    code: line.code.clone(),
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttachResponse {
    pub(crate) cart_id: ServerCartId,
}

/// Which login endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    /// `/auth/customer/login`
    Customer,

    /// `/auth/official/login`, for cashiers and admins
    Official,
}

impl LoginKind {
    pub(crate) const fn segments(self) -> [&'static str; 3] {
        match self {
            Self::Customer => ["auth", "customer", "login"],
            Self::Official => ["auth", "official", "login"],
        }
    }
}

/// Login request body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,

    /// Account password
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: String,

    /// Role the token was issued for
    pub role: Role,
}

/// Customer signup body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    /// Display name
    pub name: String,

    /// Account email
    pub email: String,

    /// Optional phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Account password
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// Account created by signup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomerProfile {
    /// Customer id
    pub id: CustomerId,

    /// Display name
    pub name: String,

    /// Account email
    pub email: String,

    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
}

/// Identity behind the current token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// Role of the account
    pub role: Role,

    /// Display name
    pub name: String,

    /// Account email
    pub email: String,
}

/// Store-wide sales figures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyticsSummary {
    /// Revenue over all paid invoices
    pub total_revenue: Decimal,

    /// Number of paid invoices
    pub total_paid_invoices: u64,

    /// Revenue per day, oldest first
    #[serde(default)]
    pub daily_sales: Vec<DailySales>,

    /// Customers ranked by spend
    #[serde(default)]
    pub top_customers: Vec<TopCustomer>,
}

/// Revenue for one day.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailySales {
    /// Calendar day
    pub date: Date,

    /// Revenue
    pub total: Decimal,
}

/// One ranked customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopCustomer {
    /// Customer id
    pub customer_id: CustomerId,

    /// Display name
    pub name: String,

    /// Amount spent
    pub spent: Decimal,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::products::Product;

    #[test]
    fn attach_request_carries_codes_and_quantities_only() -> TestResult {
        let mut cart = Cart::new();
        let product = Product {
            code: "P1001".to_string(),
            name: "Basmati Rice 1kg".to_string(),
            description: None,
            unit_price: Decimal::new(120, 0),
            unit_weight: Decimal::ONE,
        };

        cart.add_item(&product);
        cart.add_item(&product);

        let body = serde_json::to_value(AttachRequest::from(&cart))?;

        assert_eq!(
            body,
            serde_json::json!({ "items": [{ "code": "P1001", "quantity": 2 }] })
        );

        Ok(())
    }

    #[test]
    fn analytics_summary_parses_service_payload() -> TestResult {
        let summary: AnalyticsSummary = serde_json::from_str(
            r#"{
                "total_revenue": 1250.5,
                "total_paid_invoices": 4,
                "daily_sales": [{"date": "2025-03-01", "total": 1000.5}],
                "top_customers": [{"customer_id": 2, "name": "Asha", "spent": 900}]
            }"#,
        )?;

        assert_eq!(summary.total_revenue, Decimal::new(12505, 1));
        assert_eq!(summary.daily_sales.len(), 1);
        assert_eq!(
            summary.top_customers.first().map(|c| c.customer_id),
            Some(CustomerId::new(2))
        );

        Ok(())
    }

    #[test]
    fn login_request_debug_hides_password() {
        let request = LoginRequest {
            email: "asha@example.com".to_string(),
            password: "hunter2".to_string(),
        };

        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
