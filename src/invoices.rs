//! Invoices
//!
//! Client-side projection of the server-owned invoice. Different endpoints
//! spell the same fields differently (`invoice_id` vs `id`, `qr_code` vs
//! `code`, `total_net_weight` vs `total_weight`); both spellings are accepted.

use base64::{DecodeError, Engine as _, engine::general_purpose::STANDARD as BASE64};
use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::ids::TypedId;

/// Invoice Id
pub type InvoiceId = TypedId<Invoice>;

/// Payment state of an invoice. `Paid` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Awaiting payment at the counter.
    #[default]
    Pending,

    /// Paid; no further transitions.
    Paid,
}

impl InvoiceStatus {
    /// Whether no further transition is defined.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid)
    }

    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

/// One product line captured on the invoice at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Product name
    #[serde(default = "unnamed_item")]
    pub product_name: String,

    /// Units bought
    pub quantity: u32,

    /// Line price
    pub subtotal: Decimal,

    /// Line net weight in kilograms
    #[serde(default)]
    pub net_weight: Decimal,
}

fn unnamed_item() -> String {
    "Item".to_string()
}

/// Invoice fields as returned by any invoice endpoint; every field is optional.
///
/// Merging an update into an [`Invoice`] overwrites exactly the fields present
/// in the update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvoiceUpdate {
    /// Server id
    #[serde(default, alias = "invoice_id")]
    pub id: Option<InvoiceId>,

    /// Scannable invoice code
    #[serde(default, alias = "qr_code")]
    pub code: Option<String>,

    /// Payment status
    #[serde(default)]
    pub status: Option<InvoiceStatus>,

    /// Amount due
    #[serde(default)]
    pub total: Option<Decimal>,

    /// Total net weight in kilograms
    #[serde(default, alias = "total_net_weight")]
    pub total_weight: Option<Decimal>,

    /// Base64 PNG of the invoice QR code
    #[serde(default, rename = "qr_base64")]
    pub qr_image: Option<String>,

    /// Line items
    #[serde(default)]
    pub items: Option<Vec<InvoiceLine>>,

    /// Customer display name (official lookups only)
    #[serde(default)]
    pub customer_name: Option<String>,

    /// Invoice creation time as reported by the service
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date: Option<DateTime>,
}

/// Raised when a response lacks the fields that identify an invoice.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invoice response is missing its {0}")]
pub struct IncompleteInvoice(pub &'static str);

/// Client-side invoice projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    /// Server id, immutable
    pub id: InvoiceId,

    /// Scannable invoice code, immutable
    pub code: String,

    /// Payment status
    pub status: InvoiceStatus,

    /// Amount due
    pub total: Decimal,

    /// Total net weight in kilograms
    pub total_weight: Decimal,

    /// Base64 PNG of the invoice QR code, when the service sent one
    pub qr_image: Option<String>,

    /// Line items snapshot
    pub items: Vec<InvoiceLine>,

    /// Customer display name
    pub customer_name: Option<String>,

    /// Creation time
    pub date: Option<DateTime>,
}

impl Invoice {
    /// Build a projection from a full response.
    ///
    /// A missing status means the invoice was just created and is pending.
    ///
    /// # Errors
    ///
    /// Returns [`IncompleteInvoice`] when the id or code is absent.
    pub fn from_update(update: InvoiceUpdate) -> Result<Self, IncompleteInvoice> {
        let id = update.id.ok_or(IncompleteInvoice("id"))?;
        let code = update.code.ok_or(IncompleteInvoice("code"))?;
        let items = update.items.unwrap_or_default();

        let total_weight = update
            .total_weight
            .unwrap_or_else(|| items.iter().map(|item| item.net_weight).sum());

        Ok(Self {
            id,
            code,
            status: update.status.unwrap_or_default(),
            total: update.total.unwrap_or_default(),
            total_weight,
            qr_image: update.qr_image,
            items,
            customer_name: update.customer_name,
            date: update.date,
        })
    }

    /// Overlay the fields present in `update`. Id and code never change.
    pub fn merge(&mut self, update: InvoiceUpdate) {
        let InvoiceUpdate {
            status,
            total,
            total_weight,
            qr_image,
            items,
            customer_name,
            date,
            ..
        } = update;

        if let Some(status) = status {
            self.status = status;
        }

        if let Some(total) = total {
            self.total = total;
        }

        if let Some(total_weight) = total_weight {
            self.total_weight = total_weight;
        }

        if qr_image.is_some() {
            self.qr_image = qr_image;
        }

        if let Some(items) = items {
            self.items = items;
        }

        if customer_name.is_some() {
            self.customer_name = customer_name;
        }

        if date.is_some() {
            self.date = date;
        }
    }

    /// Whether the invoice has been paid.
    pub fn is_paid(&self) -> bool {
        self.status.is_terminal()
    }

    /// Decoded PNG bytes of the QR image, if one was sent.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is not valid base64.
    pub fn qr_png(&self) -> Result<Option<Vec<u8>>, DecodeError> {
        self.qr_image
            .as_deref()
            .map(|encoded| BASE64.decode(encoded))
            .transpose()
    }
}

/// Row of the customer's invoice history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceSummary {
    /// Server id
    pub id: InvoiceId,

    /// Scannable invoice code
    pub code: String,

    /// Amount
    pub total: Decimal,

    /// Payment status
    pub status: InvoiceStatus,

    /// Creation time
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date: Option<DateTime>,
}

/// Service timestamps are naive UTC date-times; accept RFC 3339 instants too
/// and drop anything unparseable rather than failing the whole response.
fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;

    Ok(raw.as_deref().and_then(parse_service_datetime))
}

fn parse_service_datetime(raw: &str) -> Option<DateTime> {
    raw.parse::<DateTime>().ok().or_else(|| {
        raw.parse::<Timestamp>()
            .ok()
            .map(|ts| ts.to_zoned(TimeZone::UTC).datetime())
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn pending_invoice() -> TestResult<Invoice> {
        let update: InvoiceUpdate = serde_json::from_str(
            r#"{
                "invoice_id": 17,
                "qr_code": "INV-0A1B2C3D4E5F",
                "qr_base64": "iVBORw0KGgo=",
                "total": 240.0,
                "total_net_weight": 2.0
            }"#,
        )?;

        Ok(Invoice::from_update(update)?)
    }

    #[test]
    fn checkout_response_becomes_pending_invoice() -> TestResult {
        let invoice = pending_invoice()?;

        assert_eq!(invoice.id, InvoiceId::new(17));
        assert_eq!(invoice.code, "INV-0A1B2C3D4E5F");
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.total, Decimal::new(240, 0));
        assert_eq!(invoice.total_weight, Decimal::new(2, 0));
        assert!(!invoice.is_paid());

        Ok(())
    }

    #[test]
    fn missing_id_is_incomplete() -> TestResult {
        let update: InvoiceUpdate = serde_json::from_str(r#"{"code": "INV-1"}"#)?;

        assert_eq!(
            Invoice::from_update(update),
            Err(IncompleteInvoice("id"))
        );

        Ok(())
    }

    #[test]
    fn merge_prefers_returned_fields_and_keeps_the_rest() -> TestResult {
        let mut invoice = pending_invoice()?;

        invoice.merge(serde_json::from_str(
            r#"{"id": 17, "code": "INV-0A1B2C3D4E5F", "status": "paid", "total": 250,
                "date": "2025-03-01T09:30:00.123456", "total_weight": null}"#,
        )?);

        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.total, Decimal::new(250, 0));
        assert_eq!(invoice.total_weight, Decimal::new(2, 0));
        assert_eq!(invoice.qr_image.as_deref(), Some("iVBORw0KGgo="));
        assert!(invoice.date.is_some());
        assert!(invoice.is_paid());

        Ok(())
    }

    #[test]
    fn merge_never_changes_identity() -> TestResult {
        let mut invoice = pending_invoice()?;

        invoice.merge(InvoiceUpdate {
            id: Some(InvoiceId::new(99)),
            code: Some("INV-OTHER".to_string()),
            ..InvoiceUpdate::default()
        });

        assert_eq!(invoice.id, InvoiceId::new(17));
        assert_eq!(invoice.code, "INV-0A1B2C3D4E5F");

        Ok(())
    }

    #[test]
    fn detail_lookup_carries_items_and_customer() -> TestResult {
        let update: InvoiceUpdate = serde_json::from_str(
            r#"{
                "id": 5, "code": "INV-5", "customer_id": 2, "cart_id": 9,
                "total": 300.0, "date": "2025-03-01T09:30:00", "status": "pending",
                "total_weight": 2.0, "customer_name": "Asha",
                "items": [
                    {"id": 1, "product_id": 3, "product_name": "Toor Dal 1kg",
                     "quantity": 2, "subtotal": 300.0, "net_weight": 2.0}
                ]
            }"#,
        )?;

        let invoice = Invoice::from_update(update)?;

        assert_eq!(invoice.customer_name.as_deref(), Some("Asha"));
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(
            invoice.items.first().map(|item| item.product_name.as_str()),
            Some("Toor Dal 1kg")
        );

        Ok(())
    }

    #[test]
    fn unparseable_date_is_dropped() -> TestResult {
        let update: InvoiceUpdate =
            serde_json::from_str(r#"{"id": 1, "code": "INV-1", "date": "yesterday"}"#)?;

        assert!(update.date.is_none());

        Ok(())
    }

    #[test]
    fn rfc3339_dates_are_accepted() {
        assert!(parse_service_datetime("2025-03-01T09:30:00Z").is_some());
        assert!(parse_service_datetime("2025-03-01T09:30:00").is_some());
    }

    #[test]
    fn qr_png_decodes_payload() -> TestResult {
        let invoice = pending_invoice()?;

        let png = invoice.qr_png()?.ok_or("missing qr")?;

        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        Ok(())
    }
}
