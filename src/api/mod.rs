//! Remote Service API
//!
//! The product, cart, invoice, auth and analytics endpoints of the checkout
//! service behind one mockable trait.

use std::fmt::Debug;

use async_trait::async_trait;
use mockall::automock;

use crate::{
    invoices::{InvoiceId, InvoiceSummary, InvoiceUpdate},
    products::Product,
};

mod client;
mod errors;
pub mod models;

pub use client::{ClientConfig, HttpApiClient};
pub use errors::ApiError;
pub use models::*;

/// Remote checkout service.
#[automock]
#[async_trait]
pub trait CheckoutApi: Debug + Send + Sync {
    /// Resolve a scanned product code.
    async fn get_product(&self, code: &str) -> Result<Product, ApiError>;

    /// Submit cart lines and receive a server-side cart identifier.
    async fn attach_cart(&self, request: AttachRequest) -> Result<ServerCartId, ApiError>;

    /// Create the invoice for an attached cart.
    async fn checkout(&self, cart_id: ServerCartId) -> Result<InvoiceUpdate, ApiError>;

    /// Fetch an invoice by id.
    async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceUpdate, ApiError>;

    /// Mark an invoice paid. Officials only.
    async fn pay_invoice(&self, id: InvoiceId) -> Result<InvoiceUpdate, ApiError>;

    /// Look up an invoice by its scannable code. Officials only.
    async fn invoice_by_code(&self, code: &str) -> Result<InvoiceUpdate, ApiError>;

    /// Invoice rendered as a PDF document.
    async fn invoice_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, ApiError>;

    /// Invoice QR code as a PNG image.
    async fn invoice_qr(&self, id: InvoiceId) -> Result<Vec<u8>, ApiError>;

    /// Exchange credentials for a bearer token.
    async fn login(&self, kind: LoginKind, request: LoginRequest)
    -> Result<TokenResponse, ApiError>;

    /// Register a customer account.
    async fn signup_customer(&self, request: SignupRequest) -> Result<CustomerProfile, ApiError>;

    /// Identity behind the current token.
    async fn whoami(&self) -> Result<Identity, ApiError>;

    /// The logged-in customer's invoices.
    async fn my_invoices(&self) -> Result<Vec<InvoiceSummary>, ApiError>;

    /// Store-wide sales figures. Officials only.
    async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError>;
}
