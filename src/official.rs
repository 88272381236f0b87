//! Counter operations for store officials.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    api::{AnalyticsSummary, ApiError, CheckoutApi},
    invoices::{IncompleteInvoice, Invoice, InvoiceId},
    session::SessionContext,
};

/// Errors raised at the payment counter.
#[derive(Debug, Error)]
pub enum CounterError {
    /// No cashier or admin credential is held.
    #[error("authentication required: log in as a store official")]
    OfficialRequired,

    /// No invoice code was scanned or typed.
    #[error("enter an invoice code")]
    EmptyCode,

    /// The service refused the request; its reason is carried unchanged.
    #[error("{0}")]
    Rejected(#[source] ApiError),

    /// The returned invoice could not be understood.
    #[error(transparent)]
    Invoice(#[from] IncompleteInvoice),
}

/// Bill lookup, payment and analytics for cashiers and admins.
#[derive(Debug, Clone)]
pub struct CounterDesk {
    api: Arc<dyn CheckoutApi>,
    session: Arc<dyn SessionContext>,
}

impl CounterDesk {
    /// Create a desk using the official credential held by `session`.
    pub fn new(api: Arc<dyn CheckoutApi>, session: Arc<dyn SessionContext>) -> Self {
        Self { api, session }
    }

    fn require_official(&self) -> Result<(), CounterError> {
        match self.session.get() {
            Some(credential) if credential.role.is_official() => Ok(()),
            _ => Err(CounterError::OfficialRequired),
        }
    }

    /// Look up the bill for a scanned invoice code.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::OfficialRequired`] without an official
    /// credential, [`CounterError::EmptyCode`] for blank input, or
    /// [`CounterError::Rejected`] when the service refuses (e.g. unknown code).
    pub async fn fetch_bill(&self, code: &str) -> Result<Invoice, CounterError> {
        self.require_official()?;

        let code = code.trim();

        if code.is_empty() {
            return Err(CounterError::EmptyCode);
        }

        let update = self
            .api
            .invoice_by_code(code)
            .await
            .map_err(CounterError::Rejected)?;

        Ok(Invoice::from_update(update)?)
    }

    /// Record payment of an invoice.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::OfficialRequired`] without an official
    /// credential or [`CounterError::Rejected`] when the service refuses,
    /// including for an invoice that is already paid.
    pub async fn mark_paid(&self, id: InvoiceId) -> Result<Invoice, CounterError> {
        self.require_official()?;

        let update = self
            .api
            .pay_invoice(id)
            .await
            .map_err(CounterError::Rejected)?;

        let invoice = Invoice::from_update(update)?;

        info!(invoice_id = %invoice.id, code = %invoice.code, "invoice marked paid");

        Ok(invoice)
    }

    /// Store-wide sales figures.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::OfficialRequired`] without an official
    /// credential or [`CounterError::Rejected`] when the service refuses.
    pub async fn dashboard(&self) -> Result<AnalyticsSummary, CounterError> {
        self.require_official()?;

        self.api
            .analytics_summary()
            .await
            .map_err(CounterError::Rejected)
    }
}
