//! Checkout
//!
//! Turns the local cart into a server-tracked invoice in two phases: attach
//! the cart lines, then check out the attached cart. The local cart is left
//! alone; it is only cleared once the invoice is paid.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    api::{ApiError, AttachRequest, CheckoutApi},
    cart::CartStore,
    invoices::{IncompleteInvoice, Invoice, InvoiceId, InvoiceSummary},
    session::{Role, SessionContext},
};

/// Errors raised by customer checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No customer credential is held; log in first.
    #[error("authentication required: log in as a customer")]
    AuthRequired,

    /// There is nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// The service refused the cart lines.
    #[error("{0}")]
    Attach(#[source] ApiError),

    /// The service refused to create the invoice.
    #[error("{0}")]
    Checkout(#[source] ApiError),

    /// Reading invoices or invoice documents failed.
    #[error("{0}")]
    Invoices(#[source] ApiError),

    /// The created invoice could not be understood.
    #[error(transparent)]
    Invoice(#[from] IncompleteInvoice),
}

impl CheckoutError {
    /// Whether the caller should prompt for a login.
    #[must_use]
    pub fn is_auth_required(&self) -> bool {
        match self {
            Self::AuthRequired => true,
            Self::Attach(error) | Self::Checkout(error) | Self::Invoices(error) => {
                matches!(error, ApiError::Unauthorized { .. })
            }
            Self::EmptyCart | Self::Invoice(_) => false,
        }
    }
}

/// Customer-side invoice operations.
#[derive(Debug, Clone)]
pub struct CheckoutOrchestrator {
    api: Arc<dyn CheckoutApi>,
    session: Arc<dyn SessionContext>,
    carts: CartStore,
}

impl CheckoutOrchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        api: Arc<dyn CheckoutApi>,
        session: Arc<dyn SessionContext>,
        carts: CartStore,
    ) -> Self {
        Self {
            api,
            session,
            carts,
        }
    }

    fn require_customer(&self) -> Result<(), CheckoutError> {
        match self.session.get() {
            Some(credential) if credential.role == Role::Customer => Ok(()),
            _ => Err(CheckoutError::AuthRequired),
        }
    }

    /// Attach the stored cart and create its invoice.
    ///
    /// Every call attaches afresh; server cart ids are never reused.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AuthRequired`]: no customer credential, nothing sent.
    /// - [`CheckoutError::EmptyCart`]: nothing to check out, nothing sent.
    /// - [`CheckoutError::Attach`] / [`CheckoutError::Checkout`]: the service
    ///   rejected a phase; its reason is carried unchanged.
    pub async fn checkout(&self) -> Result<Invoice, CheckoutError> {
        self.require_customer()?;

        let cart = self.carts.load();

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let cart_id = self
            .api
            .attach_cart(AttachRequest::from(&cart))
            .await
            .map_err(CheckoutError::Attach)?;

        debug!(%cart_id, lines = cart.len(), "cart attached");

        let update = self
            .api
            .checkout(cart_id)
            .await
            .map_err(CheckoutError::Checkout)?;

        let invoice = Invoice::from_update(update)?;

        info!(
            invoice_id = %invoice.id,
            code = %invoice.code,
            total = %invoice.total,
            "invoice created"
        );

        Ok(invoice)
    }

    /// The customer's past invoices.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AuthRequired`] without a customer credential,
    /// or [`CheckoutError::Invoices`] if the service call fails.
    pub async fn history(&self) -> Result<Vec<InvoiceSummary>, CheckoutError> {
        self.require_customer()?;

        self.api.my_invoices().await.map_err(CheckoutError::Invoices)
    }

    /// PDF rendering of an invoice.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AuthRequired`] without a customer credential,
    /// or [`CheckoutError::Invoices`] if the service call fails.
    pub async fn invoice_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, CheckoutError> {
        self.require_customer()?;

        self.api.invoice_pdf(id).await.map_err(CheckoutError::Invoices)
    }

    /// PNG QR code of an invoice.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AuthRequired`] without a customer credential,
    /// or [`CheckoutError::Invoices`] if the service call fails.
    pub async fn invoice_qr(&self, id: InvoiceId) -> Result<Vec<u8>, CheckoutError> {
        self.require_customer()?;

        self.api.invoice_qr(id).await.map_err(CheckoutError::Invoices)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        api::{MockCheckoutApi, ServerCartId},
        invoices::{InvoiceStatus, InvoiceUpdate},
        products::Product,
        session::{Credential, MemorySession},
        storage::MemoryStorage,
    };

    fn stocked_store() -> TestResult<CartStore> {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));

        store.update(|cart| {
            cart.add_item(&Product {
                code: "P1001".to_string(),
                name: "Basmati Rice 1kg".to_string(),
                description: None,
                unit_price: Decimal::new(120, 0),
                unit_weight: Decimal::ONE,
            })
        })?;

        Ok(store)
    }

    fn customer() -> Arc<MemorySession> {
        Arc::new(MemorySession::with_credential(Credential::new(
            "tok",
            Role::Customer,
        )))
    }

    #[tokio::test]
    async fn checkout_without_credential_makes_no_calls() -> TestResult {
        let mut api = MockCheckoutApi::new();

        api.expect_attach_cart().never();
        api.expect_checkout().never();

        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(api),
            Arc::new(MemorySession::new()),
            stocked_store()?,
        );

        let result = orchestrator.checkout().await;

        assert!(
            matches!(result, Err(CheckoutError::AuthRequired)),
            "expected AuthRequired, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn official_credential_cannot_check_out() -> TestResult {
        let mut api = MockCheckoutApi::new();

        api.expect_attach_cart().never();

        let session = Arc::new(MemorySession::with_credential(Credential::new(
            "tok",
            Role::Cashier,
        )));

        let orchestrator = CheckoutOrchestrator::new(Arc::new(api), session, stocked_store()?);

        assert!(orchestrator.checkout().await.is_err_and(|e| e.is_auth_required()));

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_locally() {
        let mut api = MockCheckoutApi::new();

        api.expect_attach_cart().never();

        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(api),
            customer(),
            CartStore::new(Arc::new(MemoryStorage::new())),
        );

        let result = orchestrator.checkout().await;

        assert!(
            matches!(result, Err(CheckoutError::EmptyCart)),
            "expected EmptyCart, got {result:?}"
        );
    }

    #[tokio::test]
    async fn checkout_attaches_then_creates_pending_invoice() -> TestResult {
        let store = stocked_store()?;
        let mut api = MockCheckoutApi::new();

        api.expect_attach_cart()
            .once()
            .withf(|request| {
                request.items.len() == 1
                    && request.items.first().is_some_and(|item| item.code == "P1001")
            })
            .return_once(|_| Ok(ServerCartId::new(7)));

        api.expect_checkout()
            .once()
            .withf(|cart_id| *cart_id == ServerCartId::new(7))
            .return_once(|_| {
                Ok(InvoiceUpdate {
                    id: Some(InvoiceId::new(31)),
                    code: Some("INV-31".to_string()),
                    total: Some(Decimal::new(120, 0)),
                    ..InvoiceUpdate::default()
                })
            });

        let orchestrator = CheckoutOrchestrator::new(Arc::new(api), customer(), store.clone());

        let invoice = orchestrator.checkout().await?;

        assert_eq!(invoice.id, InvoiceId::new(31));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(store.load().len(), 1, "cart must survive checkout");

        Ok(())
    }

    #[tokio::test]
    async fn checkout_rejection_is_carried_verbatim() -> TestResult {
        let store = stocked_store()?;
        let mut api = MockCheckoutApi::new();

        api.expect_attach_cart()
            .once()
            .return_once(|_| Ok(ServerCartId::new(7)));

        api.expect_checkout().once().return_once(|_| {
            Err(ApiError::NotFound {
                detail: "Cart not found or not active".to_string(),
            })
        });

        let orchestrator = CheckoutOrchestrator::new(Arc::new(api), customer(), store.clone());

        let error = orchestrator
            .checkout()
            .await
            .err()
            .ok_or("checkout should fail")?;

        assert_eq!(error.to_string(), "Cart not found or not active");
        assert!(matches!(
            &error,
            CheckoutError::Checkout(api) if api.status() == Some(StatusCode::NOT_FOUND)
        ));
        assert_eq!(store.load().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn history_requires_customer() {
        let mut api = MockCheckoutApi::new();

        api.expect_my_invoices().never();

        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(api),
            Arc::new(MemorySession::new()),
            CartStore::new(Arc::new(MemoryStorage::new())),
        );

        assert!(matches!(
            orchestrator.history().await,
            Err(CheckoutError::AuthRequired)
        ));
    }
}
