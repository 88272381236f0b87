//! Self-checkout prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    api::{
        AnalyticsSummary, ApiError, CheckoutApi, ClientConfig, HttpApiClient, LoginKind,
        SignupRequest,
    },
    auth::{AuthError, Authenticator},
    cart::{Cart, CartLine, CartStore, CartTotals},
    checkout::{CheckoutError, CheckoutOrchestrator},
    invoices::{Invoice, InvoiceId, InvoiceStatus, InvoiceSummary, InvoiceUpdate},
    official::{CounterDesk, CounterError},
    poller::{DEFAULT_POLL_INTERVAL, InvoicePoller, PollHandle},
    pricing::{format_inr, format_weight},
    products::Product,
    receipt::ReceiptError,
    scan::{BarcodeSource, LineScanner, ScanError, ScanSession, ScannerError},
    session::{Credential, Role, SessionContext, StoredSession},
    storage::{FileStorage, LocalStorage, StorageError},
};
