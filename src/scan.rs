//! Scanning
//!
//! Barcode sources produce decoded code strings; a [`ScanSession`] resolves
//! each code against the product catalogue and adds it to the stored cart.

use std::{io, sync::Arc};

use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::{Mutex, mpsc},
};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiError, CheckoutApi},
    cart::{Cart, CartLine, CartStore},
    storage::StorageError,
};

/// Detail shown when the service does not explain a failed lookup.
pub const INVALID_PRODUCT: &str = "Invalid Product";

/// Errors raised by a barcode source.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// The device or input could not be opened.
    #[error("scanner unavailable: {0}")]
    Unavailable(String),

    /// Reading from the device failed.
    #[error("scanner I/O error")]
    Io(#[from] io::Error),
}

/// Source of decoded barcode strings.
///
/// Each call to `start` yields a fresh stream; dropping the receiver stops it.
pub trait BarcodeSource: Send {
    /// Begin producing codes.
    ///
    /// # Errors
    ///
    /// Returns a [`ScannerError`] if the source cannot be started.
    fn start(&mut self) -> Result<mpsc::UnboundedReceiver<String>, ScannerError>;
}

/// Newline-terminated codes from a reader: a keyboard-wedge scanner, a pipe or
/// typed input. Blank lines are skipped and codes are trimmed.
#[derive(Debug)]
pub struct LineScanner<R> {
    reader: Arc<Mutex<BufReader<R>>>,
}

impl<R: AsyncRead + Unpin + Send + 'static> LineScanner<R> {
    /// Read codes from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(Mutex::new(BufReader::new(reader))),
        }
    }
}

impl LineScanner<tokio::io::Stdin> {
    /// Read codes from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin + Send + 'static> BarcodeSource for LineScanner<R> {
    fn start(&mut self) -> Result<mpsc::UnboundedReceiver<String>, ScannerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = Arc::clone(&self.reader);

        tokio::spawn(async move {
            let mut reader = reader.lock().await;
            let mut line = String::new();

            loop {
                line.clear();

                let read = tokio::select! {
                    read = reader.read_line(&mut line) => read,
                    () = tx.closed() => break,
                };

                match read {
                    Ok(0) => break,
                    Ok(_) => {
                        let code = line.trim();

                        if !code.is_empty() && tx.send(code.to_string()).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "scanner read failed");

                        break;
                    }
                }
            }

            debug!("scanner stopped");
        });

        Ok(rx)
    }
}

/// Errors raised while adding a scanned code.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Nothing was scanned or typed.
    #[error("enter a product code")]
    EmptyCode,

    /// The code does not name a sellable product.
    #[error("{0}")]
    InvalidProduct(String),

    /// The lookup could not be completed.
    #[error("product lookup failed")]
    Lookup(#[source] ApiError),

    /// The updated cart could not be saved.
    #[error("failed to save cart")]
    Storage(#[from] StorageError),
}

impl ScanError {
    /// Whether this is a user input problem rather than a system failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyCode | Self::InvalidProduct(_))
    }
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned {
    /// The line the code was added to.
    pub line: CartLine,

    /// The whole cart after the addition.
    pub cart: Cart,
}

/// Resolves codes and adds them to the stored cart.
#[derive(Debug, Clone)]
pub struct ScanSession {
    api: Arc<dyn CheckoutApi>,
    carts: CartStore,
}

impl ScanSession {
    /// Create a session adding to `carts`.
    pub fn new(api: Arc<dyn CheckoutApi>, carts: CartStore) -> Self {
        Self { api, carts }
    }

    /// Resolve `code` and add one unit of it to the cart.
    ///
    /// The cart is only touched once the product has been resolved.
    ///
    /// # Errors
    ///
    /// - [`ScanError::EmptyCode`] for blank input.
    /// - [`ScanError::InvalidProduct`] when the service does not know the code.
    /// - [`ScanError::Lookup`] when the service cannot be reached.
    /// - [`ScanError::Storage`] when the cart cannot be saved.
    pub async fn add_code(&self, code: &str) -> Result<Scanned, ScanError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(ScanError::EmptyCode);
        }

        let product = match self.api.get_product(code).await {
            Ok(product) if product.has_valid_measures() => product,
            Ok(_) => return Err(ScanError::InvalidProduct(INVALID_PRODUCT.to_string())),
            Err(ApiError::NotFound { detail }) => {
                let detail = if detail.trim().is_empty() {
                    INVALID_PRODUCT.to_string()
                } else {
                    detail
                };

                return Err(ScanError::InvalidProduct(detail));
            }
            Err(error) => return Err(ScanError::Lookup(error)),
        };

        let (cart, quantity) = self.carts.update(|cart| cart.add_item(&product))?;

        info!(code = %product.code, quantity, "product added to cart");

        let line = cart
            .line(&product.code)
            .cloned()
            .ok_or_else(|| ScanError::InvalidProduct(INVALID_PRODUCT.to_string()))?;

        Ok(Scanned { line, cart })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{api::MockCheckoutApi, products::Product, storage::MemoryStorage};

    fn rice() -> Product {
        Product {
            code: "P1001".to_string(),
            name: "Basmati Rice 1kg".to_string(),
            description: None,
            unit_price: Decimal::new(120, 0),
            unit_weight: Decimal::ONE,
        }
    }

    fn session(api: MockCheckoutApi) -> (ScanSession, CartStore) {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));

        (ScanSession::new(Arc::new(api), store.clone()), store)
    }

    #[tokio::test]
    async fn repeat_scan_increments_quantity() -> TestResult {
        let mut api = MockCheckoutApi::new();

        api.expect_get_product()
            .times(2)
            .returning(|_| Ok(rice()));

        let (session, store) = session(api);

        session.add_code("P1001").await?;
        let scanned = session.add_code("  P1001\n").await?;

        assert_eq!(scanned.line.quantity, 2);
        assert_eq!(scanned.cart.len(), 1);
        assert_eq!(store.load(), scanned.cart);

        Ok(())
    }

    #[tokio::test]
    async fn blank_code_skips_lookup() {
        let mut api = MockCheckoutApi::new();

        api.expect_get_product().never();

        let (session, _) = session(api);

        assert!(matches!(
            session.add_code("   ").await,
            Err(ScanError::EmptyCode)
        ));
    }

    #[tokio::test]
    async fn unknown_code_is_validation_error_and_cart_untouched() -> TestResult {
        let mut api = MockCheckoutApi::new();

        api.expect_get_product().once().returning(|_| {
            Err(ApiError::NotFound {
                detail: "Invalid product - not available in this store".to_string(),
            })
        });

        let (session, store) = session(api);
        let error = session
            .add_code("NOPE")
            .await
            .err()
            .ok_or("lookup should fail")?;

        assert!(error.is_validation());
        assert_eq!(
            error.to_string(),
            "Invalid product - not available in this store"
        );
        assert!(store.load().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_is_not_validation() -> TestResult {
        let mut api = MockCheckoutApi::new();

        api.expect_get_product().once().returning(|_| {
            Err(ApiError::Rejected {
                status: reqwest::StatusCode::BAD_GATEWAY,
                detail: "Bad Gateway".to_string(),
            })
        });

        let (session, store) = session(api);
        let error = session
            .add_code("P1001")
            .await
            .err()
            .ok_or("lookup should fail")?;

        assert!(!error.is_validation());
        assert!(store.load().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn line_scanner_yields_trimmed_codes() -> TestResult {
        let mut scanner = LineScanner::new(&b"P1001\n\n  P1002 \r\nP1003"[..]);
        let mut codes = scanner.start()?;
        let mut seen = Vec::new();

        while let Some(code) = codes.recv().await {
            seen.push(code);
        }

        assert_eq!(seen, ["P1001", "P1002", "P1003"]);

        Ok(())
    }

    #[tokio::test]
    async fn line_scanner_can_restart() -> TestResult {
        let mut scanner = LineScanner::new(&b"P1001\nP1002\n"[..]);

        let mut first = scanner.start()?;
        assert_eq!(first.recv().await.as_deref(), Some("P1001"));
        drop(first);

        let mut second = scanner.start()?;
        let mut rest = Vec::new();

        while let Some(code) = second.recv().await {
            rest.push(code);
        }

        assert!(rest.len() <= 1, "codes must not be replayed: {rest:?}");

        Ok(())
    }
}
