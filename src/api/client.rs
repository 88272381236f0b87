//! HTTP client for the remote checkout service.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url, header::AUTHORIZATION};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    api::{
        AnalyticsSummary, ApiError, AttachRequest, CheckoutApi, CustomerProfile, Identity,
        LoginKind, LoginRequest, ServerCartId, SignupRequest, TokenResponse,
        models::AttachResponse,
    },
    invoices::{InvoiceId, InvoiceSummary, InvoiceUpdate},
    products::Product,
    session::SessionContext,
};

/// Connection settings for [`HttpApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `"http://localhost:8000"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`CheckoutApi`] over HTTP and JSON.
///
/// The session credential, when present, is sent as a bearer token on every
/// request.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: Url,
    http: Client,
    session: Arc<dyn SessionContext>,
}

impl HttpApiClient {
    /// Create a client for the service at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] for an unusable base URL, or a
    /// transport error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionContext>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl(config.base_url.clone()))?;

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url,
            http,
            session,
        })
    }

    /// Service root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "sending request");

        let request = self.http.request(method, url);

        match self.session.get() {
            Some(credential) => request.header(
                AUTHORIZATION,
                format!("Bearer {}", credential.token.expose()),
            ),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        debug!(%status, url = %response.url(), "received response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        Err(ApiError::from_response(status, &body))
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder, url: &Url) -> Result<T, ApiError> {
        let bytes = Self::send(request).await?.bytes().await?;

        serde_json::from_slice(&bytes).map_err(|source| ApiError::Malformed {
            endpoint: url.path().to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments);

        Self::json(self.request(Method::GET, url.clone()), &url).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments);

        Self::json(self.request(Method::POST, url.clone()).json(body), &url).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments);

        Self::json(self.request(Method::POST, url.clone()), &url).await
    }

    async fn get_bytes(&self, segments: &[&str]) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(segments);
        let response = Self::send(self.request(Method::GET, url)).await?;

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl CheckoutApi for HttpApiClient {
    async fn get_product(&self, code: &str) -> Result<Product, ApiError> {
        self.get_json(&["products", code]).await
    }

    async fn attach_cart(&self, request: AttachRequest) -> Result<ServerCartId, ApiError> {
        let response: AttachResponse = self
            .post_json(&["carts", "attach"], &request)
            .await?;

        Ok(response.cart_id)
    }

    async fn checkout(&self, cart_id: ServerCartId) -> Result<InvoiceUpdate, ApiError> {
        let cart_id = cart_id.to_string();

        self.post_empty(&["carts", &cart_id, "checkout"]).await
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceUpdate, ApiError> {
        self.get_json(&["invoices", &id.to_string()]).await
    }

    async fn pay_invoice(&self, id: InvoiceId) -> Result<InvoiceUpdate, ApiError> {
        let id = id.to_string();

        self.post_empty(&["invoices", &id, "pay"]).await
    }

    async fn invoice_by_code(&self, code: &str) -> Result<InvoiceUpdate, ApiError> {
        self.get_json(&["invoices", "by-code", code]).await
    }

    async fn invoice_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&["invoices", &id.to_string(), "pdf"]).await
    }

    async fn invoice_qr(&self, id: InvoiceId) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&["invoices", &id.to_string(), "qr"]).await
    }

    async fn login(
        &self,
        kind: LoginKind,
        request: LoginRequest,
    ) -> Result<TokenResponse, ApiError> {
        self.post_json(&kind.segments(), &request).await
    }

    async fn signup_customer(&self, request: SignupRequest) -> Result<CustomerProfile, ApiError> {
        self.post_json(&["auth", "customer", "signup"], &request)
            .await
    }

    async fn whoami(&self) -> Result<Identity, ApiError> {
        self.get_json(&["auth", "me"]).await
    }

    async fn my_invoices(&self) -> Result<Vec<InvoiceSummary>, ApiError> {
        self.get_json(&["customers", "me", "invoices"]).await
    }

    async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError> {
        self.get_json(&["analytics", "summary"]).await
    }
}
