//! Authentication
//!
//! Login stores the issued credential in the session and then runs the
//! caller's completion continuation once.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    api::{ApiError, CheckoutApi, CustomerProfile, LoginKind, LoginRequest, SignupRequest},
    session::{Credential, SessionContext},
    storage::StorageError,
};

/// Errors raised by login, signup and logout.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The service refused the request; its reason is carried unchanged.
    #[error("{0}")]
    Rejected(#[source] ApiError),

    /// The issued role does not belong to the login that was used.
    #[error("this account cannot use the {kind} login")]
    WrongPortal {
        /// Login portal that was used
        kind: &'static str,
    },

    /// The credential could not be stored or removed.
    #[error("failed to update session")]
    Storage(#[from] StorageError),
}

/// Login, signup and logout against the remote service.
#[derive(Debug, Clone)]
pub struct Authenticator {
    api: Arc<dyn CheckoutApi>,
    session: Arc<dyn SessionContext>,
}

impl Authenticator {
    /// Create an authenticator storing credentials in `session`.
    pub fn new(api: Arc<dyn CheckoutApi>, session: Arc<dyn SessionContext>) -> Self {
        Self { api, session }
    }

    /// Log in and store the issued credential.
    ///
    /// `on_success` runs once, after the credential is stored. A failed login
    /// leaves the session as it was.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingField`] for a blank email or password.
    /// - [`AuthError::Rejected`] when the service refuses the credentials.
    /// - [`AuthError::WrongPortal`] when a customer token comes back from the
    ///   official login or vice versa.
    /// - [`AuthError::Storage`] when the credential cannot be stored.
    pub async fn login<F>(
        &self,
        kind: LoginKind,
        email: &str,
        password: &str,
        on_success: F,
    ) -> Result<Credential, AuthError>
    where
        F: FnOnce(&Credential) + Send,
    {
        let email = email.trim();

        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }

        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let response = self
            .api
            .login(
                kind,
                LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await
            .map_err(AuthError::Rejected)?;

        let official = matches!(kind, LoginKind::Official);

        if response.role.is_official() != official {
            return Err(AuthError::WrongPortal {
                kind: if official { "official" } else { "customer" },
            });
        }

        let credential = Credential::new(response.access_token, response.role);

        self.session.set(credential.clone())?;

        info!(role = %credential.role, "logged in");

        on_success(&credential);

        Ok(credential)
    }

    /// Register a customer account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingField`] for a blank name, email or password,
    /// or [`AuthError::Rejected`] when the service refuses the signup (for
    /// example an email that is already registered).
    pub async fn signup(&self, request: SignupRequest) -> Result<CustomerProfile, AuthError> {
        let request = SignupRequest {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
            password: request.password,
        };

        for (field, value) in [
            ("name", &request.name),
            ("email", &request.email),
            ("password", &request.password),
        ] {
            if value.is_empty() {
                return Err(AuthError::MissingField(field));
            }
        }

        let profile = self
            .api
            .signup_customer(request)
            .await
            .map_err(AuthError::Rejected)?;

        info!(customer_id = %profile.id, "customer registered");

        Ok(profile)
    }

    /// Forget the session credential. Logging out twice is fine.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the stored credential cannot be removed.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.session.clear()?;

        info!("logged out");

        Ok(())
    }

    /// The current credential, if any.
    pub fn current(&self) -> Option<Credential> {
        self.session.get()
    }
}
