//! Session credentials
//!
//! The bearer token and role handed out at login. Presence and role decide
//! which operations the client attempts; the service re-validates every call.

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroize;

use crate::storage::{LocalStorage, StorageError};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "abs_token";

/// Storage key holding the role tag.
pub const ROLE_KEY: &str = "abs_role";

/// Role attached to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shopper building carts and paying invoices.
    Customer,

    /// Store official at the payment counter.
    Cashier,

    /// Store official with administrative rights.
    Admin,
}

impl Role {
    /// Wire/storage spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Cashier => "cashier",
            Self::Admin => "admin",
        }
    }

    /// Cashiers and admins are both store officials.
    #[must_use]
    pub const fn is_official(self) -> bool {
        matches!(self, Self::Cashier | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or received role tag is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "customer" => Ok(Self::Customer),
            "cashier" => Ok(Self::Cashier),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Opaque bearer token. Never printed, wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(**redacted**)")
    }
}

impl Drop for BearerToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Token plus role, as held by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token
    pub token: BearerToken,

    /// Role the token was issued for
    pub role: Role,
}

impl Credential {
    /// Build a credential from a raw token and role.
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: BearerToken::new(token),
            role,
        }
    }
}

/// Access to the current session credential.
pub trait SessionContext: fmt::Debug + Send + Sync {
    /// The current credential, if logged in.
    fn get(&self) -> Option<Credential>;

    /// Replace the current credential.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the credential cannot be persisted.
    fn set(&self, credential: Credential) -> Result<(), StorageError>;

    /// Forget the current credential. Clearing an empty session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the stored credential cannot be removed.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Session credential persisted in local storage under two keys.
#[derive(Debug, Clone)]
pub struct StoredSession {
    storage: Arc<dyn LocalStorage>,
}

impl StoredSession {
    /// Keep the credential in `storage`.
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }
}

impl SessionContext for StoredSession {
    fn get(&self) -> Option<Credential> {
        let read = |key: &str| {
            self.storage.get_item(key).unwrap_or_else(|error| {
                warn!(%error, key, "failed to read stored credential");

                None
            })
        };

        let token = read(TOKEN_KEY)?;
        let role = read(ROLE_KEY)?;

        match role.parse() {
            Ok(role) => Some(Credential::new(token, role)),
            Err(error) => {
                warn!(%error, "ignoring stored credential");

                None
            }
        }
    }

    /// A failed role write also drops the new token, so a token is never
    /// paired with a stale role.
    fn set(&self, credential: Credential) -> Result<(), StorageError> {
        self.storage.set_item(TOKEN_KEY, credential.token.expose())?;

        if let Err(error) = self.storage.set_item(ROLE_KEY, credential.role.as_str()) {
            if let Err(cleanup) = self.storage.remove_item(TOKEN_KEY) {
                warn!(error = %cleanup, "failed to discard token after role write failed");
            }

            return Err(error);
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(ROLE_KEY)
    }
}

/// Session credential held only in memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    credential: Mutex<Option<Credential>>,
}

impl MemorySession {
    /// Start logged out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start logged in with `credential`.
    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }
}

impl SessionContext for MemorySession {
    fn get(&self) -> Option<Credential> {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, credential: Credential) -> Result<(), StorageError> {
        *self.credential.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential);

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        Ok(())
    }
}
