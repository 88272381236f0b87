//! Shared command dependencies.

use std::{sync::Arc, time::Duration};

use selfcheckout::{
    api::{CheckoutApi, HttpApiClient},
    cart::CartStore,
    session::{SessionContext, StoredSession},
    storage::{FileStorage, LocalStorage},
};
use tracing::debug;

use crate::config::Config;

/// Storage, session and service client wired from configuration.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub(crate) api: Arc<dyn CheckoutApi>,
    pub(crate) session: Arc<dyn SessionContext>,
    pub(crate) carts: CartStore,
    pub(crate) poll_interval: Duration,
}

impl Context {
    pub(crate) fn from_config(config: &Config) -> Result<Self, String> {
        let storage: Arc<dyn LocalStorage> =
            Arc::new(FileStorage::new(config.storage.data_dir.clone()));

        let session: Arc<dyn SessionContext> =
            Arc::new(StoredSession::new(Arc::clone(&storage)));

        let client = HttpApiClient::new(&config.api.client(), Arc::clone(&session))
            .map_err(|error| format!("invalid service configuration: {error}"))?;

        debug!(
            base_url = %client.base_url(),
            data_dir = %config.storage.data_dir.display(),
            "client configured"
        );

        Ok(Self {
            api: Arc::new(client),
            session,
            carts: CartStore::new(storage),
            poll_interval: config.api.poll_interval(),
        })
    }
}
