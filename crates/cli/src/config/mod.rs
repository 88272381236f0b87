//! Client configuration

use clap::Args;

pub(crate) use crate::config::{
    api::ApiConfig,
    logging::{LogFormat, LoggingConfig},
    storage::StorageConfig,
};

mod api;
mod logging;
mod storage;

/// Settings shared by every command.
#[derive(Debug, Args)]
pub(crate) struct Config {
    /// Remote service settings.
    #[command(flatten)]
    pub(crate) api: ApiConfig,

    /// Local persistence settings.
    #[command(flatten)]
    pub(crate) storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,
}
