//! Remote Service Config

use std::time::Duration;

use clap::Args;
use selfcheckout::api::ClientConfig;

/// Remote checkout service settings.
#[derive(Debug, Args)]
pub(crate) struct ApiConfig {
    /// Checkout service root URL
    #[arg(
        long,
        env = "SELFCHECKOUT_API_BASE_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub(crate) api_base_url: String,

    /// Seconds between invoice status checks
    #[arg(
        long,
        env = "SELFCHECKOUT_POLL_INTERVAL_SECS",
        default_value_t = 3_u64,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub(crate) poll_interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "SELFCHECKOUT_REQUEST_TIMEOUT_SECS",
        default_value_t = 10_u64,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub(crate) request_timeout_secs: u64,
}

impl ApiConfig {
    /// HTTP client settings.
    pub(crate) fn client(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
