//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Local persistence settings.
#[derive(Debug, Args)]
pub(crate) struct StorageConfig {
    /// Directory holding the cart and session
    #[arg(
        long,
        env = "SELFCHECKOUT_DATA_DIR",
        default_value = ".selfcheckout",
        global = true
    )]
    pub(crate) data_dir: PathBuf,
}
