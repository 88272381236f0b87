//! Self-checkout command line client

use std::process;

use clap::Parser;

use crate::cli::Cli;

mod cli;
mod config;
mod context;
mod logging;

#[tokio::main]
pub async fn main() {
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = logging::init(&cli.config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
