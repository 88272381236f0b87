use std::{error::Error, io};

use clap::{Parser, Subcommand};
use selfcheckout::receipt::ReceiptError;

use crate::{config::Config, context::Context};

mod auth;
mod cart;
mod checkout;
mod invoice;
mod official;
mod scan;

#[derive(Debug, Parser)]
#[command(name = "selfcheckout", about = "Self-checkout client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read barcodes from standard input and add each to the cart
    Scan,

    /// Add one unit of a product to the cart
    Add(scan::AddArgs),

    /// Inspect or edit the cart
    Cart(cart::CartCommand),

    /// Log in as a customer or store official
    Login(auth::LoginArgs),

    /// Register a customer account
    Signup(auth::SignupArgs),

    /// Forget the stored credential
    Logout,

    /// Show the logged in account
    Whoami,

    /// Check out the cart and wait for payment at the counter
    Checkout(checkout::CheckoutArgs),

    /// List past invoices
    History,

    /// Download invoice documents
    Invoice(invoice::InvoiceCommand),

    /// Counter operations for cashiers and admins
    Official(official::OfficialCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let context = Context::from_config(&self.config)?;

        match self.command {
            Commands::Scan => scan::scan(&context).await,
            Commands::Add(args) => scan::add(&context, args).await,
            Commands::Cart(command) => cart::run(&context, command),
            Commands::Login(args) => auth::login(&context, args).await,
            Commands::Signup(args) => auth::signup(&context, args).await,
            Commands::Logout => auth::logout(&context),
            Commands::Whoami => auth::whoami(&context).await,
            Commands::Checkout(args) => checkout::run(&context, args).await,
            Commands::History => invoice::history(&context).await,
            Commands::Invoice(command) => invoice::run(&context, command).await,
            Commands::Official(command) => official::run(&context, command).await,
        }
    }
}

/// Render to standard output.
fn print_with<F>(render: F) -> Result<(), String>
where
    F: FnOnce(io::StdoutLock<'static>) -> Result<(), ReceiptError>,
{
    render(io::stdout().lock()).map_err(|error| report(&error))
}

/// An error and its causes on one line, skipping causes already shown.
pub(crate) fn report(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let cause_text = cause.to_string();

        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }

        source = cause.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use selfcheckout::{api::ApiError, checkout::CheckoutError, scan::ScanError};

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_does_not_repeat_transparent_causes() {
        let error = CheckoutError::Attach(ApiError::NotFound {
            detail: "Cart not found".to_string(),
        });

        assert_eq!(report(&error), "Cart not found");
    }

    #[test]
    fn report_appends_hidden_causes() {
        let error = ScanError::Lookup(ApiError::NotFound {
            detail: "gateway down".to_string(),
        });

        assert_eq!(report(&error), "product lookup failed: gateway down");
    }
}
