use clap::{Args, Subcommand};
use selfcheckout::{invoices::InvoiceId, official::CounterDesk, receipt};

use crate::context::Context;

use super::{print_with, report};

#[derive(Debug, Args)]
pub(crate) struct OfficialCommand {
    #[command(subcommand)]
    command: OfficialSubcommand,
}

#[derive(Debug, Subcommand)]
enum OfficialSubcommand {
    /// Look up a bill by the code on the customer's QR
    Fetch(FetchArgs),

    /// Mark an invoice as paid
    Pay(PayArgs),

    /// Show sales figures
    Dashboard,
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Invoice code
    code: String,
}

#[derive(Debug, Args)]
struct PayArgs {
    /// Invoice id
    id: InvoiceId,
}

pub(crate) async fn run(context: &Context, command: OfficialCommand) -> Result<(), String> {
    let desk = CounterDesk::new(context.api.clone(), context.session.clone());

    match command.command {
        OfficialSubcommand::Fetch(args) => {
            let invoice = desk
                .fetch_bill(&args.code)
                .await
                .map_err(|error| report(&error))?;

            print_with(|out| receipt::write_invoice(out, &invoice))
        }
        OfficialSubcommand::Pay(args) => {
            let invoice = desk
                .mark_paid(args.id)
                .await
                .map_err(|error| report(&error))?;

            println!("invoice {} marked as paid", invoice.code);

            print_with(|out| receipt::write_invoice(out, &invoice))
        }
        OfficialSubcommand::Dashboard => {
            let summary = desk.dashboard().await.map_err(|error| report(&error))?;

            print_with(|out| receipt::write_dashboard(out, &summary))
        }
    }
}
