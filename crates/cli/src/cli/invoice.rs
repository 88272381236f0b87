use std::{fs, path::PathBuf};

use clap::{Args, Subcommand};
use selfcheckout::{checkout::CheckoutOrchestrator, invoices::InvoiceId, receipt};

use crate::context::Context;

use super::{print_with, report};

#[derive(Debug, Args)]
pub(crate) struct InvoiceCommand {
    #[command(subcommand)]
    command: InvoiceSubcommand,
}

#[derive(Debug, Subcommand)]
enum InvoiceSubcommand {
    /// Download the invoice PDF
    Pdf(PdfArgs),

    /// Download the payment QR code as PNG
    Qr(QrArgs),
}

#[derive(Debug, Args)]
struct PdfArgs {
    /// Invoice id
    id: InvoiceId,

    /// Invoice code, used to name the file (invoice_<code>.pdf)
    #[arg(long)]
    code: Option<String>,

    /// Output path
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct QrArgs {
    /// Invoice id
    id: InvoiceId,

    /// Output path (default: invoice_<id>.png)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn orchestrator(context: &Context) -> CheckoutOrchestrator {
    CheckoutOrchestrator::new(
        context.api.clone(),
        context.session.clone(),
        context.carts.clone(),
    )
}

pub(crate) async fn history(context: &Context) -> Result<(), String> {
    let invoices = orchestrator(context)
        .history()
        .await
        .map_err(|error| report(&error))?;

    print_with(|out| receipt::write_history(out, &invoices))
}

pub(crate) async fn run(context: &Context, command: InvoiceCommand) -> Result<(), String> {
    let orchestrator = orchestrator(context);

    let (bytes, path) = match command.command {
        InvoiceSubcommand::Pdf(args) => {
            let bytes = orchestrator
                .invoice_pdf(args.id)
                .await
                .map_err(|error| report(&error))?;

            let name = args.code.unwrap_or_else(|| args.id.to_string());

            (
                bytes,
                args.out
                    .unwrap_or_else(|| PathBuf::from(format!("invoice_{name}.pdf"))),
            )
        }
        InvoiceSubcommand::Qr(args) => {
            let bytes = orchestrator
                .invoice_qr(args.id)
                .await
                .map_err(|error| report(&error))?;

            (
                bytes,
                args.out
                    .unwrap_or_else(|| PathBuf::from(format!("invoice_{}.png", args.id))),
            )
        }
    };

    fs::write(&path, &bytes)
        .map_err(|error| format!("failed to write {}: {error}", path.display()))?;

    println!("saved {} ({} bytes)", path.display(), bytes.len());

    Ok(())
}
