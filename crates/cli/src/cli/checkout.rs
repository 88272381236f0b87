use std::{fs, path::PathBuf};

use clap::Args;
use selfcheckout::{
    checkout::CheckoutOrchestrator,
    invoices::Invoice,
    poller::InvoicePoller,
    receipt,
};
use tokio::{signal, sync::mpsc};
use tracing::info;

use crate::context::Context;

use super::{print_with, report};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Create the invoice and exit without waiting for payment
    #[arg(long)]
    no_wait: bool,

    /// Where to save the payment QR code (default: invoice_<id>.png)
    #[arg(long)]
    qr_out: Option<PathBuf>,
}

pub(crate) async fn run(context: &Context, args: CheckoutArgs) -> Result<(), String> {
    let orchestrator = CheckoutOrchestrator::new(
        context.api.clone(),
        context.session.clone(),
        context.carts.clone(),
    );

    let invoice = orchestrator
        .checkout()
        .await
        .map_err(|error| report(&error))?;

    print_with(|out| receipt::write_invoice(out, &invoice))?;

    save_qr(&invoice, args.qr_out)?;

    if args.no_wait {
        println!("invoice {} is pending payment", invoice.code);

        return Ok(());
    }

    wait_for_payment(context, invoice).await
}

fn save_qr(invoice: &Invoice, out: Option<PathBuf>) -> Result<(), String> {
    let Some(png) = invoice
        .qr_png()
        .map_err(|error| format!("invalid QR image: {error}"))?
    else {
        return Ok(());
    };

    let path = out.unwrap_or_else(|| PathBuf::from(format!("invoice_{}.png", invoice.id)));

    fs::write(&path, png)
        .map_err(|error| format!("failed to write {}: {error}", path.display()))?;

    println!("show the QR code in {} at the counter", path.display());

    Ok(())
}

async fn wait_for_payment(context: &Context, invoice: Invoice) -> Result<(), String> {
    let poller = InvoicePoller::new(
        context.api.clone(),
        context.carts.clone(),
        context.poll_interval,
    );

    let code = invoice.code.clone();
    let (tx, mut updates) = mpsc::unbounded_channel();

    poller.subscribe(invoice, move |invoice| {
        _ = tx.send(invoice);
    });

    println!("waiting for payment of {code}; press Ctrl-C to stop waiting");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(invoice) if invoice.is_paid() => {
                    println!("\npayment received");

                    print_with(|out| receipt::write_invoice(out, &invoice))?;

                    println!("thank you for shopping with us");

                    return Ok(());
                }
                Some(_) => {}
                None => return Err(format!("stopped watching {code} before payment")),
            },
            signal = signal::ctrl_c() => {
                signal.map_err(|error| format!("failed to listen for Ctrl-C: {error}"))?;

                poller.cancel();

                info!(%code, "stopped waiting for payment");
                println!("stopped waiting; {code} is still pending and your cart is kept");

                return Ok(());
            }
        }
    }
}
