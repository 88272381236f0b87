use clap::Args;
use selfcheckout::{
    receipt,
    scan::{BarcodeSource, LineScanner, ScanError, ScanSession, Scanned},
};

use crate::context::Context;

use super::{print_with, report};

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Product code as printed under the barcode
    code: String,
}

pub(crate) async fn add(context: &Context, args: AddArgs) -> Result<(), String> {
    let scanned = session(context)
        .add_code(&args.code)
        .await
        .map_err(|error| report(&error))?;

    announce(&scanned);

    Ok(())
}

pub(crate) async fn scan(context: &Context) -> Result<(), String> {
    let session = session(context);
    let mut scanner = LineScanner::stdin();
    let mut codes = scanner.start().map_err(|error| report(&error))?;

    println!("Scan products, one per line. End input (Ctrl-D) to finish.");

    while let Some(code) = codes.recv().await {
        match session.add_code(&code).await {
            Ok(scanned) => announce(&scanned),
            Err(error @ ScanError::Storage(_)) => return Err(report(&error)),
            Err(error) => eprintln!("{}", report(&error)),
        }
    }

    print_with(|out| receipt::write_cart(out, &context.carts.load()))
}

fn session(context: &Context) -> ScanSession {
    ScanSession::new(context.api.clone(), context.carts.clone())
}

fn announce(scanned: &Scanned) {
    println!(
        "added {} ({}), quantity {}, {} item(s) in cart",
        scanned.line.name,
        scanned.line.code,
        scanned.line.quantity,
        scanned.cart.len()
    );
}
