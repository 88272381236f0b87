//! Receipt
//!
//! Terminal rendering of carts, invoice bills, invoice history and the sales
//! dashboard.

use std::io;

use jiff::civil::DateTime;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    api::AnalyticsSummary,
    cart::Cart,
    invoices::{Invoice, InvoiceStatus, InvoiceSummary},
    pricing::{format_inr, format_weight},
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Writing to the output failed.
    #[error("failed to write receipt")]
    Io(#[from] io::Error),
}

/// Print the cart as a table followed by its totals.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_cart(mut out: impl io::Write, cart: &Cart) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        writeln!(out, "\nCart is empty. Scan or add a product to begin.\n")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Code", "Unit Price", "Qty", "Weight", "Subtotal"]);

    for (idx, line) in cart.iter().enumerate() {
        builder.push_record([
            format!("#{:<3}", idx + 1),
            line.name.clone(),
            line.code.clone(),
            format_inr(line.unit_price),
            line.quantity.to_string(),
            format_weight(line.net_weight()),
            format_inr(line.subtotal()),
        ]);
    }

    write_table(&mut out, builder, 3..7)?;

    let totals = cart.totals();

    write_summary(
        &mut out,
        &[
            ("Units:", totals.units.to_string()),
            ("Net weight:", format_weight(totals.total_weight)),
            ("Estimated total:", format_inr(totals.total)),
        ],
    )
}

/// Print an invoice bill: header, line items if known, and totals.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_invoice(mut out: impl io::Write, invoice: &Invoice) -> Result<(), ReceiptError> {
    writeln!(out, "\nInvoice {} (#{})", invoice.code, invoice.id)?;
    writeln!(out, "Status:   {}", status_label(invoice.status))?;

    if let Some(customer) = &invoice.customer_name {
        writeln!(out, "Customer: {customer}")?;
    }

    if let Some(date) = invoice.date {
        writeln!(out, "Date:     {}", format_date(date))?;
    }

    if !invoice.items.is_empty() {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Qty", "Weight", "Subtotal"]);

        for (idx, item) in invoice.items.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                item.product_name.clone(),
                item.quantity.to_string(),
                format_weight(item.net_weight),
                format_inr(item.subtotal),
            ]);
        }

        write_table(&mut out, builder, 2..5)?;
    }

    write_summary(
        &mut out,
        &[
            ("Net weight:", format_weight(invoice.total_weight)),
            ("Total:", format_inr(invoice.total)),
        ],
    )
}

/// Print the customer's past invoices.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_history(
    mut out: impl io::Write,
    invoices: &[InvoiceSummary],
) -> Result<(), ReceiptError> {
    if invoices.is_empty() {
        writeln!(out, "\nNo invoices yet.\n")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Id", "Code", "Date", "Status", "Total"]);

    for invoice in invoices {
        builder.push_record([
            invoice.id.to_string(),
            invoice.code.clone(),
            invoice.date.map(format_date).unwrap_or_default(),
            status_label(invoice.status),
            format_inr(invoice.total),
        ]);
    }

    write_table(&mut out, builder, 4..5)?;

    writeln!(out)?;

    Ok(())
}

/// Print the sales dashboard.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_dashboard(
    mut out: impl io::Write,
    summary: &AnalyticsSummary,
) -> Result<(), ReceiptError> {
    write_summary(
        &mut out,
        &[
            ("Revenue:", format_inr(summary.total_revenue)),
            ("Paid invoices:", summary.total_paid_invoices.to_string()),
        ],
    )?;

    if !summary.daily_sales.is_empty() {
        let mut builder = Builder::default();

        builder.push_record(["Day", "Sales"]);

        for day in &summary.daily_sales {
            builder.push_record([day.date.to_string(), format_inr(day.total)]);
        }

        write_table(&mut out, builder, 1..2)?;
    }

    if !summary.top_customers.is_empty() {
        let mut builder = Builder::default();

        builder.push_record(["", "Customer", "Spent"]);

        for (rank, customer) in summary.top_customers.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", rank + 1),
                customer.name.clone(),
                format_inr(customer.spent),
            ]);
        }

        write_table(&mut out, builder, 2..3)?;
    }

    writeln!(out)?;

    Ok(())
}

fn status_label(status: InvoiceStatus) -> String {
    status.as_str().to_ascii_uppercase()
}

fn format_date(date: DateTime) -> String {
    date.strftime("%Y-%m-%d %H:%M").to_string()
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    numeric_columns: std::ops::Range<usize>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(numeric_columns), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

/// Right-aligned `label  value` lines sharing one label and one value column.
fn write_summary(out: &mut impl io::Write, lines: &[(&str, String)]) -> Result<(), ReceiptError> {
    let label_width = lines
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| value.chars().count())
        .max()
        .unwrap_or_default();

    for (label, value) in lines {
        writeln!(out, " {label:>label_width$}  {value:>value_width$}")?;
    }

    writeln!(out)?;

    Ok(())
}
