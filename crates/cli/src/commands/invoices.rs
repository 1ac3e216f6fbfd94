//! Invoice commands.
//!
//! # Usage
//!
//! ```bash
//! garage invoices list --unpaid
//! garage invoices generate 12 --charge 250 --description "Brake pads"
//! garage invoices charges 5 --charge 300 --description "Brake pads and fluid"
//! garage invoices mark-paid 5
//! garage invoices download 5 -o invoice.pdf
//! ```

use std::path::PathBuf;

use garage_client::{InvoiceOutcome, InvoiceRecord};
use garage_core::{BookingId, InvoiceId, Role, format_money};
use rust_decimal::Decimal;

use super::{CommandError, Context};
use crate::output;

/// List invoices. Admins see every invoice; customers see their own.
///
/// # Errors
///
/// Returns `CommandError::Desk` if nobody is signed in or the list fails.
pub async fn list(ctx: &Context, unpaid_only: bool) -> Result<(), CommandError> {
    let principal = ctx.desk.require_session()?;
    let records: Vec<InvoiceRecord> = if principal.role == Role::Admin {
        ctx.desk.invoices().await?
    } else {
        ctx.api().list_invoices().await?
    };
    let records: Vec<InvoiceRecord> = records
        .into_iter()
        .filter(|r| !unpaid_only || !r.invoice.is_paid())
        .collect();
    output::invoices(&records);
    Ok(())
}

/// Issue the invoice for a completed booking.
///
/// An already-invoiced booking reports its existing invoice instead.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the booking is not completed or the
/// backend refuses the invoice.
pub async fn generate(
    ctx: &Context,
    booking: BookingId,
    charge: Decimal,
    description: &str,
) -> Result<(), CommandError> {
    match ctx.desk.generate_invoice(booking, charge, description).await? {
        InvoiceOutcome::Created(record) => output::line(format!(
            "Invoice #{} created for booking #{booking}. Total: {}.",
            record.id(),
            format_money(record.invoice.total_amount)
        )),
        InvoiceOutcome::Existing(id) => output::line(format!(
            "Booking #{booking} is already invoiced. Opening invoice #{id}."
        )),
    }
    Ok(())
}

/// Mark an invoice as paid.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-admin session or a backend refusal.
pub async fn mark_paid(ctx: &Context, id: InvoiceId) -> Result<(), CommandError> {
    let record = ctx.desk.mark_paid(id).await?;
    output::line(format!(
        "Invoice #{id} is {}.",
        record.invoice.payment_status
    ));
    Ok(())
}

/// Replace an invoice's additional charge.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-admin session or a backend refusal.
pub async fn charges(
    ctx: &Context,
    id: InvoiceId,
    charge: Decimal,
    description: &str,
) -> Result<(), CommandError> {
    let record = ctx.desk.update_invoice_charges(id, charge, description).await?;
    output::line(format!(
        "Invoice #{id} updated. Total: {}.",
        format_money(record.invoice.total_amount)
    ));
    Ok(())
}

/// Save an invoice PDF to disk.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the download fails, or
/// `CommandError::Io` if the file cannot be written.
pub async fn download(
    ctx: &Context,
    id: InvoiceId,
    output_path: Option<PathBuf>,
) -> Result<(), CommandError> {
    ctx.desk.require_session()?;
    let bytes = ctx.api().download_invoice_pdf(id).await?;
    let path = output_path.unwrap_or_else(|| PathBuf::from(format!("invoice-{id}.pdf")));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Saved invoice PDF");
    output::line(format!("Saved {}.", path.display()));
    Ok(())
}
