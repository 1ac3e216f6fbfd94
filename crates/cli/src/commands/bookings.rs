//! Booking commands.
//!
//! # Usage
//!
//! ```bash
//! # Everyone: list and inspect
//! garage bookings list --status pending
//! garage bookings show 12
//!
//! # Customer: request a service
//! garage bookings create --vehicle 3 --service 1 --date 2026-11-02
//!
//! # Admin: lifecycle actions
//! garage bookings approve 12 --date 2026-11-03
//! garage bookings reschedule 12 --date 2026-11-05
//! garage bookings start 12
//! garage bookings complete 12
//! ```

use chrono::NaiveDate;
use garage_client::BookingRecord;
use garage_core::{BookingId, BookingStatus, NewBooking, ServiceId, VehicleId};

use super::{CommandError, Context};
use crate::output;

/// List the bookings visible to the signed-in user.
///
/// # Errors
///
/// Returns `CommandError::Desk` if nobody is signed in or the list fails.
pub async fn list(ctx: &Context, status: Option<BookingStatus>) -> Result<(), CommandError> {
    let records = ctx.desk.bookings().await?;
    let records: Vec<BookingRecord> = records
        .into_iter()
        .filter(|r| status.is_none_or(|s| r.status() == s))
        .collect();
    output::bookings(&records);
    Ok(())
}

/// Show one booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the booking is not visible.
pub async fn show(ctx: &Context, id: BookingId) -> Result<(), CommandError> {
    let record = ctx.desk.booking(id).await?;
    output::booking_detail(&record);
    Ok(())
}

/// Request a service for a vehicle.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a past date, a non-customer session or a
/// backend refusal.
pub async fn create(
    ctx: &Context,
    vehicle_id: VehicleId,
    service_id: ServiceId,
    preferred_date: NaiveDate,
) -> Result<(), CommandError> {
    let record = ctx
        .desk
        .create_booking(&NewBooking {
            vehicle_id,
            service_id,
            preferred_date,
        })
        .await?;
    output::line(format!(
        "Booking #{} requested for {}. Waiting for approval.",
        record.id(),
        preferred_date
    ));
    Ok(())
}

fn report(record: &BookingRecord, verb: &str) {
    output::line(format!(
        "Booking #{} {verb}. Status: {}.",
        record.id(),
        record.status().label()
    ));
}

/// Approve a pending booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the action is not allowed.
pub async fn approve(ctx: &Context, id: BookingId, date: NaiveDate) -> Result<(), CommandError> {
    let record = ctx.desk.approve(id, date).await?;
    report(&record, &format!("approved for {date}"));
    Ok(())
}

/// Reject a pending booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the action is not allowed.
pub async fn reject(ctx: &Context, id: BookingId) -> Result<(), CommandError> {
    let record = ctx.desk.reject(id).await?;
    report(&record, "rejected");
    Ok(())
}

/// Start work on an approved booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the action is not allowed.
pub async fn start(ctx: &Context, id: BookingId) -> Result<(), CommandError> {
    let record = ctx.desk.start(id).await?;
    report(&record, "started");
    Ok(())
}

/// Complete an in-progress booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the action is not allowed.
pub async fn complete(ctx: &Context, id: BookingId) -> Result<(), CommandError> {
    let record = ctx.desk.complete(id).await?;
    report(&record, "completed");
    output::line(format!(
        "Run `garage invoices generate {id}` to issue the invoice."
    ));
    Ok(())
}

/// Cancel an approved booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the action is not allowed.
pub async fn cancel(ctx: &Context, id: BookingId) -> Result<(), CommandError> {
    let record = ctx.desk.cancel(id).await?;
    report(&record, "cancelled");
    Ok(())
}

/// Move a booking to another date.
///
/// # Errors
///
/// Returns `CommandError::Desk` if the action is not allowed.
pub async fn reschedule(ctx: &Context, id: BookingId, date: NaiveDate) -> Result<(), CommandError> {
    let record = ctx.desk.reschedule(id, date).await?;
    report(&record, &format!("rescheduled to {date}"));
    Ok(())
}

/// Delete a booking.
///
/// # Errors
///
/// Returns `CommandError::Desk` for a non-admin session or a backend refusal.
pub async fn delete(ctx: &Context, id: BookingId) -> Result<(), CommandError> {
    ctx.desk.delete_booking(id).await?;
    output::line(format!("Booking #{id} deleted."));
    Ok(())
}
