//! Plain-text rendering for command results.
//!
//! Results go to stdout so they can be piped; progress and errors go through
//! `tracing`.

#![allow(clippy::print_stdout)]

use std::fmt::Display;

use garage_client::{BookingRecord, Customer, InvoiceRecord, Service, Vehicle};
use garage_core::format_money;

/// Print one line of output.
pub fn line(text: impl Display) {
    println!("{text}");
}

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

pub fn booking_row(record: &BookingRecord) -> String {
    format!(
        "#{:<5} {:<12} {:<24} {:<20} {:<10} {}",
        record.id().as_i64(),
        record.status().label(),
        record.service_name(),
        record.vehicle_label(),
        date_or_dash(record.booking.scheduled_date.or(record.booking.preferred_date)),
        record.customer_name(),
    )
}

pub fn bookings(records: &[BookingRecord]) {
    if records.is_empty() {
        line("No bookings.");
        return;
    }
    for record in records {
        line(booking_row(record));
    }
}

pub fn booking_detail(record: &BookingRecord) {
    let booking = &record.booking;
    line(format!("Booking #{}", booking.id));
    line(format!("  Status:     {}", booking.status.label()));
    line(format!("  Customer:   {}", record.customer_name()));
    line(format!("  Vehicle:    {}", record.vehicle_label()));
    line(format!("  Service:    {}", record.service_name()));
    line(format!("  Preferred:  {}", date_or_dash(booking.preferred_date)));
    line(format!("  Scheduled:  {}", date_or_dash(booking.scheduled_date)));
    if let Some(invoice) = booking.invoice {
        line(format!("  Invoice:    #{invoice}"));
    }
    let actions: Vec<&str> = booking.available_actions().iter().map(|a| a.label()).collect();
    if !actions.is_empty() {
        line(format!("  Actions:    {}", actions.join(", ")));
    }
}

pub fn invoice_row(record: &InvoiceRecord) -> String {
    let invoice = &record.invoice;
    let service = record
        .booking
        .as_ref()
        .map_or_else(|| format!("Booking #{}", invoice.booking), BookingRecord::service_name);
    format!(
        "#{:<5} {:<10} {:<8} {:>12} {}",
        invoice.id.as_i64(),
        invoice.invoice_date.to_string(),
        invoice.payment_status.to_string(),
        format_money(invoice.total_amount),
        service,
    )
}

pub fn invoices(records: &[InvoiceRecord]) {
    if records.is_empty() {
        line("No invoices.");
        return;
    }
    for record in records {
        line(invoice_row(record));
    }
}

pub fn customer_row(customer: &Customer) -> String {
    format!(
        "#{:<5} {:<24} {:<16} {:<14} {}",
        customer.id.as_i64(),
        customer.display_name(),
        customer.username().unwrap_or("-"),
        customer.phone.as_deref().unwrap_or("-"),
        if customer.is_active { "active" } else { "suspended" },
    )
}

pub fn vehicle_row(vehicle: &Vehicle) -> String {
    let owner = vehicle
        .customer_id()
        .map_or_else(String::new, |id| format!("customer #{id}"));
    format!("#{:<5} {:<28} {owner}", vehicle.id.as_i64(), vehicle.label())
}

pub fn service_row(service: &Service) -> String {
    format!(
        "#{:<5} {:<28} {:>12}  {}",
        service.id.as_i64(),
        service.service_name,
        service.price_label(),
        service.description.as_deref().unwrap_or(""),
    )
}
