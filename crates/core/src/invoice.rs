//! Invoice derivation from completed bookings.
//!
//! An invoice is created once per booking, only after the booking is
//! `COMPLETED`. Its total is the service price plus a non-negative additional
//! charge. Asking to invoice a booking that already has one resolves to the
//! existing invoice instead of failing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::booking::{Booking, BookingAction};
use crate::error::TransitionError;
use crate::types::{BookingId, InvoiceId, PaymentStatus, clamp_charge, compute_total};

/// A billing record for a completed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub booking: BookingId,
    #[serde(default, alias = "additional_charges")]
    pub additional_charge: Decimal,
    #[serde(default, alias = "additional_charges_description")]
    pub additional_charge_description: String,
    pub total_amount: Decimal,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub invoice_date: NaiveDate,
}

impl Invoice {
    /// Replace the additional charge and recompute the total from the
    /// booked service's price.
    ///
    /// The stored total is not used: backends that fold the charge into it
    /// without reporting the charge separately would otherwise count it twice.
    /// The payment status is never touched by a charge edit.
    pub fn update_charges(
        &mut self,
        service_price: Decimal,
        additional_charge: Decimal,
        description: impl Into<String>,
    ) {
        self.additional_charge = clamp_charge(additional_charge);
        self.additional_charge_description = description.into();
        self.total_amount = compute_total(service_price, self.additional_charge);
    }

    /// Move the payment status to `status`.
    ///
    /// Returns `true` if the status changed. Setting the current status again
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::PaymentReversal`] when asked to move a paid
    /// invoice back to pending.
    pub fn set_payment_status(&mut self, status: PaymentStatus) -> Result<bool, TransitionError> {
        match (self.payment_status, status) {
            (current, next) if current == next => Ok(false),
            (PaymentStatus::Pending, PaymentStatus::Paid) => {
                self.payment_status = PaymentStatus::Paid;
                Ok(true)
            }
            (PaymentStatus::Paid, PaymentStatus::Pending) => Err(TransitionError::PaymentReversal),
            _ => Ok(false),
        }
    }

    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self.payment_status, PaymentStatus::Paid)
    }
}

/// Values for a new invoice, computed before it is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDraft {
    pub booking_id: BookingId,
    pub additional_charge: Decimal,
    pub additional_charge_description: String,
    /// Expected total; the backend recomputes it authoritatively.
    #[serde(skip)]
    pub total_amount: Decimal,
}

/// What generating an invoice for a booking should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoicePlan {
    /// No invoice exists yet: create this one.
    Create(InvoiceDraft),
    /// An invoice already exists: open it instead.
    Existing(InvoiceId),
}

/// Decide how to invoice `booking`.
///
/// `existing` is the invoice already on record for the booking, if the caller
/// found one; the booking's own `invoice` field is also consulted.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`] if the booking is not
/// `COMPLETED`.
pub fn plan_invoice(
    booking: &Booking,
    existing: Option<InvoiceId>,
    service_price: Decimal,
    additional_charge: Decimal,
    description: &str,
) -> Result<InvoicePlan, TransitionError> {
    BookingAction::GenerateInvoice.check(booking.status)?;

    if let Some(id) = existing.or(booking.invoice) {
        return Ok(InvoicePlan::Existing(id));
    }

    let additional_charge = clamp_charge(additional_charge);
    Ok(InvoicePlan::Create(InvoiceDraft {
        booking_id: booking.id,
        additional_charge,
        additional_charge_description: description.trim().to_owned(),
        total_amount: compute_total(service_price, additional_charge),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{BookingStatus, CustomerId, ServiceId, VehicleId};
    use chrono::Utc;

    fn completed_booking() -> Booking {
        Booking {
            id: BookingId::new(9),
            customer: CustomerId::new(1),
            vehicle: VehicleId::new(2),
            service: ServiceId::new(3),
            status: BookingStatus::Completed,
            preferred_date: None,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 1, 2),
            created_at: Utc::now(),
            invoice: None,
        }
    }

    fn invoice() -> Invoice {
        Invoice {
            id: InvoiceId::new(1),
            booking: BookingId::new(9),
            additional_charge: Decimal::new(500, 0),
            additional_charge_description: "parts".to_owned(),
            total_amount: Decimal::new(1500, 0),
            payment_status: PaymentStatus::Pending,
            invoice_date: NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(),
        }
    }

    #[test]
    fn test_plan_creates_draft_with_total() {
        let plan = plan_invoice(
            &completed_booking(),
            None,
            Decimal::new(1000, 0),
            Decimal::new(500, 0),
            " parts ",
        )
        .unwrap();
        let InvoicePlan::Create(draft) = plan else {
            panic!("expected a new invoice");
        };
        assert_eq!(draft.total_amount, Decimal::new(1500, 0));
        assert_eq!(draft.additional_charge_description, "parts");
    }

    #[test]
    fn test_plan_resolves_to_existing_invoice() {
        let mut booking = completed_booking();
        let plan = plan_invoice(
            &booking,
            Some(InvoiceId::new(4)),
            Decimal::ONE,
            Decimal::ZERO,
            "",
        )
        .unwrap();
        assert_eq!(plan, InvoicePlan::Existing(InvoiceId::new(4)));

        booking.invoice = Some(InvoiceId::new(5));
        let plan = plan_invoice(&booking, None, Decimal::ONE, Decimal::ZERO, "").unwrap();
        assert_eq!(plan, InvoicePlan::Existing(InvoiceId::new(5)));
    }

    #[test]
    fn test_plan_requires_completed_booking() {
        let mut booking = completed_booking();
        booking.status = BookingStatus::InProgress;
        let err = plan_invoice(&booking, None, Decimal::ONE, Decimal::ZERO, "").unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn test_plan_clamps_negative_charge() {
        let plan = plan_invoice(
            &completed_booking(),
            None,
            Decimal::new(100, 0),
            Decimal::new(-10, 0),
            "",
        )
        .unwrap();
        let InvoicePlan::Create(draft) = plan else {
            panic!("expected a new invoice");
        };
        assert_eq!(draft.additional_charge, Decimal::ZERO);
        assert_eq!(draft.total_amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_update_charges_recomputes_total_and_keeps_payment_status() {
        let mut inv = invoice();
        inv.set_payment_status(PaymentStatus::Paid).unwrap();
        inv.update_charges(Decimal::new(1000, 0), Decimal::new(25050, 2), "labour");
        assert_eq!(inv.total_amount, Decimal::new(125_050, 2));
        assert_eq!(inv.additional_charge_description, "labour");
        assert_eq!(inv.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_update_charges_ignores_charge_folded_into_total() {
        // Total already includes a 500 charge the backend did not report
        let json = r#"{
            "id": 1, "booking": 9,
            "total_amount": "1500.00",
            "payment_status": "PENDING",
            "invoice_date": "2026-01-03"
        }"#;
        let mut inv: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(inv.additional_charge, Decimal::ZERO);

        inv.update_charges(Decimal::new(1000, 0), Decimal::new(200, 0), "tyres");
        assert_eq!(inv.total_amount, Decimal::new(120_000, 2));
        assert_eq!(inv.additional_charge, Decimal::new(200, 0));
    }

    #[test]
    fn test_payment_status_is_one_way() {
        let mut inv = invoice();
        assert!(inv.set_payment_status(PaymentStatus::Paid).unwrap());
        assert!(!inv.set_payment_status(PaymentStatus::Paid).unwrap());
        assert_eq!(
            inv.set_payment_status(PaymentStatus::Pending),
            Err(TransitionError::PaymentReversal)
        );
        assert!(inv.is_paid());
    }

    #[test]
    fn test_invoice_accepts_plural_charge_field() {
        let json = r#"{
            "id": 1, "booking": 9,
            "additional_charges": "12.50",
            "additional_charges_description": "oil",
            "total_amount": "112.50",
            "payment_status": "PENDING",
            "invoice_date": "2026-01-03"
        }"#;
        let inv: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(inv.additional_charge, Decimal::new(1250, 2));
        assert_eq!(inv.additional_charge_description, "oil");
    }
}
