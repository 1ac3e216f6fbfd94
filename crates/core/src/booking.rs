//! Booking lifecycle state machine.
//!
//! The backend is the authority of record for booking status. This module is
//! the canonical rule set both sides agree on: the client uses it to decide
//! which actions to offer and to reject obviously invalid requests before they
//! leave the process.
//!
//! # Transitions
//!
//! ```text
//!            approve(date)          start             complete
//!  PENDING ───────────────▶ APPROVED ─────▶ IN_PROGRESS ────────▶ COMPLETED
//!     │                        │                                     │
//!     │ reject                 │ cancel                              │ generate invoice
//!     ▼                        ▼                                     ▼
//!  REJECTED                CANCELLED                         (invoice created)
//! ```
//!
//! `reschedule(date)` keeps the status and is valid from `PENDING`,
//! `APPROVED` and `IN_PROGRESS`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::types::{BookingId, BookingStatus, CustomerId, InvoiceId, ServiceId, VehicleId};

/// A named booking action, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Approve,
    Reject,
    Start,
    Complete,
    Cancel,
    Reschedule,
    GenerateInvoice,
}

impl BookingAction {
    /// Every action, in the order a front-end should list them.
    pub const ALL: [Self; 7] = [
        Self::Approve,
        Self::Reject,
        Self::Start,
        Self::Complete,
        Self::Cancel,
        Self::Reschedule,
        Self::GenerateInvoice,
    ];

    /// Statuses from which this action may be taken.
    #[must_use]
    pub const fn allowed_from(self) -> &'static [BookingStatus] {
        use BookingStatus::{Approved, Completed, InProgress, Pending};
        match self {
            Self::Approve | Self::Reject => &[Pending],
            Self::Start | Self::Cancel => &[Approved],
            Self::Complete => &[InProgress],
            Self::Reschedule => &[Pending, Approved, InProgress],
            Self::GenerateInvoice => &[Completed],
        }
    }

    /// Whether this action may be taken from `status`.
    #[must_use]
    pub fn is_allowed_from(self, status: BookingStatus) -> bool {
        self.allowed_from().contains(&status)
    }

    /// Status the booking ends up in after this action succeeds from `from`.
    #[must_use]
    pub const fn target(self, from: BookingStatus) -> BookingStatus {
        match self {
            Self::Approve => BookingStatus::Approved,
            Self::Reject => BookingStatus::Rejected,
            Self::Start => BookingStatus::InProgress,
            Self::Complete => BookingStatus::Completed,
            Self::Cancel => BookingStatus::Cancelled,
            Self::Reschedule | Self::GenerateInvoice => from,
        }
    }

    /// Check that this action is valid from `from` and return the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] if `from` is not a
    /// valid source status for this action.
    pub fn check(self, from: BookingStatus) -> Result<BookingStatus, TransitionError> {
        if self.is_allowed_from(from) {
            Ok(self.target(from))
        } else {
            Err(TransitionError::invalid(self, from))
        }
    }

    /// URL path segment of the backend action endpoint, if the action has one.
    #[must_use]
    pub const fn endpoint(self) -> Option<&'static str> {
        match self {
            Self::Approve => Some("approve"),
            Self::Reject => Some("reject"),
            Self::Start => Some("start"),
            Self::Complete => Some("complete"),
            Self::Cancel => Some("cancel"),
            Self::Reschedule | Self::GenerateInvoice => None,
        }
    }

    /// Button label used by the admin booking table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Reject => "Reject",
            Self::Start => "Start Work",
            Self::Complete => "Complete",
            Self::Cancel => "Cancel",
            Self::Reschedule => "Reschedule",
            Self::GenerateInvoice => "Generate Invoice",
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Reschedule => "reschedule",
            Self::GenerateInvoice => "invoice",
        };
        f.write_str(verb)
    }
}

/// Actions an admin may take on a booking in `status`.
///
/// Front-ends must only offer these; the backend still enforces the same
/// rules.
#[must_use]
pub fn available_actions(status: BookingStatus) -> Vec<BookingAction> {
    BookingAction::ALL
        .into_iter()
        .filter(|action| action.is_allowed_from(status))
        .collect()
}

/// A booking action together with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve { scheduled_date: NaiveDate },
    Reject,
    Start,
    Complete,
    Cancel,
    Reschedule { new_date: NaiveDate },
}

impl Transition {
    #[must_use]
    pub const fn action(&self) -> BookingAction {
        match self {
            Self::Approve { .. } => BookingAction::Approve,
            Self::Reject => BookingAction::Reject,
            Self::Start => BookingAction::Start,
            Self::Complete => BookingAction::Complete,
            Self::Cancel => BookingAction::Cancel,
            Self::Reschedule { .. } => BookingAction::Reschedule,
        }
    }

    /// The date this transition schedules the booking for, if any.
    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Approve { scheduled_date } => Some(*scheduled_date),
            Self::Reschedule { new_date } => Some(*new_date),
            Self::Reject | Self::Start | Self::Complete | Self::Cancel => None,
        }
    }
}

/// A booking as held in the client cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer: CustomerId,
    pub vehicle: VehicleId,
    pub service: ServiceId,
    pub status: BookingStatus,
    /// Date requested by the customer. Set at creation, never changed.
    pub preferred_date: Option<NaiveDate>,
    /// Date the garage committed to.
    pub scheduled_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    /// Invoice generated for this booking, if any.
    pub invoice: Option<InvoiceId>,
}

impl Booking {
    /// Validate `transition` against the current status and date rules
    /// without changing the booking.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] if the action is not
    /// valid from the current status, or [`TransitionError::Validation`] if
    /// the requested date lies before `today`.
    pub fn validate(
        &self,
        transition: &Transition,
        today: NaiveDate,
    ) -> Result<BookingStatus, TransitionError> {
        let next = transition.action().check(self.status)?;
        if let Some(date) = transition.date() {
            check_not_past(date, today)?;
        }
        Ok(next)
    }

    /// Apply `transition` to this booking.
    ///
    /// Rejecting or cancelling clears any scheduled date so terminal failure
    /// states never carry one.
    ///
    /// # Errors
    ///
    /// Same as [`Booking::validate`]; the booking is left untouched on error.
    pub fn apply(&mut self, transition: &Transition, today: NaiveDate) -> Result<(), TransitionError> {
        let next = self.validate(transition, today)?;
        match transition {
            Transition::Approve { scheduled_date } => self.scheduled_date = Some(*scheduled_date),
            Transition::Reschedule { new_date } => self.scheduled_date = Some(*new_date),
            Transition::Reject | Transition::Cancel => self.scheduled_date = None,
            Transition::Start | Transition::Complete => {}
        }
        self.status = next;
        Ok(())
    }

    /// Actions currently available on this booking.
    #[must_use]
    pub fn available_actions(&self) -> Vec<BookingAction> {
        available_actions(self.status)
    }

    /// Whether an invoice may be generated for this booking now.
    #[must_use]
    pub const fn is_invoice_eligible(&self) -> bool {
        matches!(self.status, BookingStatus::Completed) && self.invoice.is_none()
    }
}

/// Input for a new booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub vehicle_id: VehicleId,
    pub service_id: ServiceId,
    pub preferred_date: NaiveDate,
}

impl NewBooking {
    /// Check creation preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Validation`] if the preferred date is in the
    /// past.
    pub fn validate(&self, today: NaiveDate) -> Result<(), TransitionError> {
        if self.preferred_date < today {
            return Err(TransitionError::field(
                "preferred_date",
                "Preferred date cannot be in the past.",
            ));
        }
        Ok(())
    }
}

fn check_not_past(date: NaiveDate, today: NaiveDate) -> Result<(), TransitionError> {
    if date < today {
        return Err(TransitionError::field(
            "scheduled_date",
            "Scheduled date cannot be in the past.",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(1),
            customer: CustomerId::new(1),
            vehicle: VehicleId::new(1),
            service: ServiceId::new(1),
            status,
            preferred_date: Some(today()),
            scheduled_date: None,
            created_at: Utc::now(),
            invoice: None,
        }
    }

    #[test]
    fn test_approve_only_from_pending() {
        for status in BookingStatus::ALL {
            let result = BookingAction::Approve.check(status);
            if status == BookingStatus::Pending {
                assert_eq!(result, Ok(BookingStatus::Approved));
            } else {
                assert_eq!(
                    result,
                    Err(TransitionError::InvalidTransition {
                        action: BookingAction::Approve,
                        from: status,
                    })
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_no_status_change() {
        for status in [BookingStatus::Rejected, BookingStatus::Cancelled] {
            assert!(available_actions(status).is_empty());
        }
        // Completed only offers invoicing, which keeps the status
        assert_eq!(
            available_actions(BookingStatus::Completed),
            vec![BookingAction::GenerateInvoice]
        );
    }

    #[test]
    fn test_status_never_regresses() {
        // Walk every reachable (status, action) pair and verify the target is
        // never earlier on the success path, and terminal states stay put.
        for from in BookingStatus::ALL {
            for action in BookingAction::ALL {
                let Ok(to) = action.check(from) else { continue };
                if from.is_terminal() {
                    assert_eq!(to, from, "{action} moved terminal {from} to {to}");
                }
                if let (Some(a), Some(b)) = (from.progress_rank(), to.progress_rank()) {
                    assert!(b >= a, "{action} regressed {from} to {to}");
                }
            }
        }
    }

    #[test]
    fn test_available_actions_per_status() {
        use BookingAction::*;
        assert_eq!(
            available_actions(BookingStatus::Pending),
            vec![Approve, Reject, Reschedule]
        );
        assert_eq!(
            available_actions(BookingStatus::Approved),
            vec![Start, Cancel, Reschedule]
        );
        assert_eq!(
            available_actions(BookingStatus::InProgress),
            vec![Complete, Reschedule]
        );
    }

    #[test]
    fn test_full_lifecycle() {
        let tomorrow = today().checked_add_days(Days::new(1)).unwrap();
        let mut b = booking(BookingStatus::Pending);

        b.apply(&Transition::Approve { scheduled_date: tomorrow }, today())
            .unwrap();
        assert_eq!(b.status, BookingStatus::Approved);
        assert_eq!(b.scheduled_date, Some(tomorrow));

        b.apply(&Transition::Start, today()).unwrap();
        assert_eq!(b.status, BookingStatus::InProgress);

        b.apply(&Transition::Complete, today()).unwrap();
        assert_eq!(b.status, BookingStatus::Completed);
        assert!(b.is_invoice_eligible());
        assert_eq!(b.scheduled_date, Some(tomorrow));
    }

    #[test]
    fn test_approve_rejects_past_date() {
        let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
        let mut b = booking(BookingStatus::Pending);
        let err = b
            .apply(&Transition::Approve { scheduled_date: yesterday }, today())
            .unwrap_err();
        assert!(matches!(err, TransitionError::Validation(ref f) if f.field == "scheduled_date"));
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.scheduled_date, None);
    }

    #[test]
    fn test_approve_today_is_allowed() {
        let mut b = booking(BookingStatus::Pending);
        b.apply(&Transition::Approve { scheduled_date: today() }, today())
            .unwrap();
        assert_eq!(b.status, BookingStatus::Approved);
    }

    #[test]
    fn test_reschedule_keeps_status() {
        let later = today().checked_add_days(Days::new(5)).unwrap();
        let mut b = booking(BookingStatus::InProgress);
        b.scheduled_date = Some(today());
        b.apply(&Transition::Reschedule { new_date: later }, today())
            .unwrap();
        assert_eq!(b.status, BookingStatus::InProgress);
        assert_eq!(b.scheduled_date, Some(later));

        let mut done = booking(BookingStatus::Completed);
        assert!(matches!(
            done.apply(&Transition::Reschedule { new_date: later }, today()),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_clears_schedule() {
        let mut b = booking(BookingStatus::Approved);
        b.scheduled_date = Some(today());
        b.apply(&Transition::Cancel, today()).unwrap();
        assert_eq!(b.status, BookingStatus::Cancelled);
        assert_eq!(b.scheduled_date, None);
    }

    #[test]
    fn test_invalid_transition_leaves_booking_untouched() {
        let mut b = booking(BookingStatus::Completed);
        let before = b.clone();
        assert!(b.apply(&Transition::Start, today()).is_err());
        assert_eq!(b, before);
    }

    #[test]
    fn test_invoice_eligibility() {
        let mut b = booking(BookingStatus::Completed);
        assert!(b.is_invoice_eligible());
        b.invoice = Some(InvoiceId::new(3));
        assert!(!b.is_invoice_eligible());
        assert!(!booking(BookingStatus::InProgress).is_invoice_eligible());
    }

    #[test]
    fn test_new_booking_rejects_past_preferred_date() {
        let new = NewBooking {
            vehicle_id: VehicleId::new(1),
            service_id: ServiceId::new(2),
            preferred_date: today().checked_sub_days(Days::new(2)).unwrap(),
        };
        assert!(new.validate(today()).is_err());
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(BookingAction::Approve.endpoint(), Some("approve"));
        assert_eq!(BookingAction::Reschedule.endpoint(), None);
    }
}
