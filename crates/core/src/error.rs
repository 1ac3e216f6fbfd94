//! Rule violations raised by the booking and invoice workflows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::booking::BookingAction;
use crate::types::BookingStatus;

/// A validation failure attached to a single input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as the backend spells it (e.g. `scheduled_date`).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors produced when a workflow rule rejects an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The action is not valid from the booking's current status.
    #[error("cannot {action} a booking that is {}", .from.label().to_lowercase())]
    InvalidTransition {
        action: BookingAction,
        from: BookingStatus,
    },

    /// A paid invoice cannot go back to pending.
    #[error("a paid invoice cannot be marked as pending again")]
    PaymentReversal,

    /// A precondition on an input field failed.
    #[error("{0}")]
    Validation(FieldError),
}

impl TransitionError {
    pub(crate) const fn invalid(action: BookingAction, from: BookingStatus) -> Self {
        Self::InvalidTransition { action, from }
    }

    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldError::new(field, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = TransitionError::invalid(BookingAction::Approve, BookingStatus::InProgress);
        assert_eq!(err.to_string(), "cannot approve a booking that is in progress");
    }

    #[test]
    fn test_validation_display() {
        let err = TransitionError::field("scheduled_date", "must not be in the past");
        assert_eq!(err.to_string(), "scheduled_date: must not be in the past");
    }
}
