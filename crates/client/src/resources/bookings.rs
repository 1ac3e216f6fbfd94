//! Booking repository: CRUD plus the lifecycle action endpoints.
//!
//! These methods issue requests as asked. Gating, state checks and cache
//! refreshes are the [`BookingDesk`](crate::BookingDesk)'s job.

use chrono::{DateTime, NaiveDate, Utc};
use garage_core::{
    Booking, BookingId, BookingStatus, InvoiceId, NewBooking, ServiceId, Transition, VehicleId,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Customer, Nested, Resource, Service, Vehicle};
use crate::api::ApiClient;
use crate::error::ClientError;

/// A booking together with whatever related records the backend nested in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BookingWire")]
pub struct BookingRecord {
    pub booking: Booking,
    pub customer: Option<Customer>,
    pub vehicle: Option<Vehicle>,
    pub service: Option<Service>,
    /// Day the request was made.
    pub booking_date: Option<NaiveDate>,
}

impl BookingRecord {
    #[must_use]
    pub const fn id(&self) -> BookingId {
        self.booking.id
    }

    #[must_use]
    pub const fn status(&self) -> BookingStatus {
        self.booking.status
    }

    #[must_use]
    pub fn customer_name(&self) -> String {
        self.customer.as_ref().map_or_else(
            || format!("Customer #{}", self.booking.customer),
            Customer::display_name,
        )
    }

    #[must_use]
    pub fn vehicle_label(&self) -> String {
        self.vehicle.as_ref().map_or_else(
            || format!("Vehicle #{}", self.booking.vehicle),
            Vehicle::label,
        )
    }

    #[must_use]
    pub fn service_name(&self) -> String {
        self.service.as_ref().map_or_else(
            || format!("Service #{}", self.booking.service),
            |s| s.service_name.clone(),
        )
    }
}

impl Resource for BookingRecord {
    type Id = BookingId;

    fn id(&self) -> BookingId {
        self.booking.id
    }
}

/// Booking as the backend serializes it.
#[derive(Deserialize)]
struct BookingWire {
    id: BookingId,
    customer: Nested<Customer>,
    vehicle: Nested<Vehicle>,
    service: Nested<Service>,
    #[serde(default)]
    status: BookingStatus,
    #[serde(default)]
    booking_date: Option<NaiveDate>,
    #[serde(default)]
    preferred_date: Option<NaiveDate>,
    #[serde(default)]
    scheduled_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    invoice: Option<InvoiceRef>,
}

/// The backend may send the invoice as an id or as a small object.
#[derive(Deserialize)]
#[serde(untagged)]
enum InvoiceRef {
    Id(InvoiceId),
    Object { id: InvoiceId },
}

impl From<BookingWire> for BookingRecord {
    fn from(wire: BookingWire) -> Self {
        let booking = Booking {
            id: wire.id,
            customer: wire.customer.id(),
            vehicle: wire.vehicle.id(),
            service: wire.service.id(),
            status: wire.status,
            preferred_date: wire.preferred_date,
            scheduled_date: wire.scheduled_date,
            created_at: wire.created_at,
            invoice: wire.invoice.map(|r| match r {
                InvoiceRef::Id(id) | InvoiceRef::Object { id } => id,
            }),
        };
        Self {
            booking,
            customer: wire.customer.into_object(),
            vehicle: wire.vehicle.into_object(),
            service: wire.service.into_object(),
            booking_date: wire.booking_date,
        }
    }
}

/// Partial booking update.
///
/// The preferred date is fixed at creation, so only the schedule is editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct ApproveBody {
    scheduled_date: NaiveDate,
}

#[derive(Serialize)]
struct CreateBody {
    vehicle_id: VehicleId,
    service_id: ServiceId,
    preferred_date: NaiveDate,
}

impl ApiClient {
    /// List bookings visible to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_bookings(&self) -> Result<Vec<BookingRecord>, ClientError> {
        self.get("/bookings/").await
    }

    /// Get a booking by ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the booking does not exist.
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn get_booking(&self, id: BookingId) -> Result<BookingRecord, ClientError> {
        self.get(&format!("/bookings/{id}/")).await
    }

    /// Request a new booking. The backend assigns the customer and starts it
    /// as `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the backend refuses the request.
    #[instrument(skip(self, new), fields(vehicle_id = %new.vehicle_id, service_id = %new.service_id))]
    pub async fn create_booking(&self, new: &NewBooking) -> Result<BookingRecord, ClientError> {
        let body = CreateBody {
            vehicle_id: new.vehicle_id,
            service_id: new.service_id,
            preferred_date: new.preferred_date,
        };
        let record: BookingRecord = self.post("/bookings/", &body).await?;
        tracing::info!(booking_id = %record.id(), "Created booking");
        Ok(record)
    }

    /// Issue a lifecycle transition.
    ///
    /// Approve posts the scheduled date, reschedule patches it, and the rest
    /// post to their bodiless action endpoints.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidTransition` if the backend refuses the
    /// status change.
    #[instrument(skip(self), fields(booking_id = %id, action = %transition.action()))]
    pub async fn transition_booking(
        &self,
        id: BookingId,
        transition: &Transition,
    ) -> Result<(), ClientError> {
        match transition {
            Transition::Approve { scheduled_date } => {
                self.post_action_with(
                    &format!("/bookings/{id}/approve/"),
                    &ApproveBody {
                        scheduled_date: *scheduled_date,
                    },
                )
                .await?;
            }
            Transition::Reschedule { new_date } => {
                let patch = BookingPatch {
                    scheduled_date: Some(*new_date),
                };
                self.update_booking(id, &patch).await?;
            }
            Transition::Reject | Transition::Start | Transition::Complete | Transition::Cancel => {
                let endpoint = transition.action().endpoint().unwrap_or_default();
                self.post_action(&format!("/bookings/{id}/{endpoint}/"))
                    .await?;
            }
        }
        tracing::info!("Booking transition accepted");
        Ok(())
    }

    /// Patch booking fields.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the backend refuses the update.
    #[instrument(skip(self, patch), fields(booking_id = %id))]
    pub async fn update_booking(
        &self,
        id: BookingId,
        patch: &BookingPatch,
    ) -> Result<BookingRecord, ClientError> {
        self.patch(&format!("/bookings/{id}/"), patch).await
    }

    /// Delete a booking.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn delete_booking(&self, id: BookingId) -> Result<(), ClientError> {
        self.delete(&format!("/bookings/{id}/")).await?;
        tracing::info!("Deleted booking");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use garage_core::CustomerId;
    use rust_decimal::Decimal;

    #[test]
    fn test_nested_booking_deserializes() {
        let json = r#"{
            "id": 11,
            "customer": {"id": 2, "user": {"id": 9, "username": "jo", "first_name": "Jo", "last_name": "B"}},
            "service": {"id": 3, "service_name": "Oil change", "price": "1200.00"},
            "vehicle": {"id": 4, "vehicle_number": "KA01", "vehicle_type": "Hatchback"},
            "booking_date": "2026-03-01",
            "preferred_date": "2026-03-05",
            "scheduled_date": null,
            "status": "PENDING",
            "created_at": "2026-03-01T10:00:00Z"
        }"#;
        let record: BookingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id(), BookingId::new(11));
        assert_eq!(record.booking.customer, CustomerId::new(2));
        assert_eq!(record.booking.service, ServiceId::new(3));
        assert_eq!(record.status(), BookingStatus::Pending);
        assert_eq!(record.service.as_ref().unwrap().price, Decimal::new(120_000, 2));
        assert_eq!(record.customer_name(), "Jo B");
        assert_eq!(record.vehicle_label(), "KA01 (Hatchback)");
        assert!(record.booking.invoice.is_none());
    }

    #[test]
    fn test_flat_booking_with_invoice_ref() {
        let json = r#"{
            "id": 12, "customer": 2, "service": 3, "vehicle": 4,
            "preferred_date": "2026-03-05", "scheduled_date": "2026-03-06",
            "status": "COMPLETED", "created_at": "2026-03-01T10:00:00Z",
            "invoice": {"id": 30}
        }"#;
        let record: BookingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.booking.invoice, Some(InvoiceId::new(30)));
        assert!(record.service.is_none());
        assert_eq!(record.service_name(), "Service #3");
    }

    #[test]
    fn test_booking_patch_omits_unset_fields() {
        assert_eq!(
            serde_json::to_value(BookingPatch::default()).unwrap(),
            serde_json::json!({})
        );
        let patch = BookingPatch {
            scheduled_date: NaiveDate::from_ymd_opt(2026, 4, 1),
        };
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            serde_json::json!({"scheduled_date": "2026-04-01"})
        );
    }
}
