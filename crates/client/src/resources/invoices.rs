//! Invoice repository.

use chrono::NaiveDate;
use garage_core::{BookingId, Invoice, InvoiceDraft, InvoiceId, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{BookingRecord, Nested, Resource};
use crate::api::ApiClient;
use crate::error::ClientError;

/// An invoice together with its booking, when the backend nests it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "InvoiceWire")]
pub struct InvoiceRecord {
    pub invoice: Invoice,
    pub booking: Option<BookingRecord>,
}

impl InvoiceRecord {
    #[must_use]
    pub const fn id(&self) -> InvoiceId {
        self.invoice.id
    }

    #[must_use]
    pub const fn booking_id(&self) -> BookingId {
        self.invoice.booking
    }

    /// Price of the invoiced service, when the booking and its service are
    /// nested in the response.
    #[must_use]
    pub fn service_price(&self) -> Option<Decimal> {
        self.booking
            .as_ref()
            .and_then(|b| b.service.as_ref())
            .map(|s| s.price)
    }
}

impl Resource for InvoiceRecord {
    type Id = InvoiceId;

    fn id(&self) -> InvoiceId {
        self.invoice.id
    }
}

#[derive(Deserialize)]
struct InvoiceWire {
    id: InvoiceId,
    booking: Nested<BookingRecord>,
    #[serde(default, alias = "additional_charges")]
    additional_charge: Decimal,
    #[serde(default, alias = "additional_charges_description")]
    additional_charge_description: Option<String>,
    total_amount: Decimal,
    #[serde(default)]
    payment_status: PaymentStatus,
    invoice_date: NaiveDate,
}

impl From<InvoiceWire> for InvoiceRecord {
    fn from(wire: InvoiceWire) -> Self {
        Self {
            invoice: Invoice {
                id: wire.id,
                booking: wire.booking.id(),
                additional_charge: wire.additional_charge,
                additional_charge_description: wire.additional_charge_description.unwrap_or_default(),
                total_amount: wire.total_amount,
                payment_status: wire.payment_status,
                invoice_date: wire.invoice_date,
            },
            booking: wire.booking.into_object(),
        }
    }
}

/// Body for a payment status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
}

#[derive(Serialize)]
struct ChargesUpdate<'a> {
    additional_charge: Decimal,
    additional_charge_description: &'a str,
    total_amount: Decimal,
}

impl ApiClient {
    /// List all invoices.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, ClientError> {
        self.get("/invoices/").await
    }

    /// Get an invoice by ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the invoice does not exist.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceRecord, ClientError> {
        self.get(&format!("/invoices/{id}/")).await
    }

    /// Find the invoice already issued for a booking, if any.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the invoice list cannot be loaded.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn find_invoice_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<InvoiceRecord>, ClientError> {
        let invoices = self.list_invoices().await?;
        Ok(invoices.into_iter().find(|i| i.booking_id() == booking_id))
    }

    /// Create an invoice from a draft.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the backend refuses the invoice.
    #[instrument(skip(self, draft), fields(booking_id = %draft.booking_id))]
    pub async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<InvoiceRecord, ClientError> {
        let record: InvoiceRecord = self.post("/invoices/", draft).await?;
        if record.invoice.total_amount != draft.total_amount {
            tracing::warn!(
                expected = %draft.total_amount,
                actual = %record.invoice.total_amount,
                "Backend computed a different invoice total"
            );
        }
        tracing::info!(invoice_id = %record.id(), "Created invoice");
        Ok(record)
    }

    /// Set an invoice's payment status.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the backend refuses the change.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn update_payment_status(
        &self,
        id: InvoiceId,
        payment_status: PaymentStatus,
    ) -> Result<InvoiceRecord, ClientError> {
        self.patch(&format!("/invoices/{id}/"), &PaymentUpdate { payment_status })
            .await
    }

    /// Replace an invoice's additional charge and send the recomputed total.
    ///
    /// The total is rebuilt from the booked service's price, never from the
    /// stored total. The payment status is left as it is.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the service price cannot be resolved or the
    /// request fails.
    #[instrument(skip(self, record, description), fields(invoice_id = %record.id()))]
    pub async fn update_invoice_charges(
        &self,
        record: &InvoiceRecord,
        additional_charge: Decimal,
        description: &str,
    ) -> Result<InvoiceRecord, ClientError> {
        let service_price = self.invoiced_service_price(record).await?;
        let mut updated = record.invoice.clone();
        updated.update_charges(service_price, additional_charge, description.trim());
        let body = ChargesUpdate {
            additional_charge: updated.additional_charge,
            additional_charge_description: &updated.additional_charge_description,
            total_amount: updated.total_amount,
        };
        self.patch(&format!("/invoices/{}/", record.id()), &body)
            .await
    }

    /// Price of the service behind an invoice, from the nested booking when
    /// present, otherwise fetched.
    async fn invoiced_service_price(&self, record: &InvoiceRecord) -> Result<Decimal, ClientError> {
        if let Some(price) = record.service_price() {
            return Ok(price);
        }
        let booking = match &record.booking {
            Some(booking) => booking.clone(),
            None => self.get_booking(record.booking_id()).await?,
        };
        match booking.service {
            Some(service) => Ok(service.price),
            None => Ok(self.get_service(booking.booking.service).await?.price),
        }
    }

    /// Download the invoice as a PDF.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn download_invoice_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, ClientError> {
        let bytes = self
            .get_bytes(&format!("/invoices/{id}/download_pdf/"))
            .await?;
        tracing::debug!(size = bytes.len(), "Downloaded invoice PDF");
        Ok(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_with_nested_booking() {
        let json = r#"{
            "id": 7,
            "booking": {
                "id": 11, "customer": 2, "service": {"id": 3, "service_name": "Oil", "price": "1000.00"},
                "vehicle": 4, "status": "COMPLETED", "preferred_date": "2026-03-05",
                "scheduled_date": "2026-03-06", "created_at": "2026-03-01T10:00:00Z"
            },
            "total_amount": "1500.00",
            "payment_status": "PENDING",
            "invoice_date": "2026-03-07"
        }"#;
        let record: InvoiceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.booking_id(), BookingId::new(11));
        assert_eq!(record.invoice.additional_charge, Decimal::ZERO);
        assert_eq!(record.service_price(), Some(Decimal::new(100_000, 2)));
        assert_eq!(record.invoice.additional_charge_description, "");
        assert_eq!(
            record.booking.unwrap().service.unwrap().price,
            Decimal::new(100_000, 2)
        );
    }

    #[test]
    fn test_invoice_with_flat_booking_and_plural_fields() {
        let json = r#"{
            "id": 8, "booking": 12,
            "additional_charges": "500.00",
            "additional_charges_description": "parts",
            "total_amount": "1500.00",
            "payment_status": "PAID",
            "invoice_date": "2026-03-07"
        }"#;
        let record: InvoiceRecord = serde_json::from_str(json).unwrap();
        assert!(record.invoice.is_paid());
        assert_eq!(record.invoice.additional_charge_description, "parts");
        assert!(record.booking.is_none());
        assert_eq!(record.service_price(), None);
    }

    #[test]
    fn test_payment_update_body() {
        let body = PaymentUpdate {
            payment_status: PaymentStatus::Paid,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({"payment_status": "PAID"})
        );
    }
}
