//! The booking desk: the single entry point for booking and invoice actions.
//!
//! Every action runs the same pipeline:
//!
//! 1. Evaluate the authorization gate against the session as it is *now*.
//! 2. Claim the booking's busy flag; a second action on the same booking
//!    while one is in flight fails instead of queueing.
//! 3. Check the action against the mirrored state machine using the cached
//!    booking.
//! 4. Issue the request.
//! 5. Invalidate and re-fetch the booking cache.
//!
//! Failures come back as [`DeskError`] values with a user-facing
//! [`DeskError::notice`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDate};
use garage_core::{
    AccessDecision, BookingAction, BookingId, InvoiceId, InvoicePlan, NewBooking, PaymentStatus,
    Principal, Role, Route, Transition, TransitionError, can_access, plan_invoice,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::api::ApiClient;
use crate::cache::BookingCache;
use crate::error::{AuthError, ClientError};
use crate::resources::{BookingRecord, InvoiceRecord};

/// Errors returned by desk actions.
#[derive(Debug, Error)]
pub enum DeskError {
    /// The gate refused the action; the caller should go to the route.
    #[error("access denied, redirecting to {0}")]
    Denied(Route),

    /// Another action on this booking has not finished yet.
    #[error("booking #{0} already has an action in progress")]
    Busy(BookingId),

    /// A workflow rule rejected the action before it was sent.
    #[error(transparent)]
    Rule(#[from] TransitionError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DeskError {
    /// One-line message suitable for showing to the user.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Denied(Route::Login) => "Please sign in to continue.".to_string(),
            Self::Denied(_) => "You do not have access to that page.".to_string(),
            Self::Busy(_) => "Please wait for the current action to finish.".to_string(),
            Self::Rule(TransitionError::Validation(field)) => field.message.clone(),
            Self::Rule(e) => capitalize(&e.to_string()),
            Self::Client(e) => e.notice(),
        }
    }

    /// Where the caller should navigate, if the error implies a redirect.
    #[must_use]
    pub const fn redirect(&self) -> Option<Route> {
        match self {
            Self::Denied(route) => Some(*route),
            Self::Client(ClientError::Auth(
                AuthError::SessionExpired | AuthError::NotAuthenticated,
            )) => Some(Route::Login),
            _ => None,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Result of asking for a booking's invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceOutcome {
    /// A new invoice was issued.
    Created(Box<InvoiceRecord>),
    /// The booking was already invoiced; open this one instead.
    Existing(InvoiceId),
}

impl InvoiceOutcome {
    #[must_use]
    pub const fn invoice_id(&self) -> InvoiceId {
        match self {
            Self::Created(record) => record.invoice.id,
            Self::Existing(id) => *id,
        }
    }
}

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Action boundary over the booking and invoice repositories.
///
/// Cheap to clone; clones share the cache and the busy set.
#[derive(Clone)]
pub struct BookingDesk {
    api: ApiClient,
    cache: BookingCache,
    busy: Arc<Mutex<HashSet<BookingId>>>,
    today: Today,
}

impl BookingDesk {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = BookingCache::new(api.clone());
        Self {
            api,
            cache,
            busy: Arc::new(Mutex::new(HashSet::new())),
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the source of "today" used by date preconditions.
    #[must_use]
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn cache(&self) -> &BookingCache {
        &self.cache
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    // =========================================================================
    // Gate
    // =========================================================================

    /// Evaluate the gate for `role` against the current session.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` with the redirect target.
    pub fn require(&self, role: Role) -> Result<Principal, DeskError> {
        let principal = self.api.session().principal();
        match can_access(role, principal.as_ref()) {
            AccessDecision::Allow => principal.ok_or(DeskError::Denied(Route::Login)),
            AccessDecision::RedirectTo(route) => {
                tracing::debug!(required = %role, %route, "Access denied");
                Err(DeskError::Denied(route))
            }
        }
    }

    /// Require any signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied(Route::Login)` without a session.
    pub fn require_session(&self) -> Result<Principal, DeskError> {
        self.api
            .session()
            .principal()
            .ok_or(DeskError::Denied(Route::Login))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Bookings visible to the current user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` without a session, or the load error.
    pub async fn bookings(&self) -> Result<Vec<BookingRecord>, DeskError> {
        self.require_session()?;
        Ok(self.cache.list().await?)
    }

    /// A single booking.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` without a session, or `NotFound`.
    pub async fn booking(&self, id: BookingId) -> Result<BookingRecord, DeskError> {
        self.require_session()?;
        Ok(self.cache.get(id).await?)
    }

    /// Discard cached bookings and load them again.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` without a session, or the load error.
    pub async fn refresh(&self) -> Result<Vec<BookingRecord>, DeskError> {
        self.require_session()?;
        Ok(self.cache.refresh().await?)
    }

    // =========================================================================
    // Booking actions
    // =========================================================================

    /// Request a new booking as the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as a customer,
    /// `DeskError::Rule` for a preferred date in the past, or the backend
    /// error.
    #[instrument(skip(self, new))]
    pub async fn create_booking(&self, new: &NewBooking) -> Result<BookingRecord, DeskError> {
        self.require(Role::Customer)?;
        new.validate(self.today())?;

        let record = self.api.create_booking(new).await?;
        self.refresh_after_mutation().await;
        Ok(record)
    }

    /// Apply a lifecycle transition to a booking.
    ///
    /// Returns the booking as the backend reports it afterwards. If it cannot
    /// be read back, the cached record with the transition applied is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin,
    /// `DeskError::Busy` if the booking has an action in flight,
    /// `DeskError::Rule` if the transition is not valid from the cached
    /// status or its date is in the past, or the backend error.
    #[instrument(skip(self), fields(booking_id = %id, action = %transition.action()))]
    pub async fn transition(
        &self,
        id: BookingId,
        transition: Transition,
    ) -> Result<BookingRecord, DeskError> {
        self.require(Role::Admin)?;
        let _guard = self.claim(id)?;

        let mut record = self.cache.get(id).await?;
        let today = self.today();
        record.booking.validate(&transition, today)?;

        if let Err(e) = self.api.transition_booking(id, &transition).await {
            if matches!(e, ClientError::InvalidTransition(_)) {
                // Someone else moved the booking; show its real status next time
                self.refresh_after_mutation().await;
            }
            return Err(e.into());
        }

        // The backend has accepted the change; a failed reload must not report it as failed
        let reloaded = match self.cache.refresh().await {
            Ok(records) => records.into_iter().find(|r| r.id() == id),
            Err(e) => {
                tracing::warn!(error = %e, booking = %id, "Could not reload bookings after update");
                self.api.get_booking(id).await.ok()
            }
        };
        if let Some(reloaded) = reloaded {
            return Ok(reloaded);
        }
        record.booking.apply(&transition, today)?;
        Ok(record)
    }

    /// Approve a pending booking for `scheduled_date`.
    ///
    /// # Errors
    ///
    /// See [`BookingDesk::transition`].
    pub async fn approve(
        &self,
        id: BookingId,
        scheduled_date: NaiveDate,
    ) -> Result<BookingRecord, DeskError> {
        self.transition(id, Transition::Approve { scheduled_date })
            .await
    }

    /// Reject a pending booking.
    ///
    /// # Errors
    ///
    /// See [`BookingDesk::transition`].
    pub async fn reject(&self, id: BookingId) -> Result<BookingRecord, DeskError> {
        self.transition(id, Transition::Reject).await
    }

    /// Start work on an approved booking.
    ///
    /// # Errors
    ///
    /// See [`BookingDesk::transition`].
    pub async fn start(&self, id: BookingId) -> Result<BookingRecord, DeskError> {
        self.transition(id, Transition::Start).await
    }

    /// Mark an in-progress booking as completed.
    ///
    /// # Errors
    ///
    /// See [`BookingDesk::transition`].
    pub async fn complete(&self, id: BookingId) -> Result<BookingRecord, DeskError> {
        self.transition(id, Transition::Complete).await
    }

    /// Cancel an approved booking.
    ///
    /// # Errors
    ///
    /// See [`BookingDesk::transition`].
    pub async fn cancel(&self, id: BookingId) -> Result<BookingRecord, DeskError> {
        self.transition(id, Transition::Cancel).await
    }

    /// Move a booking to `new_date` without changing its status.
    ///
    /// # Errors
    ///
    /// See [`BookingDesk::transition`].
    pub async fn reschedule(
        &self,
        id: BookingId,
        new_date: NaiveDate,
    ) -> Result<BookingRecord, DeskError> {
        self.transition(id, Transition::Reschedule { new_date })
            .await
    }

    /// Delete a booking.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin,
    /// `DeskError::Busy` if the booking has an action in flight, or the
    /// backend error.
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn delete_booking(&self, id: BookingId) -> Result<(), DeskError> {
        self.require(Role::Admin)?;
        let _guard = self.claim(id)?;

        self.api.delete_booking(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Invoice a completed booking.
    ///
    /// If the booking already has an invoice, resolves to that invoice
    /// instead of creating a second one.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin,
    /// `DeskError::Busy` if the booking has an action in flight,
    /// `DeskError::Rule` unless the booking is `COMPLETED`, or the backend
    /// error.
    #[instrument(skip(self, description), fields(booking_id = %id))]
    pub async fn generate_invoice(
        &self,
        id: BookingId,
        additional_charge: Decimal,
        description: &str,
    ) -> Result<InvoiceOutcome, DeskError> {
        self.require(Role::Admin)?;
        let _guard = self.claim(id)?;

        let record = self.cache.get(id).await?;
        BookingAction::GenerateInvoice.check(record.status())?;

        let existing = match record.booking.invoice {
            Some(invoice) => Some(invoice),
            None => self
                .api
                .find_invoice_for_booking(id)
                .await?
                .map(|i| i.id()),
        };

        let service_price = match &record.service {
            Some(service) => service.price,
            None => self.api.get_service(record.booking.service).await?.price,
        };

        let draft = match plan_invoice(
            &record.booking,
            existing,
            service_price,
            additional_charge,
            description,
        )? {
            InvoicePlan::Existing(invoice_id) => {
                tracing::info!(invoice_id = %invoice_id, "Booking already invoiced");
                return Ok(InvoiceOutcome::Existing(invoice_id));
            }
            InvoicePlan::Create(draft) => draft,
        };

        let created = match self.api.create_invoice(&draft).await {
            Ok(created) => created,
            Err(e) => {
                // A concurrent request may have issued the invoice first
                if let Ok(Some(existing)) = self.api.find_invoice_for_booking(id).await {
                    tracing::info!(invoice_id = %existing.id(), "Invoice issued concurrently");
                    return Ok(InvoiceOutcome::Existing(existing.id()));
                }
                return Err(e.into());
            }
        };

        self.refresh_after_mutation().await;
        Ok(InvoiceOutcome::Created(Box::new(created)))
    }

    /// All invoices.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin, or the
    /// backend error.
    pub async fn invoices(&self) -> Result<Vec<InvoiceRecord>, DeskError> {
        self.require(Role::Admin)?;
        Ok(self.api.list_invoices().await?)
    }

    /// Mark an invoice as paid. Marking a paid invoice again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin, or the
    /// backend error.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn mark_paid(&self, id: InvoiceId) -> Result<InvoiceRecord, DeskError> {
        self.set_payment_status(id, PaymentStatus::Paid).await
    }

    /// Move an invoice's payment status.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin,
    /// `DeskError::Rule` when asked to move a paid invoice back to pending,
    /// or the backend error.
    pub async fn set_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
    ) -> Result<InvoiceRecord, DeskError> {
        self.require(Role::Admin)?;
        let mut record = self.api.get_invoice(id).await?;
        if !record.invoice.set_payment_status(status)? {
            tracing::debug!(%status, "Invoice already has this payment status");
            return Ok(record);
        }
        let updated = self.api.update_payment_status(id, status).await?;
        tracing::info!(%status, "Invoice payment status updated");
        Ok(updated)
    }

    /// Replace an invoice's additional charge; the total is recomputed and
    /// the payment status is left alone.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin, or the
    /// backend error.
    #[instrument(skip(self, description), fields(invoice_id = %id))]
    pub async fn update_invoice_charges(
        &self,
        id: InvoiceId,
        additional_charge: Decimal,
        description: &str,
    ) -> Result<InvoiceRecord, DeskError> {
        self.require(Role::Admin)?;
        let record = self.api.get_invoice(id).await?;
        Ok(self
            .api
            .update_invoice_charges(&record, additional_charge, description)
            .await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn claim(&self, id: BookingId) -> Result<BusyGuard, DeskError> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(id) {
            tracing::debug!(booking_id = %id, "Booking busy");
            return Err(DeskError::Busy(id));
        }
        Ok(BusyGuard {
            busy: Arc::clone(&self.busy),
            id,
        })
    }

    /// Whether an action on `id` is in flight.
    #[must_use]
    pub fn is_busy(&self, id: BookingId) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// Re-fetch after a mutation that already succeeded. A failed reload
    /// leaves the cache empty so the next read retries.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.cache.refresh().await {
            tracing::warn!(error = %e, "Could not reload bookings after update");
        }
    }
}

impl std::fmt::Debug for BookingDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingDesk")
            .field("api", &self.api)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Clears a booking's busy flag when dropped.
struct BusyGuard {
    busy: Arc<Mutex<HashSet<BookingId>>>,
    id: BookingId,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
