//! Dashboard summaries for admins and customers.
//!
//! Each source is fetched independently. A source that fails is logged and
//! counted as empty so one broken endpoint does not blank the whole
//! dashboard. Authentication failures are the exception: they end the
//! session, so they are returned instead.

use std::fmt;

use garage_core::{BookingStatus, Role};
use rust_decimal::Decimal;

use crate::desk::{BookingDesk, DeskError};
use crate::error::ClientError;
use crate::resources::BookingRecord;

/// Number of bookings in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub rejected: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a BookingRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            *counts.slot(record.status()) += 1;
        }
        counts
    }

    #[must_use]
    pub const fn get(&self, status: BookingStatus) -> usize {
        match status {
            BookingStatus::Pending => self.pending,
            BookingStatus::Approved => self.approved,
            BookingStatus::InProgress => self.in_progress,
            BookingStatus::Completed => self.completed,
            BookingStatus::Rejected => self.rejected,
            BookingStatus::Cancelled => self.cancelled,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending
            + self.approved
            + self.in_progress
            + self.completed
            + self.rejected
            + self.cancelled
    }

    fn slot(&mut self, status: BookingStatus) -> &mut usize {
        match status {
            BookingStatus::Pending => &mut self.pending,
            BookingStatus::Approved => &mut self.approved,
            BookingStatus::InProgress => &mut self.in_progress,
            BookingStatus::Completed => &mut self.completed,
            BookingStatus::Rejected => &mut self.rejected,
            BookingStatus::Cancelled => &mut self.cancelled,
        }
    }
}

/// Admin overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDashboard {
    pub bookings: StatusCounts,
    pub total_bookings: usize,
    pub total_services: usize,
    pub total_customers: usize,
    /// Sources that could not be loaded and were counted as empty.
    pub unavailable: Vec<&'static str>,
}

impl AdminDashboard {
    /// Share of bookings that are completed, as a percentage with one
    /// decimal place. Zero when there are no bookings.
    #[must_use]
    pub fn completion_rate(&self) -> Decimal {
        if self.total_bookings == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.bookings.completed) * Decimal::ONE_HUNDRED
            / Decimal::from(self.total_bookings))
        .round_dp(1)
    }
}

impl fmt::Display for AdminDashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total bookings:  {}", self.total_bookings)?;
        for status in BookingStatus::ALL {
            writeln!(f, "  {:<12} {}", status.label(), self.bookings.get(status))?;
        }
        writeln!(f, "Services:        {}", self.total_services)?;
        writeln!(f, "Customers:       {}", self.total_customers)?;
        write!(f, "Completion rate: {}%", self.completion_rate())
    }
}

/// Customer overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDashboard {
    pub vehicles: usize,
    pub bookings: StatusCounts,
    pub unpaid_invoices: usize,
    /// Next scheduled visit: the earliest approved or in-progress booking
    /// with a scheduled date.
    pub upcoming: Option<BookingRecord>,
    /// Sources that could not be loaded and were counted as empty.
    pub unavailable: Vec<&'static str>,
}

impl fmt::Display for CustomerDashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vehicles:        {}", self.vehicles)?;
        writeln!(f, "Bookings:        {}", self.bookings.total())?;
        for status in BookingStatus::ALL {
            let count = self.bookings.get(status);
            if count > 0 {
                writeln!(f, "  {:<12} {count}", status.label())?;
            }
        }
        writeln!(f, "Unpaid invoices: {}", self.unpaid_invoices)?;
        match &self.upcoming {
            Some(record) => write!(
                f,
                "Next visit:      {} on {} ({})",
                record.service_name(),
                record
                    .booking
                    .scheduled_date
                    .map_or_else(String::new, |d| d.to_string()),
                record.vehicle_label()
            ),
            None => write!(f, "Next visit:      none scheduled"),
        }
    }
}

/// Earliest approved or in-progress booking that has a scheduled date.
#[must_use]
pub fn next_upcoming(records: &[BookingRecord]) -> Option<&BookingRecord> {
    records
        .iter()
        .filter(|r| matches!(r.status(), BookingStatus::Approved | BookingStatus::InProgress))
        .filter(|r| r.booking.scheduled_date.is_some())
        .min_by_key(|r| r.booking.scheduled_date)
}

/// Unwrap a source, degrading a failure to `T::default()`.
fn degrade<T: Default>(
    source: &'static str,
    result: Result<T, ClientError>,
    unavailable: &mut Vec<&'static str>,
) -> Result<T, DeskError> {
    match result {
        Ok(value) => Ok(value),
        Err(e @ ClientError::Auth(_)) => Err(e.into()),
        Err(e) => {
            tracing::warn!(source, error = %e, "Dashboard source unavailable");
            unavailable.push(source);
            Ok(T::default())
        }
    }
}

impl BookingDesk {
    /// Load the admin overview.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as an admin, or an
    /// authentication error from any source.
    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, DeskError> {
        self.require(Role::Admin)?;

        let (bookings, services, customers) = tokio::join!(
            self.cache().refresh(),
            self.api().list_services(),
            self.api().list_customers(),
        );

        let mut unavailable = Vec::new();
        let bookings = degrade("bookings", bookings, &mut unavailable)?;
        let services = degrade("services", services, &mut unavailable)?;
        let customers = degrade("customers", customers, &mut unavailable)?;

        Ok(AdminDashboard {
            bookings: StatusCounts::tally(&bookings),
            total_bookings: bookings.len(),
            total_services: services.len(),
            total_customers: customers.len(),
            unavailable,
        })
    }

    /// Load the signed-in customer's overview.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Denied` unless signed in as a customer, or an
    /// authentication error from any source.
    pub async fn customer_dashboard(&self) -> Result<CustomerDashboard, DeskError> {
        self.require(Role::Customer)?;

        let (bookings, vehicles, invoices) = tokio::join!(
            self.cache().refresh(),
            self.api().list_vehicles(),
            self.api().list_invoices(),
        );

        let mut unavailable = Vec::new();
        let bookings = degrade("bookings", bookings, &mut unavailable)?;
        let vehicles = degrade("vehicles", vehicles, &mut unavailable)?;
        let invoices = degrade("invoices", invoices, &mut unavailable)?;

        Ok(CustomerDashboard {
            vehicles: vehicles.len(),
            bookings: StatusCounts::tally(&bookings),
            unpaid_invoices: invoices.iter().filter(|i| !i.invoice.is_paid()).count(),
            upcoming: next_upcoming(&bookings).cloned(),
            unavailable,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(id: i64, status: &str, scheduled: Option<&str>) -> BookingRecord {
        serde_json::from_value(serde_json::json!({
            "id": id, "customer": 1, "vehicle": 1, "service": 1,
            "status": status, "preferred_date": "2026-03-05",
            "scheduled_date": scheduled,
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_tally_and_completion_rate() {
        let records = vec![
            record(1, "PENDING", None),
            record(2, "COMPLETED", Some("2026-03-06")),
            record(3, "COMPLETED", Some("2026-03-07")),
            record(4, "CANCELLED", None),
        ];
        let counts = StatusCounts::tally(&records);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.total(), 4);

        let dashboard = AdminDashboard {
            bookings: counts,
            total_bookings: 4,
            ..AdminDashboard::default()
        };
        assert_eq!(dashboard.completion_rate(), Decimal::new(500, 1));
        assert_eq!(AdminDashboard::default().completion_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_next_upcoming_picks_earliest_active() {
        let records = vec![
            record(1, "APPROVED", Some("2026-03-20")),
            record(2, "IN_PROGRESS", Some("2026-03-12")),
            record(3, "COMPLETED", Some("2026-03-01")),
            record(4, "APPROVED", None),
        ];
        assert_eq!(next_upcoming(&records).unwrap().id().as_i64(), 2);
        assert!(next_upcoming(&records[2..]).is_none());
    }

    #[test]
    fn test_degrade_counts_failures_as_empty() {
        let mut unavailable = Vec::new();
        let value: Vec<u8> = degrade(
            "services",
            Err(ClientError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
            &mut unavailable,
        )
        .unwrap();
        assert!(value.is_empty());
        assert_eq!(unavailable, vec!["services"]);

        let err = degrade::<Vec<u8>>(
            "bookings",
            Err(ClientError::Auth(crate::error::AuthError::SessionExpired)),
            &mut unavailable,
        );
        assert!(err.is_err());
    }
}
