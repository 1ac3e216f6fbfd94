//! Integration tests for Garage Desk.
//!
//! Tests run the real client against an in-process fake of the garage
//! backend. The fake keeps its records in memory, enforces the same booking
//! lifecycle rules and issues unsigned JWTs carrying a role claim.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p garage-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = TestBackend::start().await;
//! backend.seed_admin("boss", "pw");
//! let desk = backend.desk();
//! desk.api().login("boss", &secret("pw")).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod routes;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use garage_client::{
    ApiClient, BookingDesk, ClientConfig, MemoryTokenStore, SessionStore, TokenStore,
};
use garage_core::{BookingStatus, PaymentStatus, Role};
use rust_decimal::Decimal;
use secrecy::SecretString;

use state::{CustomerRow, Db, InvoiceRow, ServiceRow, UserRow, VehicleRow};

/// A running fake backend bound to an ephemeral local port.
pub struct TestBackend {
    base_url: String,
    db: Arc<Mutex<Db>>,
    server: tokio::task::JoinHandle<()>,
}

impl TestBackend {
    /// Bind to `127.0.0.1:0` and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let db = Arc::new(Mutex::new(Db::default()));
        let app = routes::router(Arc::clone(&db));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Fake backend stopped: {e}");
            }
        });
        Self {
            base_url: format!("http://{addr}/api"),
            db,
            server,
        }
    }

    /// Base API URL, ending in `/api`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.base_url
    }

    fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// A desk with its own in-memory token store and "today" pinned to the
    /// fake backend's date.
    #[must_use]
    pub fn desk(&self) -> BookingDesk {
        self.desk_with_store(Arc::new(MemoryTokenStore::new()))
    }

    /// A desk persisting its session to `store`.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn desk_with_store(&self, store: Arc<dyn TokenStore>) -> BookingDesk {
        let config = ClientConfig::new(&self.base_url).expect("valid fake backend URL");
        let session = SessionStore::new(store);
        session.restore();
        let api = ApiClient::new(config, session).expect("build client");
        BookingDesk::new(api).with_today(server_today)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Add an admin account.
    pub fn seed_admin(&self, username: &str, password: &str) -> i64 {
        let mut db = self.db();
        let id = db.next_id();
        db.users.push(user_row(id, username, password, Role::Admin));
        id
    }

    /// Add a customer account and profile; returns the customer id.
    pub fn seed_customer(&self, username: &str, password: &str) -> i64 {
        let mut db = self.db();
        let user_id = db.next_id();
        db.users
            .push(user_row(user_id, username, password, Role::Customer));
        let id = db.next_id();
        db.customers.push(CustomerRow {
            id,
            user_id: Some(user_id),
            phone: Some("9800000000".to_string()),
            is_active: true,
        });
        id
    }

    /// Add a customer profile with no login account.
    pub fn seed_walk_in_customer(&self) -> i64 {
        let mut db = self.db();
        let id = db.next_id();
        db.customers.push(CustomerRow {
            id,
            user_id: None,
            phone: None,
            is_active: true,
        });
        id
    }

    pub fn seed_vehicle(&self, customer_id: i64, number: &str, vehicle_type: &str) -> i64 {
        let mut db = self.db();
        let id = db.next_id();
        db.vehicles.push(VehicleRow {
            id,
            customer_id,
            vehicle_number: number.to_string(),
            vehicle_type: vehicle_type.to_string(),
        });
        id
    }

    pub fn seed_service(&self, name: &str, price: Decimal) -> i64 {
        let mut db = self.db();
        let id = db.next_id();
        db.services.push(ServiceRow {
            id,
            service_name: name.to_string(),
            description: None,
            price,
        });
        id
    }

    // =========================================================================
    // Interference
    // =========================================================================

    /// Make every request to `path` (e.g. `/api/services/`) answer 500.
    pub fn fail(&self, path: &str) {
        self.db().failing.insert(path.to_string());
    }

    /// Stop failing `path`.
    pub fn heal(&self, path: &str) {
        self.db().failing.remove(path);
    }

    /// Revoke every issued token so the next authenticated call gets 401.
    pub fn expire_sessions(&self) {
        self.db().tokens.clear();
    }

    /// Suspend the customer behind `username`.
    pub fn suspend(&self, username: &str) {
        let mut db = self.db();
        let Some(user_id) = db.user_by_name(username).map(|u| u.id) else {
            return;
        };
        for customer in &mut db.customers {
            if customer.user_id == Some(user_id) {
                customer.is_active = false;
            }
        }
    }

    /// Move a booking behind the client's back, as another admin would.
    pub fn force_status(&self, booking_id: i64, status: BookingStatus) {
        if let Some(booking) = self.db().booking_mut(booking_id) {
            booking.status = status;
        }
    }

    /// Issue an invoice directly, as a concurrent request would.
    pub fn insert_invoice(&self, booking_id: i64, total: Decimal) -> i64 {
        let mut db = self.db();
        let id = db.next_id();
        db.invoices.push(InvoiceRow {
            id,
            booking_id,
            additional_charge: Decimal::ZERO,
            additional_charge_description: String::new(),
            total_amount: total,
            payment_status: PaymentStatus::Pending,
            invoice_date: server_today(),
        });
        id
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Requests received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.db().requests.clone()
    }

    /// Number of received requests matching `"METHOD /path"` exactly.
    #[must_use]
    pub fn count(&self, request: &str) -> usize {
        self.db().requests.iter().filter(|r| *r == request).count()
    }

    pub fn clear_requests(&self) {
        self.db().requests.clear();
    }

    #[must_use]
    pub fn booking_status(&self, booking_id: i64) -> Option<BookingStatus> {
        self.db().booking(booking_id).map(|b| b.status)
    }

    #[must_use]
    pub fn invoice_count(&self) -> usize {
        self.db().invoices.len()
    }

    #[must_use]
    pub fn customer_active(&self, customer_id: i64) -> Option<bool> {
        self.db()
            .customers
            .iter()
            .find(|c| c.id == customer_id)
            .map(|c| c.is_active)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn user_row(id: i64, username: &str, password: &str, role: Role) -> UserRow {
    UserRow {
        id,
        username: username.to_string(),
        password: password.to_string(),
        first_name: capitalize(username),
        last_name: "Tester".to_string(),
        email: format!("{username}@example.com"),
        role,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Day stamped on bookings and invoices created by the fake backend.
pub const SERVER_TODAY: (i32, u32, u32) = (2026, 3, 1);

/// The fake backend's "today".
#[must_use]
pub fn server_today() -> NaiveDate {
    let (y, m, d) = SERVER_TODAY;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Days after the fake backend's "today".
#[must_use]
pub fn days_ahead(days: u64) -> NaiveDate {
    server_today() + chrono::Days::new(days)
}

/// Wrap a password for the login API.
#[must_use]
pub fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}
