//! In-memory records behind the fake backend.
//!
//! Rows are stored flat and nested into the backend's JSON shapes on the way
//! out, the same way the real serializers nest customer, vehicle and service
//! inside a booking and the booking inside an invoice.

use std::collections::{HashMap, HashSet};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use garage_core::{BookingStatus, PaymentStatus, Role};
use rust_decimal::Decimal;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: i64,
    /// Customers created by an admin may have no login account.
    pub user_id: Option<i64>,
    pub phone: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct VehicleRow {
    pub id: i64,
    pub customer_id: i64,
    pub vehicle_number: String,
    pub vehicle_type: String,
}

#[derive(Debug, Clone)]
pub struct ServiceRow {
    pub id: i64,
    pub service_name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct BookingRow {
    pub id: i64,
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub service_id: i64,
    pub status: BookingStatus,
    pub booking_date: NaiveDate,
    pub preferred_date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InvoiceRow {
    pub id: i64,
    pub booking_id: i64,
    pub additional_charge: Decimal,
    pub additional_charge_description: String,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub invoice_date: NaiveDate,
}

/// Who a bearer token belongs to.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
    pub customer_id: Option<i64>,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this caller may see records owned by `customer_id`.
    pub fn owns(&self, customer_id: i64) -> bool {
        self.is_admin() || self.customer_id == Some(customer_id)
    }
}

/// Everything the fake backend knows.
#[derive(Debug, Default)]
pub struct Db {
    pub users: Vec<UserRow>,
    pub customers: Vec<CustomerRow>,
    pub vehicles: Vec<VehicleRow>,
    pub services: Vec<ServiceRow>,
    pub bookings: Vec<BookingRow>,
    pub invoices: Vec<InvoiceRow>,
    /// Issued access tokens and the user each belongs to.
    pub tokens: HashMap<String, i64>,
    /// Request paths forced to answer 500.
    pub failing: HashSet<String>,
    /// Every request as `"METHOD /path"`, in arrival order.
    pub requests: Vec<String>,
    next_id: i64,
    clock: i64,
}

impl Db {
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing creation timestamps so list order is stable.
    pub fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000) + Duration::seconds(self.clock)
    }

    pub fn user(&self, id: i64) -> Option<&UserRow> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_by_name(&self, username: &str) -> Option<&UserRow> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn customer_for_user(&self, user_id: i64) -> Option<&CustomerRow> {
        self.customers.iter().find(|c| c.user_id == Some(user_id))
    }

    pub fn booking(&self, id: i64) -> Option<&BookingRow> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: i64) -> Option<&mut BookingRow> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    pub fn invoice_for_booking(&self, booking_id: i64) -> Option<&InvoiceRow> {
        self.invoices.iter().find(|i| i.booking_id == booking_id)
    }

    /// Resolve a bearer token to its caller.
    pub fn caller(&self, token: &str) -> Option<Caller> {
        let user_id = *self.tokens.get(token)?;
        let user = self.user(user_id)?;
        Some(Caller {
            user_id,
            role: user.role,
            customer_id: self.customer_for_user(user_id).map(|c| c.id),
        })
    }

    /// Issue an access token for `user_id`: an unsigned JWT whose payload
    /// carries the role claim.
    pub fn issue_token(&mut self, user_id: i64) -> Option<String> {
        let user = self.user(user_id)?;
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "token_type": "access",
                "user_id": user.id,
                "username": user.username,
                "role": user.role,
                "exp": 4_102_444_800_i64,
            })
            .to_string(),
        );
        let signature = URL_SAFE_NO_PAD.encode(format!("sig-{}", self.tokens.len()));
        let token = format!("{header}.{payload}.{signature}");
        self.tokens.insert(token.clone(), user_id);
        Some(token)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    pub fn user_json(&self, id: i64) -> Value {
        self.user(id).map_or(Value::Null, |u| {
            json!({
                "id": u.id,
                "username": u.username,
                "email": u.email,
                "first_name": u.first_name,
                "last_name": u.last_name,
                "role": u.role,
            })
        })
    }

    pub fn customer_json(&self, customer: &CustomerRow) -> Value {
        json!({
            "id": customer.id,
            "user": customer.user_id.map_or(Value::Null, |id| self.user_json(id)),
            "phone": customer.phone,
            "is_active": customer.is_active,
        })
    }

    pub fn vehicle_json(vehicle: &VehicleRow) -> Value {
        json!({
            "id": vehicle.id,
            "customer": vehicle.customer_id,
            "vehicle_number": vehicle.vehicle_number,
            "vehicle_type": vehicle.vehicle_type,
        })
    }

    pub fn service_json(service: &ServiceRow) -> Value {
        json!({
            "id": service.id,
            "service_name": service.service_name,
            "description": service.description,
            "price": service.price,
        })
    }

    pub fn booking_json(&self, booking: &BookingRow) -> Value {
        let customer = self
            .customers
            .iter()
            .find(|c| c.id == booking.customer_id)
            .map_or(json!(booking.customer_id), |c| self.customer_json(c));
        let vehicle = self
            .vehicles
            .iter()
            .find(|v| v.id == booking.vehicle_id)
            .map_or(json!(booking.vehicle_id), Self::vehicle_json);
        let service = self
            .services
            .iter()
            .find(|s| s.id == booking.service_id)
            .map_or(json!(booking.service_id), Self::service_json);
        json!({
            "id": booking.id,
            "customer": customer,
            "vehicle": vehicle,
            "service": service,
            "status": booking.status,
            "booking_date": booking.booking_date,
            "preferred_date": booking.preferred_date,
            "scheduled_date": booking.scheduled_date,
            "created_at": booking.created_at,
            "invoice": self.invoice_for_booking(booking.id).map(|i| i.id),
        })
    }

    pub fn invoice_json(&self, invoice: &InvoiceRow) -> Value {
        let booking = self
            .booking(invoice.booking_id)
            .map_or(json!(invoice.booking_id), |b| self.booking_json(b));
        json!({
            "id": invoice.id,
            "booking": booking,
            "additional_charge": invoice.additional_charge,
            "additional_charge_description": invoice.additional_charge_description,
            "total_amount": invoice.total_amount,
            "payment_status": invoice.payment_status,
            "invoice_date": invoice.invoice_date,
        })
    }
}
