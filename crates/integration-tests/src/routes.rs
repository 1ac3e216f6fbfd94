//! HTTP handlers of the fake backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use garage_core::{BookingAction, BookingStatus, PaymentStatus, Role};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::server_today;
use crate::state::{BookingRow, Caller, CustomerRow, Db, InvoiceRow, ServiceRow, UserRow, VehicleRow};

pub type Shared = Arc<Mutex<Db>>;

fn lock(state: &Shared) -> MutexGuard<'_, Db> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Error response with a JSON body.
pub struct ApiError(StatusCode, Value);

impl ApiError {
    fn unauthorized() -> Self {
        Self(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
        )
    }

    fn forbidden() -> Self {
        Self(
            StatusCode::FORBIDDEN,
            json!({"detail": "You do not have permission to perform this action."}),
        )
    }

    fn not_found() -> Self {
        Self(StatusCode::NOT_FOUND, json!({"detail": "Not found."}))
    }

    fn detail(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, json!({"detail": message.into()}))
    }

    fn field(field: &str, message: &str) -> Self {
        Self(StatusCode::BAD_REQUEST, json!({ field: [message] }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

type ApiResult = Result<(StatusCode, Json<Value>), ApiError>;

fn ok(value: Value) -> ApiResult {
    Ok((StatusCode::OK, Json(value)))
}

fn created(value: Value) -> ApiResult {
    Ok((StatusCode::CREATED, Json(value)))
}

fn authorize(db: &Db, headers: &HeaderMap) -> Result<Caller, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| db.caller(token))
        .ok_or_else(ApiError::unauthorized)
}

fn require_admin(db: &Db, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let caller = authorize(db, headers)?;
    if caller.is_admin() {
        Ok(caller)
    } else {
        Err(ApiError::forbidden())
    }
}

/// Parse an optional JSON body; bodiless action posts arrive empty.
fn json_body<T: for<'de> Deserialize<'de> + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::detail(format!("JSON parse error - {e}")))
}

/// Build the `/api` router.
pub fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/token/", post(login))
        .route("/auth/register/", post(register))
        .route("/bookings/", get(list_bookings).post(create_booking))
        .route(
            "/bookings/{id}/",
            get(get_booking).patch(patch_booking).delete(delete_booking),
        )
        .route("/bookings/{id}/{action}/", post(booking_action))
        .route("/invoices/", get(list_invoices).post(create_invoice))
        .route("/invoices/{id}/", get(get_invoice).patch(patch_invoice))
        .route("/invoices/{id}/download_pdf/", get(download_pdf))
        .route("/customers/", get(list_customers).post(create_customer))
        .route("/customers/me/", get(my_profile))
        .route("/customers/{id}/", get(get_customer).patch(patch_customer))
        .route("/customers/{id}/toggle_status/", post(toggle_status))
        .route("/vehicles/", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/{id}/", put(put_vehicle).delete(delete_vehicle))
        .route("/services/", get(list_services).post(create_service))
        .route(
            "/services/{id}/",
            get(get_service).patch(patch_service).delete(delete_service),
        );

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record_and_fail))
        .with_state(state)
}

/// Log every request and answer 500 for paths marked as failing.
async fn record_and_fail(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let failing = {
        let mut db = lock(&state);
        db.requests.push(format!("{} {path}", request.method()));
        db.failing.contains(&path)
    };
    if failing {
        tracing::debug!(%path, "Forcing server error");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>Server Error (500)</body></html>",
        )
            .into_response();
    }
    next.run(request).await
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> ApiResult {
    let mut db = lock(&state);
    let invalid = || {
        ApiError(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "No active account found with the given credentials"}),
        )
    };
    let user = db
        .user_by_name(&body.username)
        .filter(|u| u.password == body.password)
        .cloned()
        .ok_or_else(invalid)?;
    if db.customer_for_user(user.id).is_some_and(|c| !c.is_active) {
        return Err(ApiError(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "User account is suspended.", "code": "user_suspended"}),
        ));
    }
    let access = db.issue_token(user.id).ok_or_else(invalid)?;
    ok(json!({"access": access, "refresh": format!("refresh-{}", user.id)}))
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> ApiResult {
    let mut db = lock(&state);
    if db.user_by_name(&body.username).is_some() {
        return Err(ApiError::field(
            "username",
            "A user with that username already exists.",
        ));
    }
    let user_id = db.next_id();
    db.users.push(UserRow {
        id: user_id,
        username: body.username.clone(),
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        role: Role::Customer,
    });
    let customer_id = db.next_id();
    db.customers.push(CustomerRow {
        id: customer_id,
        user_id: Some(user_id),
        phone: None,
        is_active: true,
    });
    created(json!({"id": user_id, "username": body.username}))
}

// =============================================================================
// Bookings
// =============================================================================

async fn list_bookings(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let bookings: Vec<Value> = db
        .bookings
        .iter()
        .filter(|b| caller.owns(b.customer_id))
        .map(|b| db.booking_json(b))
        .collect();
    ok(Value::Array(bookings))
}

async fn get_booking(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let booking = db
        .booking(id)
        .filter(|b| caller.owns(b.customer_id))
        .ok_or_else(ApiError::not_found)?;
    ok(db.booking_json(booking))
}

#[derive(Deserialize)]
struct CreateBookingBody {
    vehicle_id: i64,
    service_id: i64,
    preferred_date: NaiveDate,
}

async fn create_booking(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingBody>,
) -> ApiResult {
    let mut db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let customer_id = caller.customer_id.ok_or_else(ApiError::forbidden)?;
    if !db
        .vehicles
        .iter()
        .any(|v| v.id == body.vehicle_id && v.customer_id == customer_id)
    {
        return Err(ApiError::field("vehicle_id", "Invalid vehicle."));
    }
    if !db.services.iter().any(|s| s.id == body.service_id) {
        return Err(ApiError::field("service_id", "Invalid service."));
    }
    if body.preferred_date < server_today() {
        return Err(ApiError::field(
            "preferred_date",
            "Preferred date cannot be in the past.",
        ));
    }
    let id = db.next_id();
    let created_at = db.now();
    let row = BookingRow {
        id,
        customer_id,
        vehicle_id: body.vehicle_id,
        service_id: body.service_id,
        status: BookingStatus::Pending,
        booking_date: server_today(),
        preferred_date: body.preferred_date,
        scheduled_date: None,
        created_at,
    };
    let value = db.booking_json(&row);
    db.bookings.push(row);
    created(value)
}

#[derive(Default, Deserialize)]
struct BookingPatchBody {
    #[serde(default)]
    scheduled_date: Option<NaiveDate>,
}

async fn patch_booking(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let patch: BookingPatchBody = json_body(&body)?;
    let booking = db.booking_mut(id).ok_or_else(ApiError::not_found)?;
    if let Some(date) = patch.scheduled_date {
        if !BookingAction::Reschedule.is_allowed_from(booking.status) {
            return Err(ApiError::detail(format!(
                "Cannot reschedule a booking with status {}.",
                booking.status
            )));
        }
        if date < booking.preferred_date {
            return Err(ApiError::field(
                "non_field_errors",
                "Scheduled date cannot be before preferred date.",
            ));
        }
        booking.scheduled_date = Some(date);
    }
    let booking = booking.clone();
    ok(db.booking_json(&booking))
}

async fn delete_booking(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let before = db.bookings.len();
    db.bookings.retain(|b| b.id != id);
    if db.bookings.len() == before {
        return Err(ApiError::not_found());
    }
    db.invoices.retain(|i| i.booking_id != id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Default, Deserialize)]
struct ActionBody {
    #[serde(default)]
    scheduled_date: Option<NaiveDate>,
}

fn parse_action(action: &str) -> Option<BookingAction> {
    match action {
        "approve" => Some(BookingAction::Approve),
        "reject" => Some(BookingAction::Reject),
        "start" => Some(BookingAction::Start),
        "complete" => Some(BookingAction::Complete),
        "cancel" => Some(BookingAction::Cancel),
        _ => None,
    }
}

async fn booking_action(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, action)): Path<(i64, String)>,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let action = parse_action(&action).ok_or_else(ApiError::not_found)?;
    let body: ActionBody = json_body(&body)?;
    let booking = db.booking_mut(id).ok_or_else(ApiError::not_found)?;

    let next = action.check(booking.status).map_err(|_| {
        ApiError::detail(format!(
            "Cannot {action} a booking with status {}.",
            booking.status
        ))
    })?;
    match action {
        BookingAction::Approve => {
            let date = body
                .scheduled_date
                .ok_or_else(|| ApiError::field("scheduled_date", "This field is required."))?;
            booking.scheduled_date = Some(date);
        }
        BookingAction::Reject | BookingAction::Cancel => booking.scheduled_date = None,
        _ => {}
    }
    booking.status = next;
    let booking = booking.clone();
    ok(db.booking_json(&booking))
}

// =============================================================================
// Invoices
// =============================================================================

fn visible_invoice(db: &Db, caller: &Caller, invoice: &InvoiceRow) -> bool {
    db.booking(invoice.booking_id)
        .is_some_and(|b| caller.owns(b.customer_id))
}

async fn list_invoices(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let invoices: Vec<Value> = db
        .invoices
        .iter()
        .filter(|i| visible_invoice(&db, &caller, i))
        .map(|i| db.invoice_json(i))
        .collect();
    ok(Value::Array(invoices))
}

async fn get_invoice(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let invoice = db
        .invoices
        .iter()
        .find(|i| i.id == id && visible_invoice(&db, &caller, i))
        .ok_or_else(ApiError::not_found)?;
    ok(db.invoice_json(invoice))
}

#[derive(Deserialize)]
struct CreateInvoiceBody {
    booking_id: i64,
    #[serde(default)]
    additional_charge: Decimal,
    #[serde(default)]
    additional_charge_description: String,
}

async fn create_invoice(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateInvoiceBody>,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let booking = db
        .booking(body.booking_id)
        .cloned()
        .ok_or_else(|| ApiError::field("booking_id", "Invalid booking."))?;
    if booking.status != BookingStatus::Completed {
        return Err(ApiError::detail(
            "Invoice can only be generated for completed bookings.",
        ));
    }
    if db.invoice_for_booking(booking.id).is_some() {
        return Err(ApiError::field(
            "booking_id",
            "Invoice already exists for this booking.",
        ));
    }
    let price = db
        .services
        .iter()
        .find(|s| s.id == booking.service_id)
        .map_or(Decimal::ZERO, |s| s.price);
    let charge = body.additional_charge.max(Decimal::ZERO);
    let id = db.next_id();
    let row = InvoiceRow {
        id,
        booking_id: booking.id,
        additional_charge: charge,
        additional_charge_description: body.additional_charge_description,
        total_amount: price + charge,
        payment_status: PaymentStatus::Pending,
        invoice_date: server_today(),
    };
    let value = db.invoice_json(&row);
    db.invoices.push(row);
    created(value)
}

#[derive(Default, Deserialize)]
struct InvoicePatchBody {
    #[serde(default)]
    payment_status: Option<PaymentStatus>,
    #[serde(default)]
    additional_charge: Option<Decimal>,
    #[serde(default)]
    additional_charge_description: Option<String>,
    #[serde(default)]
    total_amount: Option<Decimal>,
}

async fn patch_invoice(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let patch: InvoicePatchBody = json_body(&body)?;
    let price = db
        .invoices
        .iter()
        .find(|i| i.id == id)
        .and_then(|i| db.booking(i.booking_id))
        .and_then(|b| db.services.iter().find(|s| s.id == b.service_id))
        .map(|s| s.price);
    let invoice = db
        .invoices
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or_else(ApiError::not_found)?;
    if let Some(status) = patch.payment_status {
        if invoice.payment_status == PaymentStatus::Paid && status == PaymentStatus::Pending {
            return Err(ApiError::field(
                "payment_status",
                "A paid invoice cannot be moved back to pending.",
            ));
        }
        invoice.payment_status = status;
    }
    if let Some(charge) = patch.additional_charge {
        invoice.additional_charge = charge.max(Decimal::ZERO);
        // A submitted total is stored as sent
        invoice.total_amount = patch
            .total_amount
            .or_else(|| price.map(|p| p + invoice.additional_charge))
            .unwrap_or(invoice.total_amount);
    }
    if let Some(description) = patch.additional_charge_description {
        invoice.additional_charge_description = description;
    }
    let invoice = invoice.clone();
    ok(db.invoice_json(&invoice))
}

async fn download_pdf(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let invoice = db
        .invoices
        .iter()
        .find(|i| i.id == id && visible_invoice(&db, &caller, i))
        .ok_or_else(ApiError::not_found)?;
    let body = format!("%PDF-1.4\n% invoice {} total {}\n%%EOF\n", invoice.id, invoice.total_amount);
    Ok(([(header::CONTENT_TYPE, "application/pdf")], body).into_response())
}

// =============================================================================
// Customers
// =============================================================================

async fn list_customers(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    let db = lock(&state);
    require_admin(&db, &headers)?;
    let customers: Vec<Value> = db.customers.iter().map(|c| db.customer_json(c)).collect();
    ok(Value::Array(customers))
}

async fn my_profile(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let customer = db
        .customer_for_user(caller.user_id)
        .ok_or_else(ApiError::not_found)?;
    ok(db.customer_json(customer))
}

async fn get_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let customer = db
        .customers
        .iter()
        .find(|c| c.id == id && caller.owns(c.id))
        .ok_or_else(ApiError::not_found)?;
    ok(db.customer_json(customer))
}

#[derive(Default, Deserialize)]
struct CustomerBody {
    #[serde(default)]
    phone: Option<String>,
}

async fn patch_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let patch: CustomerBody = json_body(&body)?;
    let customer = db
        .customers
        .iter_mut()
        .find(|c| c.id == id && caller.owns(c.id))
        .ok_or_else(ApiError::not_found)?;
    if patch.phone.is_some() {
        customer.phone = patch.phone;
    }
    let customer = customer.clone();
    ok(db.customer_json(&customer))
}

async fn create_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let input: CustomerBody = json_body(&body)?;
    let id = db.next_id();
    let row = CustomerRow {
        id,
        user_id: None,
        phone: input.phone,
        is_active: true,
    };
    let value = db.customer_json(&row);
    db.customers.push(row);
    created(value)
}

async fn toggle_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let customer = db
        .customers
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(ApiError::not_found)?;
    customer.is_active = !customer.is_active;
    ok(json!({"is_active": customer.is_active}))
}

// =============================================================================
// Vehicles
// =============================================================================

async fn list_vehicles(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    let db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let vehicles: Vec<Value> = db
        .vehicles
        .iter()
        .filter(|v| caller.owns(v.customer_id))
        .map(Db::vehicle_json)
        .collect();
    ok(Value::Array(vehicles))
}

#[derive(Deserialize)]
struct VehicleBody {
    vehicle_number: String,
    vehicle_type: String,
}

async fn create_vehicle(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<VehicleBody>,
) -> ApiResult {
    let mut db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let customer_id = caller.customer_id.ok_or_else(ApiError::forbidden)?;
    if db
        .vehicles
        .iter()
        .any(|v| v.vehicle_number == body.vehicle_number)
    {
        return Err(ApiError::field(
            "vehicle_number",
            "vehicle with this vehicle number already exists.",
        ));
    }
    let id = db.next_id();
    let row = VehicleRow {
        id,
        customer_id,
        vehicle_number: body.vehicle_number,
        vehicle_type: body.vehicle_type,
    };
    let value = Db::vehicle_json(&row);
    db.vehicles.push(row);
    created(value)
}

async fn put_vehicle(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<VehicleBody>,
) -> ApiResult {
    let mut db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let vehicle = db
        .vehicles
        .iter_mut()
        .find(|v| v.id == id && caller.owns(v.customer_id))
        .ok_or_else(ApiError::not_found)?;
    vehicle.vehicle_number = body.vehicle_number;
    vehicle.vehicle_type = body.vehicle_type;
    ok(Db::vehicle_json(vehicle))
}

async fn delete_vehicle(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut db = lock(&state);
    let caller = authorize(&db, &headers)?;
    let before = db.vehicles.len();
    db.vehicles
        .retain(|v| !(v.id == id && caller.owns(v.customer_id)));
    if db.vehicles.len() == before {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Services
// =============================================================================

async fn list_services(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    let db = lock(&state);
    authorize(&db, &headers)?;
    ok(Value::Array(db.services.iter().map(Db::service_json).collect()))
}

async fn get_service(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    let db = lock(&state);
    authorize(&db, &headers)?;
    let service = db
        .services
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(ApiError::not_found)?;
    ok(Db::service_json(service))
}

#[derive(Default, Deserialize)]
struct ServiceBody {
    #[serde(default)]
    service_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
}

async fn create_service(
    State(state): State<Shared>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let input: ServiceBody = json_body(&body)?;
    let name = input
        .service_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::field("service_name", "This field is required."))?;
    let price = input
        .price
        .ok_or_else(|| ApiError::field("price", "This field is required."))?;
    let id = db.next_id();
    let row = ServiceRow {
        id,
        service_name: name,
        description: input.description,
        price,
    };
    let value = Db::service_json(&row);
    db.services.push(row);
    created(value)
}

async fn patch_service(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let patch: ServiceBody = json_body(&body)?;
    let service = db
        .services
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(ApiError::not_found)?;
    if let Some(name) = patch.service_name {
        service.service_name = name;
    }
    if patch.description.is_some() {
        service.description = patch.description;
    }
    if let Some(price) = patch.price {
        service.price = price;
    }
    ok(Db::service_json(service))
}

async fn delete_service(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut db = lock(&state);
    require_admin(&db, &headers)?;
    let before = db.services.len();
    db.services.retain(|s| s.id != id);
    if db.services.len() == before {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
