//! Sign-in, session persistence and expiry against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use garage_client::{
    AuthError, ClientError, DeskError, MemoryTokenStore, Registration, StoredTokens, TokenStore,
};
use garage_core::{Email, NewBooking, Role, Route, ServiceId, VehicleId};
use garage_integration_tests::{TestBackend, days_ahead, secret};
use rust_decimal::Decimal;

async fn backend() -> TestBackend {
    let backend = TestBackend::start().await;
    backend.seed_admin("boss", "admin-pw");
    backend.seed_customer("alice", "alice-pw");
    backend
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_decodes_role_and_persists_tokens() {
    let backend = backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let desk = backend.desk_with_store(store.clone());

    let principal = desk.api().login("boss", &secret("admin-pw")).await.unwrap();
    assert_eq!(principal.role, Role::Admin);
    assert_eq!(principal.username, "boss");
    assert!(desk.require(Role::Admin).is_ok());
    assert!(store.load().unwrap().is_some());
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let backend = backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let desk = backend.desk_with_store(store.clone());
    desk.api().login("alice", &secret("alice-pw")).await.unwrap();

    let err = desk.api().login("alice", &secret("wrong")).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::InvalidCredentials)));
    assert_eq!(err.notice(), "Login failed. Check credentials.");

    assert!(desk.api().session().is_authenticated());
    assert!(store.load().unwrap().is_some());
    assert!(desk.bookings().await.is_ok());
}

#[tokio::test]
async fn test_suspended_account_has_its_own_message() {
    let backend = backend().await;
    backend.suspend("alice");
    let desk = backend.desk();

    let err = desk.api().login("alice", &secret("alice-pw")).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::AccountSuspended)));
    assert_eq!(
        err.notice(),
        "Your account has been suspended. Please contact support."
    );
    assert!(!desk.api().session().is_authenticated());

    let err = desk.api().login("nobody", &secret("x")).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::InvalidCredentials)));
}

// =============================================================================
// Expiry and Logout
// =============================================================================

#[tokio::test]
async fn test_rejected_token_tears_down_session() {
    let backend = backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let desk = backend.desk_with_store(store.clone());
    desk.api().login("boss", &secret("admin-pw")).await.unwrap();

    backend.expire_sessions();
    let err = desk.bookings().await.unwrap_err();

    assert!(matches!(
        err,
        DeskError::Client(ClientError::Auth(AuthError::SessionExpired))
    ));
    assert_eq!(err.redirect(), Some(Route::Login));
    assert!(!desk.api().session().is_authenticated());
    assert!(store.load().unwrap().is_none());

    // The next call fails locally without reaching the backend
    backend.clear_requests();
    let err = desk.bookings().await.unwrap_err();
    assert!(matches!(err, DeskError::Denied(Route::Login)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_logout_stops_authenticated_calls_at_once() {
    let backend = backend().await;
    let store = Arc::new(MemoryTokenStore::new());
    let desk = backend.desk_with_store(store.clone());
    desk.api().login("alice", &secret("alice-pw")).await.unwrap();

    desk.api().logout().unwrap();
    assert!(store.load().unwrap().is_none());

    backend.clear_requests();
    let err = desk.api().list_services().await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::NotAuthenticated)));
    assert!(matches!(
        desk.require(Role::Customer),
        Err(DeskError::Denied(Route::Login))
    ));
    assert!(backend.requests().is_empty());
}

/// Seed a second customer with one booking; returns that booking's id.
async fn seed_booking_for_bob(backend: &TestBackend) -> i64 {
    let bob = backend.seed_customer("bob", "bob-pw");
    let vehicle = backend.seed_vehicle(bob, "KA05ZZ9999", "SUV");
    let service = backend.seed_service("Wash", Decimal::new(30_000, 2));

    let desk = backend.desk();
    desk.api().login("bob", &secret("bob-pw")).await.unwrap();
    desk.create_booking(&NewBooking {
        vehicle_id: VehicleId::new(vehicle),
        service_id: ServiceId::new(service),
        preferred_date: days_ahead(2),
    })
    .await
    .unwrap()
    .id()
    .as_i64()
}

#[tokio::test]
async fn test_next_user_does_not_see_previous_users_bookings() {
    let backend = backend().await;
    seed_booking_for_bob(&backend).await;
    let desk = backend.desk();

    desk.api().login("boss", &secret("admin-pw")).await.unwrap();
    assert_eq!(desk.bookings().await.unwrap().len(), 1);

    desk.api().logout().unwrap();
    desk.api().login("alice", &secret("alice-pw")).await.unwrap();
    backend.clear_requests();
    assert!(desk.bookings().await.unwrap().is_empty());
    assert_eq!(backend.count("GET /api/bookings/"), 1);
}

#[tokio::test]
async fn test_login_over_existing_session_drops_cached_bookings() {
    let backend = backend().await;
    let id = seed_booking_for_bob(&backend).await;
    let desk = backend.desk();

    desk.api().login("boss", &secret("admin-pw")).await.unwrap();
    let cached = desk.bookings().await.unwrap();
    assert_eq!(cached[0].id().as_i64(), id);

    desk.api().login("alice", &secret("alice-pw")).await.unwrap();
    assert!(desk.bookings().await.unwrap().is_empty());
    assert!(desk.booking(cached[0].id()).await.is_err());
}

#[tokio::test]
async fn test_rejected_token_drops_cached_bookings() {
    let backend = backend().await;
    seed_booking_for_bob(&backend).await;
    let desk = backend.desk();

    desk.api().login("boss", &secret("admin-pw")).await.unwrap();
    assert_eq!(desk.bookings().await.unwrap().len(), 1);

    backend.expire_sessions();
    assert!(desk.refresh().await.is_err());
    assert!(matches!(
        desk.bookings().await.unwrap_err(),
        DeskError::Denied(Route::Login)
    ));

    desk.api().login("alice", &secret("alice-pw")).await.unwrap();
    assert!(desk.bookings().await.unwrap().is_empty());
}

// =============================================================================
// Restore
// =============================================================================

#[tokio::test]
async fn test_restore_reuses_persisted_token() {
    let backend = backend().await;
    let store: Arc<MemoryTokenStore> = Arc::new(MemoryTokenStore::new());
    let first = backend.desk_with_store(store.clone());
    first.api().login("alice", &secret("alice-pw")).await.unwrap();

    let second = backend.desk_with_store(store);
    let principal = second.require(Role::Customer).unwrap();
    assert_eq!(principal.username, "alice");
    assert!(second.bookings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_discards_undecodable_token() {
    let backend = backend().await;
    let store = Arc::new(MemoryTokenStore::with_tokens(StoredTokens::new(
        "not-a-jwt",
        None,
    )));

    let desk = backend.desk_with_store(store.clone());
    assert!(!desk.api().session().is_authenticated());
    assert!(store.load().unwrap().is_none());
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_then_login_as_customer() {
    let backend = backend().await;
    let desk = backend.desk();
    let registration = Registration {
        username: "bob".to_string(),
        password: secret("bob-pw"),
        first_name: "Bob".to_string(),
        last_name: "Ray".to_string(),
        email: Email::parse("bob@example.com").unwrap(),
    };

    desk.api().register(&registration).await.unwrap();
    assert!(!desk.api().session().is_authenticated());

    let err = desk.api().register(&registration).await.unwrap_err();
    let ClientError::Validation(errors) = err else {
        panic!("expected field errors");
    };
    assert_eq!(
        errors.field("username"),
        ["A user with that username already exists.".to_string()]
    );

    let principal = desk.api().login("bob", &secret("bob-pw")).await.unwrap();
    assert_eq!(principal.role, Role::Customer);
    let profile = desk.api().my_profile().await.unwrap();
    assert_eq!(profile.display_name(), "Bob Ray");
}
