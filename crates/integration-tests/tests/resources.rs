//! Vehicle, customer and service endpoints against the fake backend.

#![allow(clippy::unwrap_used)]

use garage_client::{ClientError, CustomerInput, ServiceInput, VehicleInput};
use garage_core::{CustomerId, PhoneNumber, ServiceId};
use garage_integration_tests::{TestBackend, secret};
use rust_decimal::Decimal;

async fn backend() -> TestBackend {
    let backend = TestBackend::start().await;
    backend.seed_admin("boss", "admin-pw");
    backend.seed_customer("alice", "alice-pw");
    backend
}

// =============================================================================
// Vehicles
// =============================================================================

#[tokio::test]
async fn test_customer_manages_own_vehicles() {
    let backend = backend().await;
    let desk = backend.desk();
    desk.api().login("alice", &secret("alice-pw")).await.unwrap();

    let input = VehicleInput {
        customer_id: None,
        vehicle_number: "MH12AB0001".to_string(),
        vehicle_type: "Sedan".to_string(),
    };
    let vehicle = desk.api().create_vehicle(&input).await.unwrap();
    assert_eq!(vehicle.label(), "MH12AB0001 (Sedan)");

    let err = desk.api().create_vehicle(&input).await.unwrap_err();
    let ClientError::Validation(errors) = err else {
        panic!("expected field errors");
    };
    assert!(!errors.field("vehicle_number").is_empty());

    let renamed = desk
        .api()
        .update_vehicle(
            vehicle.id,
            &VehicleInput {
                vehicle_type: "Estate".to_string(),
                ..input
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.vehicle_type, "Estate");

    desk.api().delete_vehicle(vehicle.id).await.unwrap();
    assert!(desk.api().list_vehicles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_cannot_register_vehicle() {
    let backend = backend().await;
    let desk = backend.desk();
    desk.api().login("boss", &secret("admin-pw")).await.unwrap();

    let err = desk
        .api()
        .create_vehicle(&VehicleInput {
            customer_id: Some(CustomerId::new(2)),
            vehicle_number: "MH12AB0002".to_string(),
            vehicle_type: "SUV".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 403, .. }));
    assert_eq!(
        err.notice(),
        "You do not have permission to perform this action."
    );
}

// =============================================================================
// Customers
// =============================================================================

#[tokio::test]
async fn test_customer_list_skips_profiles_without_login() {
    let backend = backend().await;
    backend.seed_walk_in_customer();
    let desk = backend.desk();
    desk.api().login("boss", &secret("admin-pw")).await.unwrap();

    let customers = desk.api().list_customers().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].username(), Some("alice"));
    assert_eq!(customers[0].display_name(), "Alice Tester");
}

#[tokio::test]
async fn test_toggle_suspends_and_blocks_login() {
    let backend = backend().await;
    let admin = backend.desk();
    admin.api().login("boss", &secret("admin-pw")).await.unwrap();
    let alice = admin.api().list_customers().await.unwrap()[0].id;

    assert_eq!(
        admin.api().toggle_customer_status(alice).await.unwrap(),
        Some(false)
    );
    assert_eq!(backend.customer_active(alice.as_i64()), Some(false));

    let customer = backend.desk();
    let err = customer
        .api()
        .login("alice", &secret("alice-pw"))
        .await
        .unwrap_err();
    assert_eq!(
        err.notice(),
        "Your account has been suspended. Please contact support."
    );

    admin.api().toggle_customer_status(alice).await.unwrap();
    assert!(customer.api().login("alice", &secret("alice-pw")).await.is_ok());
}

#[tokio::test]
async fn test_update_profile_phone() {
    let backend = backend().await;
    let desk = backend.desk();
    desk.api().login("alice", &secret("alice-pw")).await.unwrap();

    let me = desk.api().my_profile().await.unwrap();
    let updated = desk
        .api()
        .update_customer(
            me.id,
            &CustomerInput {
                phone: Some(PhoneNumber::parse("9876543210").unwrap()),
            },
        )
        .await
        .unwrap();
    assert!(updated.phone.is_some());
    assert_eq!(desk.api().get_customer(me.id).await.unwrap(), updated);
}

// =============================================================================
// Services
// =============================================================================

#[tokio::test]
async fn test_admin_maintains_service_catalogue() {
    let backend = backend().await;
    let desk = backend.desk();
    desk.api().login("boss", &secret("admin-pw")).await.unwrap();

    let input = ServiceInput {
        service_name: "Alignment".to_string(),
        description: Some("Four-wheel alignment".to_string()),
        price: Decimal::new(80_000, 2),
    };
    let service = desk.api().create_service(&input).await.unwrap();
    assert_eq!(service.price, Decimal::new(80_000, 2));

    let updated = desk
        .api()
        .update_service(
            service.id,
            &ServiceInput {
                price: Decimal::new(90_000, 2),
                ..input
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, Decimal::new(90_000, 2));
    assert_eq!(desk.api().get_service(service.id).await.unwrap(), updated);

    desk.api().delete_service(service.id).await.unwrap();
    assert!(matches!(
        desk.api().get_service(service.id).await.unwrap_err(),
        ClientError::NotFound(_)
    ));
    assert!(matches!(
        desk.api().get_service(ServiceId::new(999)).await.unwrap_err(),
        ClientError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_customer_cannot_create_service() {
    let backend = backend().await;
    let desk = backend.desk();
    desk.api().login("alice", &secret("alice-pw")).await.unwrap();

    let err = desk
        .api()
        .create_service(&ServiceInput {
            service_name: "Free stuff".to_string(),
            description: None,
            price: Decimal::ONE,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 403, .. }));
    assert_eq!(desk.api().list_services().await.unwrap().len(), 0);
}
