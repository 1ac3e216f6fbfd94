//! Customer vehicles.

use garage_core::{CustomerId, VehicleId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Customer, Nested, Resource};
use crate::api::ApiClient;
use crate::error::{ClientError, FieldErrors};

/// A vehicle registered to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(default)]
    pub customer: Option<Nested<Customer>>,
    pub vehicle_number: String,
    #[serde(default)]
    pub vehicle_type: String,
}

impl Vehicle {
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer.as_ref().map(Nested::id)
    }

    /// `"KA01AB1234 (Sedan)"`, or just the number when the type is blank.
    #[must_use]
    pub fn label(&self) -> String {
        if self.vehicle_type.trim().is_empty() {
            self.vehicle_number.clone()
        } else {
            format!("{} ({})", self.vehicle_number, self.vehicle_type)
        }
    }
}

impl Resource for Vehicle {
    type Id = VehicleId;

    fn id(&self) -> VehicleId {
        self.id
    }
}

/// Fields for adding or replacing a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub vehicle_number: String,
    pub vehicle_type: String,
}

impl VehicleInput {
    /// Check the input before it is sent.
    ///
    /// # Errors
    ///
    /// Returns field errors for a blank vehicle number or type.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.vehicle_number.trim().is_empty() {
            errors.push("vehicle_number", "This field may not be blank.");
        }
        if self.vehicle_type.trim().is_empty() {
            errors.push("vehicle_type", "This field may not be blank.");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl ApiClient {
    /// List vehicles visible to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, ClientError> {
        self.get("/vehicles/").await
    }

    /// Register a vehicle.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the input is invalid locally or
    /// refused by the backend.
    #[instrument(skip(self, input), fields(vehicle_number = %input.vehicle_number))]
    pub async fn create_vehicle(&self, input: &VehicleInput) -> Result<Vehicle, ClientError> {
        input.validate().map_err(ClientError::Validation)?;
        let vehicle: Vehicle = self.post("/vehicles/", input).await?;
        tracing::info!(vehicle_id = %vehicle.id, "Registered vehicle");
        Ok(vehicle)
    }

    /// Replace a vehicle's details.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the input is invalid locally or
    /// refused by the backend.
    #[instrument(skip(self, input), fields(vehicle_id = %id))]
    pub async fn update_vehicle(
        &self,
        id: VehicleId,
        input: &VehicleInput,
    ) -> Result<Vehicle, ClientError> {
        input.validate().map_err(ClientError::Validation)?;
        self.put(&format!("/vehicles/{id}/"), input).await
    }

    /// Remove a vehicle.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self), fields(vehicle_id = %id))]
    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<(), ClientError> {
        self.delete(&format!("/vehicles/{id}/")).await?;
        tracing::info!("Removed vehicle");
        Ok(())
    }
}
