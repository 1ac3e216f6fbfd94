//! Service catalogue.

use garage_core::{ServiceId, format_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::Resource;
use crate::api::ApiClient;
use crate::error::{ClientError, FieldErrors};

/// A service the garage offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub service_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
}

impl Service {
    /// Price formatted for display.
    #[must_use]
    pub fn price_label(&self) -> String {
        format_money(self.price)
    }
}

impl Resource for Service {
    type Id = ServiceId;

    fn id(&self) -> ServiceId {
        self.id
    }
}

/// Fields for creating or updating a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInput {
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
}

impl ServiceInput {
    /// Check the input before it is sent.
    ///
    /// # Errors
    ///
    /// Returns field errors for a blank name or a price that is not positive.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.service_name.trim().is_empty() {
            errors.push("service_name", "This field may not be blank.");
        }
        if self.price <= Decimal::ZERO {
            errors.push("price", "Price must be greater than zero.");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl ApiClient {
    /// List all services.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        self.get("/services/").await
    }

    /// Get a service by ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the service does not exist.
    #[instrument(skip(self), fields(service_id = %id))]
    pub async fn get_service(&self, id: ServiceId) -> Result<Service, ClientError> {
        self.get(&format!("/services/{id}/")).await
    }

    /// Create a service.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the input is invalid locally or
    /// refused by the backend.
    #[instrument(skip(self, input), fields(service_name = %input.service_name))]
    pub async fn create_service(&self, input: &ServiceInput) -> Result<Service, ClientError> {
        input.validate().map_err(ClientError::Validation)?;
        let service: Service = self.post("/services/", input).await?;
        tracing::info!(service_id = %service.id, "Created service");
        Ok(service)
    }

    /// Update a service.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the input is invalid locally or
    /// refused by the backend.
    #[instrument(skip(self, input), fields(service_id = %id))]
    pub async fn update_service(
        &self,
        id: ServiceId,
        input: &ServiceInput,
    ) -> Result<Service, ClientError> {
        input.validate().map_err(ClientError::Validation)?;
        self.patch(&format!("/services/{id}/"), input).await
    }

    /// Delete a service.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self), fields(service_id = %id))]
    pub async fn delete_service(&self, id: ServiceId) -> Result<(), ClientError> {
        self.delete(&format!("/services/{id}/")).await?;
        tracing::info!("Deleted service");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_service_input_validation() {
        let mut input = ServiceInput {
            service_name: "Wheel alignment".to_string(),
            description: None,
            price: Decimal::new(80000, 2),
        };
        assert!(input.validate().is_ok());

        input.price = Decimal::ZERO;
        input.service_name = "  ".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.field("price"), ["Price must be greater than zero."]);
        assert!(!errors.field("service_name").is_empty());
    }

    #[test]
    fn test_price_label() {
        let service = Service {
            id: ServiceId::new(1),
            service_name: "Wash".to_string(),
            description: None,
            price: Decimal::new(2505, 1),
        };
        assert_eq!(service.price_label(), "Rs. 250.50");
    }
}
