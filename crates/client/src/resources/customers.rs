//! Customer accounts.

use garage_core::{CustomerId, PhoneNumber, Role, UserId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::Resource;
use crate::api::ApiClient;
use crate::error::ClientError;

/// The login account behind a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// A customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Customer {
    /// Full name, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let Some(user) = &self.user else {
            return format!("Customer #{}", self.id);
        };
        let full = format!("{} {}", user.first_name, user.last_name);
        let full = full.trim();
        if full.is_empty() {
            user.username.clone().unwrap_or_default()
        } else {
            full.to_string()
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.username.as_deref())
    }

    fn has_username(&self) -> bool {
        self.username().is_some()
    }
}

impl Resource for Customer {
    type Id = CustomerId;

    fn id(&self) -> CustomerId {
        self.id
    }
}

/// Editable customer fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneNumber>,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    #[serde(default)]
    is_active: Option<bool>,
}

impl ApiClient {
    /// List customers that have a login account.
    ///
    /// Entries without a user or username are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ClientError> {
        let customers: Vec<Customer> = self.get("/customers/").await?;
        let total = customers.len();
        let customers: Vec<Customer> = customers.into_iter().filter(Customer::has_username).collect();
        if customers.len() < total {
            tracing::debug!(
                dropped = total - customers.len(),
                "Skipped customers without a login account"
            );
        }
        Ok(customers)
    }

    /// Profile of the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn my_profile(&self) -> Result<Customer, ClientError> {
        self.get("/customers/me/").await
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the customer does not exist.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, ClientError> {
        self.get(&format!("/customers/{id}/")).await
    }

    /// Update a customer's details.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the backend refuses a field.
    #[instrument(skip(self, input), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, ClientError> {
        self.patch(&format!("/customers/{id}/"), input).await
    }

    /// Create a customer profile.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the backend refuses a field.
    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, ClientError> {
        let customer: Customer = self.post("/customers/", input).await?;
        tracing::info!(customer_id = %customer.id, "Created customer");
        Ok(customer)
    }

    /// Suspend or reactivate a customer account.
    ///
    /// Returns the new active flag when the backend reports it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn toggle_customer_status(&self, id: CustomerId) -> Result<Option<bool>, ClientError> {
        let response: ToggleResponse = self
            .post(&format!("/customers/{id}/toggle_status/"), &serde_json::json!({}))
            .await?;
        tracing::info!(is_active = ?response.is_active, "Toggled customer status");
        Ok(response.is_active)
    }
}
