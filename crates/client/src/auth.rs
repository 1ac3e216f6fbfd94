//! Login, registration and logout.

use garage_core::{Email, Principal};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::api::ApiClient;
use crate::error::{AuthError, ClientError, classify_error, is_suspended_response};
use crate::token_store::{StoredTokens, TokenStoreError};

const TOKEN_PATH: &str = "/token/";
const REGISTER_PATH: &str = "/auth/register/";

/// A customer sign-up request.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Serialize)]
struct RegistrationBody<'a> {
    username: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

impl ApiClient {
    /// Exchange credentials for a token pair and start a session.
    ///
    /// A failed login never clears an existing session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountSuspended` if the backend flags the account
    /// as suspended, `AuthError::InvalidCredentials` for any other refusal,
    /// or a transport/storage error.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, ClientError> {
        let body = Credentials {
            username,
            password: password.expose_secret(),
        };
        let response = self.post_public(TOKEN_PATH, &body).await?;
        let status = response.status();

        if status.is_success() {
            let pair: TokenPair = Self::handle_response(response).await?;
            let principal = self
                .session()
                .establish(StoredTokens::new(pair.access, pair.refresh), username)?;
            tracing::info!(role = %principal.role, "Logged in");
            return Ok(principal);
        }

        let text = response.text().await.unwrap_or_default();
        let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if is_suspended_response(&json) {
            tracing::warn!("Login refused: account suspended");
            return Err(AuthError::AccountSuspended.into());
        }
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), "Login refused");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(classify_error(status.as_u16(), &text))
    }

    /// Create a customer account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` with the backend's field messages if
    /// the registration is refused.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        let body = RegistrationBody {
            username: &registration.username,
            password: registration.password.expose_secret(),
            first_name: &registration.first_name,
            last_name: &registration.last_name,
            email: registration.email.as_str(),
        };
        let response = self.post_public(REGISTER_PATH, &body).await?;
        let status = response.status();
        if status.is_success() {
            tracing::info!("Registered new customer account");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &text))
    }

    /// End the session locally. No network call.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if the persisted tokens cannot be removed;
    /// the in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        self.session().logout()?;
        tracing::info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_debug_hides_password() {
        let registration = Registration {
            username: "jo".to_string(),
            password: SecretString::from("hunter22".to_string()),
            first_name: "Jo".to_string(),
            last_name: "Bloggs".to_string(),
            email: Email::parse("jo@example.com").unwrap(),
        };
        let debug = format!("{registration:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("jo@example.com"));
    }
}
