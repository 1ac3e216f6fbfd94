//! HTTP transport for the garage REST API.
//!
//! Every call except the login and registration endpoints carries the
//! session's bearer token. A call made without a session fails locally,
//! and a 401 from the backend tears the session down.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::error::{AuthError, ClientError, classify_error};
use crate::session::SessionStore;

/// Garage REST API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    config: ClientConfig,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` if the HTTP client fails to build.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("garage-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                config,
                session,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    // =========================================================================
    // Authenticated requests
    // =========================================================================

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::handle_response(response).await
    }

    /// Execute a bodiless POST whose response body is not needed.
    pub(crate) async fn post_action(&self, path: &str) -> Result<(), ClientError> {
        let response = self.send(Method::POST, path, None::<&()>).await?;
        Self::expect_success(response).await
    }

    /// Execute a POST with a JSON body whose response body is not needed.
    pub(crate) async fn post_action_with<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::expect_success(response).await
    }

    /// Execute a PATCH request.
    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(Method::PATCH, path, Some(body)).await?;
        Self::handle_response(response).await
    }

    /// Execute a PUT request.
    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        Self::handle_response(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.send(Method::DELETE, path, None::<&()>).await?;
        Self::expect_success(response).await
    }

    /// Execute a GET request for a binary body.
    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    #[instrument(skip(self, body), fields(status = tracing::field::Empty))]
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        // Read fresh on every call so a logout elsewhere takes effect at once
        let token = self
            .inner
            .session
            .access_token()
            .ok_or(AuthError::NotAuthenticated)?;

        let mut request = self
            .request(method, path)
            .bearer_auth(token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::Span::current().record("status", response.status().as_u16());

        if response.status() == StatusCode::UNAUTHORIZED {
            self.inner.session.teardown();
            return Err(AuthError::SessionExpired.into());
        }
        Ok(response)
    }

    // =========================================================================
    // Public requests
    // =========================================================================

    /// POST to an endpoint that needs no session, returning the raw response.
    ///
    /// A 401 here is the caller's business: it never touches the session.
    pub(crate) async fn post_public<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        Ok(self.request(Method::POST, path).json(body).send().await?)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.inner.config.endpoint(path);
        tracing::debug!(%method, %url, "API request");
        self.inner.client.request(method, url)
    }

    // =========================================================================
    // Response handling
    // =========================================================================

    /// Handle API response and parse JSON.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::Parse(format!("Failed to parse response: {e}")));
        }
        Err(Self::parse_error(response).await)
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Parse an error response from the backend.
    pub(crate) async fn parse_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = classify_error(status, &body);
        tracing::debug!(status, error = %error, "API error response");
        error
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;

    fn client() -> ApiClient {
        // Port 9 (discard) is never contacted: the call fails before sending
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let session = SessionStore::new(Arc::new(MemoryTokenStore::new()));
        ApiClient::new(config, session).unwrap()
    }

    #[tokio::test]
    async fn test_call_without_session_fails_locally() {
        let err = client()
            .get::<serde_json::Value>("/bookings/")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Auth(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_delete_without_session_fails_locally() {
        let err = client().delete("/bookings/1/").await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("127.0.0.1:9"));
    }
}
