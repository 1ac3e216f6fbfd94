//! Command implementations.
//!
//! Every command runs against a [`Context`] built once per invocation: the
//! configuration, the persisted session and a [`BookingDesk`] over them.

use std::sync::Arc;

use garage_client::{
    ApiClient, BookingDesk, ClientConfig, ClientError, ConfigError, DeskError, FieldErrors,
    FileTokenStore, SessionStore, TokenStoreError,
};
use thiserror::Error;

pub mod auth;
pub mod bookings;
pub mod customers;
pub mod dashboard;
pub mod invoices;
pub mod services;
pub mod vehicles;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An action was refused or failed; the notice is user-facing.
    #[error("{}", desk_notice(.0))]
    Desk(#[from] DeskError),

    /// Input was rejected before it was sent.
    #[error("{0}")]
    Invalid(FieldErrors),

    /// The session file could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(#[from] TokenStoreError),

    /// A local file could not be written.
    #[error("Could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ClientError> for CommandError {
    fn from(e: ClientError) -> Self {
        Self::Desk(DeskError::Client(e))
    }
}

const LOGIN_HINT: &str = "Run `garage login` first.";

fn desk_notice(e: &DeskError) -> String {
    let notice = e.notice();
    match e.redirect() {
        Some(route) if route.required_role().is_none() && !notice.contains(LOGIN_HINT) => {
            format!("{notice} {LOGIN_HINT}")
        }
        _ => notice,
    }
}

/// Shared state for one CLI invocation.
pub struct Context {
    pub desk: BookingDesk,
}

impl Context {
    /// Load configuration and restore any persisted session.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Config` for invalid settings, or a client error
    /// if the HTTP client cannot be built.
    pub fn load() -> Result<Self, CommandError> {
        let config = ClientConfig::from_env()?;
        let session = SessionStore::new(Arc::new(FileTokenStore::new(config.token_path.clone())));
        if let Some(principal) = session.restore() {
            tracing::debug!(role = %principal.role, "Using stored session");
        }
        let api = ApiClient::new(config, session)?;
        Ok(Self {
            desk: BookingDesk::new(api),
        })
    }

    pub const fn api(&self) -> &ApiClient {
        self.desk.api()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use garage_client::AuthError;
    use garage_core::Route;

    #[test]
    fn test_login_redirect_suggests_login_command() {
        let err = CommandError::from(DeskError::Denied(Route::Login));
        assert_eq!(
            err.to_string(),
            "Please sign in to continue. Run `garage login` first."
        );
    }

    #[test]
    fn test_wrong_role_has_no_login_hint() {
        let err = CommandError::from(DeskError::Denied(Route::Home));
        assert_eq!(err.to_string(), "You do not have access to that page.");
    }

    #[test]
    fn test_expired_session_suggests_login() {
        let err = CommandError::from(ClientError::Auth(AuthError::SessionExpired));
        assert!(err.to_string().ends_with("Run `garage login` first."));
    }

    #[test]
    fn test_login_hint_not_repeated() {
        let err = CommandError::from(DeskError::Client(ClientError::Auth(
            AuthError::NotAuthenticated,
        )));
        let notice = err.to_string();
        assert_eq!(notice.matches("garage login").count(), 1);
        assert!(notice.ends_with("Run `garage login` first."));
    }
}
