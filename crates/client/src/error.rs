//! Client error types and backend error classification.

use std::collections::BTreeMap;
use std::fmt;

use garage_core::ClaimsError;
use serde_json::Value;
use thiserror::Error;

use crate::token_store::TokenStoreError;

/// Authentication and session failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The backend refused the username/password pair.
    #[error("Login failed. Check credentials.")]
    InvalidCredentials,

    /// The account exists but has been suspended by an admin.
    #[error("Your account has been suspended. Please contact support.")]
    AccountSuspended,

    /// No session: the call needs a signed-in user.
    #[error("Not signed in. Run `garage login` first.")]
    NotAuthenticated,

    /// The backend rejected the access token; the session has been cleared.
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    /// The access token payload could not be decoded.
    #[error("Invalid access token: {0}")]
    Claims(#[from] ClaimsError),
}

/// Errors that can occur when talking to the garage backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The backend refused a status change (HTTP 400/409 naming the status).
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// The backend rejected one or more fields.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Token persistence failed.
    #[error("Token storage error: {0}")]
    Storage(#[from] TokenStoreError),
}

impl ClientError {
    /// One-line message suitable for showing to the user.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Auth(e) => e.to_string(),
            Self::InvalidTransition(message) => message.clone(),
            Self::Validation(errors) => errors
                .first_message()
                .unwrap_or_else(|| "Please check the submitted values.".to_string()),
            Self::NotFound(message) => message.clone(),
            Self::Api { status: 403, .. } => {
                "You do not have permission to perform this action.".to_string()
            }
            Self::Api { message, .. } => message.clone(),
            Self::Network(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Parse(_) => "The server sent an unexpected response.".to_string(),
            Self::Storage(_) => "Could not save your session on this machine.".to_string(),
        }
    }
}

/// Field-level validation messages in the backend's `{field: [messages]}` shape.
///
/// `non_field_errors`, `detail` and `error` keys are collected as general
/// messages rather than field messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub general: Vec<String>,
}

impl FieldErrors {
    const GENERAL_KEYS: [&'static str; 4] = ["non_field_errors", "detail", "error", "message"];

    /// Parse a JSON error body. Returns `None` if the body is not an object
    /// or a list of messages.
    #[must_use]
    pub fn from_json(body: &Value) -> Option<Self> {
        let mut errors = Self::default();
        match body {
            Value::Object(map) => {
                for (key, value) in map {
                    let messages = collect_messages(value);
                    if messages.is_empty() {
                        continue;
                    }
                    if Self::GENERAL_KEYS.contains(&key.as_str()) {
                        errors.general.extend(messages);
                    } else {
                        errors.fields.insert(key.clone(), messages);
                    }
                }
            }
            Value::Array(_) | Value::String(_) => errors.general = collect_messages(body),
            _ => return None,
        }
        Some(errors)
    }

    /// Add a message for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    #[must_use]
    pub fn has_field_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Messages for a single field.
    #[must_use]
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map_or(&[], Vec::as_slice)
    }

    /// The first message, general messages first.
    #[must_use]
    pub fn first_message(&self) -> Option<String> {
        self.general.first().cloned().or_else(|| {
            self.fields
                .values()
                .find_map(|messages| messages.first())
                .cloned()
        })
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .general
            .iter()
            .cloned()
            .chain(
                self.fields
                    .iter()
                    .map(|(field, messages)| format!("{field}: {}", messages.join(" "))),
            )
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<garage_core::FieldError> for FieldErrors {
    fn from(error: garage_core::FieldError) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(error.field, vec![error.message]);
        Self {
            fields,
            general: Vec::new(),
        }
    }
}

fn collect_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(collect_messages).collect(),
        Value::Object(map) => map.values().flat_map(collect_messages).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Map a non-success response to a [`ClientError`].
///
/// - 401: the session is no longer valid
/// - 404: not found
/// - 409, or 400 whose general message names a status or transition: the
///   backend refused a status change
/// - 400 otherwise: field validation
/// - anything else: a generic API error with the best message found
#[must_use]
pub fn classify_error(status: u16, body: &str) -> ClientError {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let errors = json.as_ref().and_then(FieldErrors::from_json);
    let message = errors
        .as_ref()
        .and_then(FieldErrors::first_message)
        .unwrap_or_else(|| fallback_message(status, body));

    match status {
        401 => ClientError::Auth(AuthError::SessionExpired),
        404 => ClientError::NotFound(message),
        409 => ClientError::InvalidTransition(message),
        400 => match errors {
            Some(errors) if !errors.has_field_errors() && names_status_change(&message) => {
                ClientError::InvalidTransition(message)
            }
            Some(errors) if !errors.is_empty() => ClientError::Validation(errors),
            _ => ClientError::Api { status, message },
        },
        _ => ClientError::Api { status, message },
    }
}

fn names_status_change(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("status") || lower.contains("transition")
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() || body.starts_with('<') {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Whether a failed login response signals a suspended account.
///
/// Matches `code == "user_suspended"` at the top level or nested under
/// `detail`, or a `detail` string mentioning "suspended".
#[must_use]
pub fn is_suspended_response(body: &Value) -> bool {
    const SUSPENDED: &str = "user_suspended";

    if body.get("code").and_then(Value::as_str) == Some(SUSPENDED) {
        return true;
    }
    match body.get("detail") {
        Some(Value::Object(detail)) => {
            detail.get("code").and_then(Value::as_str) == Some(SUSPENDED)
        }
        Some(Value::String(detail)) => detail.to_lowercase().contains("suspended"),
        _ => false,
    }
}
