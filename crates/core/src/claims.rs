//! Access token payload decoding.
//!
//! The client has no signing key, so it reads the JWT payload without
//! verifying the signature. The decoded role is provisional: it decides what
//! to show, while the backend validates the token on every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use thiserror::Error;

use crate::access::Principal;
use crate::types::{Role, UserId};

/// Errors that can occur while decoding a token payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not valid base64")]
    Encoding,
    #[error("token payload is not valid JSON: {0}")]
    Json(String),
}

/// Claims read from the access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Expiry as a Unix timestamp, when the issuer includes one.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Whether the token had expired at `now` (Unix seconds).
    ///
    /// Tokens without an `exp` claim never count as expired here.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| now >= exp)
    }

    /// Build the session identity, falling back to `username` when the token
    /// carries none.
    #[must_use]
    pub fn principal(&self, fallback_username: &str) -> Principal {
        Principal {
            user_id: self.user_id,
            username: self
                .username
                .clone()
                .unwrap_or_else(|| fallback_username.to_owned()),
            role: self.role,
        }
    }
}

/// Decode the payload segment of a JWT.
///
/// # Errors
///
/// Returns [`ClaimsError`] if the token does not have three segments, the
/// payload is not URL-safe base64, or it does not contain a valid `role`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ClaimsError::Malformed);
    };

    // Some issuers pad the payload; the URL-safe engine here does not accept it.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| ClaimsError::Encoding)?;

    serde_json::from_slice(&bytes).map_err(|e| ClaimsError::Json(e.to_string()))
}
