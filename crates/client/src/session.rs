//! Session store: the signed-in identity and its tokens.
//!
//! The role comes only from the decoded access token, never from anything
//! the caller supplies. The decode is not signature-checked; see
//! [`garage_core::claims`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use garage_core::{Principal, Role, decode_claims};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, ClientError};
use crate::token_store::{StoredTokens, TokenStore, TokenStoreError};

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    pub principal: Principal,
    pub access: SecretString,
    pub refresh: Option<SecretString>,
}

impl Session {
    #[must_use]
    pub const fn role(&self) -> Role {
        self.principal.role
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("principal", &self.principal)
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Shared session state, backed by a [`TokenStore`].
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    tokens: Arc<dyn TokenStore>,
    current: RwLock<Option<Session>>,
    generation: AtomicU64,
}

impl SessionStore {
    /// Create an unauthenticated session store over `tokens`.
    ///
    /// Call [`SessionStore::restore`] to pick up a persisted session.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                tokens,
                current: RwLock::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Restore a session from persisted tokens without a network call.
    ///
    /// A token that fails to decode is removed from storage and the session
    /// stays unauthenticated. A decodable token authenticates provisionally;
    /// the backend validates it on the first request.
    pub fn restore(&self) -> Option<Principal> {
        let stored = match self.inner.tokens.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted tokens");
                return None;
            }
        };

        match decode_claims(stored.access.expose_secret()) {
            Ok(claims) => {
                let principal = claims.principal("");
                tracing::debug!(
                    username = %principal.username,
                    role = %principal.role,
                    "Restored session from persisted token"
                );
                self.replace(Some(Session {
                    principal: principal.clone(),
                    access: stored.access,
                    refresh: stored.refresh,
                }));
                Some(principal)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable persisted token");
                if let Err(e) = self.inner.tokens.clear() {
                    tracing::warn!(error = %e, "Could not clear persisted tokens");
                }
                self.replace(None);
                None
            }
        }
    }

    /// Start a session from a freshly issued token pair and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Claims` if the access token cannot be decoded, or
    /// `ClientError::Storage` if it cannot be persisted. The session is left
    /// unchanged on error.
    pub fn establish(
        &self,
        tokens: StoredTokens,
        username: &str,
    ) -> Result<Principal, ClientError> {
        let claims = decode_claims(tokens.access.expose_secret()).map_err(AuthError::from)?;
        let principal = claims.principal(username);

        self.inner.tokens.save(&tokens)?;
        self.replace(Some(Session {
            principal: principal.clone(),
            access: tokens.access,
            refresh: tokens.refresh,
        }));
        Ok(principal)
    }

    /// End the session and remove persisted tokens. No network call.
    ///
    /// The in-memory session is cleared even if the token file cannot be
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if the persisted tokens cannot be removed.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        self.replace(None);
        self.inner.tokens.clear()
    }

    /// Clear the session after the backend rejected its token.
    pub fn teardown(&self) {
        tracing::info!("Session rejected by server, signing out");
        if let Err(e) = self.logout() {
            tracing::warn!(error = %e, "Could not clear persisted tokens");
        }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Identity of the signed-in user, if any.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.read().as_ref().map(|s| s.principal.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Access token for the `Authorization` header.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|s| s.access.clone())
    }

    /// Counter bumped every time the session is replaced or cleared.
    ///
    /// Data loaded under one generation belongs to that identity only.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    fn replace(&self, session: Option<Session>) {
        let mut current = self.write();
        *current = session;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    // A panic while holding the lock cannot leave a half-written Option behind
    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &*self.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn token(role: &str, username: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "role": role, "username": username, "user_id": 7 }).to_string(),
        );
        format!("{header}.{body}.sig")
    }

    fn store_with(tokens: Option<StoredTokens>) -> (SessionStore, Arc<MemoryTokenStore>) {
        let memory = Arc::new(tokens.map_or_else(MemoryTokenStore::new, MemoryTokenStore::with_tokens));
        (SessionStore::new(memory.clone()), memory)
    }

    #[test]
    fn test_restore_without_tokens_is_unauthenticated() {
        let (session, _) = store_with(None);
        assert!(session.restore().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_restore_decodes_role() {
        let (session, _) = store_with(Some(StoredTokens::new(token("ADMIN", "boss"), None)));
        let principal = session.restore().unwrap();
        assert_eq!(principal.role, Role::Admin);
        assert_eq!(principal.username, "boss");
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_restore_garbage_token_clears_storage() {
        let (session, memory) = store_with(Some(StoredTokens::new("garbage", None)));
        assert!(session.restore().is_none());
        assert!(!session.is_authenticated());
        assert!(memory.load().unwrap().is_none());
    }

    #[test]
    fn test_establish_persists_and_logout_clears() {
        let (session, memory) = store_with(None);
        let principal = session
            .establish(
                StoredTokens::new(token("CUSTOMER", "jo"), Some("r".to_string())),
                "jo",
            )
            .unwrap();
        assert_eq!(principal.role, Role::Customer);
        assert!(memory.load().unwrap().is_some());

        session.logout().unwrap();
        assert!(session.current().is_none());
        assert!(memory.load().unwrap().is_none());
    }

    #[test]
    fn test_establish_rejects_undecodable_token() {
        let (session, memory) = store_with(None);
        let err = session
            .establish(StoredTokens::new("nope", None), "jo")
            .unwrap_err();
        assert!(matches!(err, ClientError::Auth(AuthError::Claims(_))));
        assert!(!session.is_authenticated());
        assert!(memory.load().unwrap().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let (session, _) = store_with(Some(StoredTokens::new(token("ADMIN", "a"), None)));
        let other = session.clone();
        session.restore();
        assert!(other.is_authenticated());
        other.teardown();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_identity_change_bumps_generation() {
        let (session, _) = store_with(None);
        let start = session.generation();

        session
            .establish(StoredTokens::new(token("ADMIN", "boss"), None), "boss")
            .unwrap();
        let admin = session.generation();
        assert!(admin > start);

        session.logout().unwrap();
        let signed_out = session.generation();
        assert!(signed_out > admin);

        // A failed login leaves the current identity alone
        assert!(session.establish(StoredTokens::new("nope", None), "jo").is_err());
        assert_eq!(session.generation(), signed_out);

        session
            .establish(StoredTokens::new(token("CUSTOMER", "jo"), None), "jo")
            .unwrap();
        assert!(session.generation() > signed_out);
        assert_eq!(session.clone().generation(), session.generation());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let t = token("ADMIN", "a");
        let (session, _) = store_with(Some(StoredTokens::new(t.clone(), None)));
        session.restore();
        assert!(!format!("{session:?}").contains(&t));
    }
}
