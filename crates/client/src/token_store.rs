//! Persistence for the access and refresh tokens.
//!
//! Tokens survive a restart in a small JSON file, `{"access": ..., "refresh": ...}`.
//! On Unix the file is written with owner-only permissions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing persisted tokens.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt token file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An access/refresh token pair.
#[derive(Clone)]
pub struct StoredTokens {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
}

impl StoredTokens {
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: refresh.map(SecretString::from),
        }
    }
}

impl std::fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTokens")
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// On-disk shape of the token file.
#[derive(Serialize, Deserialize)]
struct TokenFile {
    access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

/// Storage medium for the session tokens.
pub trait TokenStore: Send + Sync {
    /// Load persisted tokens, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if the medium cannot be read.
    fn load(&self) -> Result<Option<StoredTokens>, TokenStoreError>;

    /// Persist `tokens`, replacing anything stored before.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if the medium cannot be written.
    fn save(&self, tokens: &StoredTokens) -> Result<(), TokenStoreError>;

    /// Remove persisted tokens. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError` if the medium cannot be written.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

// =============================================================================
// File-backed store
// =============================================================================

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredTokens>, TokenStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let file: TokenFile =
            serde_json::from_str(&contents).map_err(|source| TokenStoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(StoredTokens::new(file.access, file.refresh)))
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = TokenFile {
            access: tokens.access.expose_secret().to_owned(),
            refresh: tokens
                .refresh
                .as_ref()
                .map(|r| r.expose_secret().to_owned()),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        write_private(&self.path, &json).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "Saved session tokens");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed session tokens");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a pre-existing file too
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

// =============================================================================
// In-memory store
// =============================================================================

/// Token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `tokens`.
    #[must_use]
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredTokens>, TokenStoreError> {
        Ok(self
            .tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), TokenStoreError> {
        *self
            .tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self
            .tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_path(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("garage-token-store-{}-{n}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let path = scratch_path("tokens.json");
        let store = FileTokenStore::new(&path);
        assert!(store.load().unwrap().is_none());

        store
            .save(&StoredTokens::new("access-1", Some("refresh-1".to_string())))
            .unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access.expose_secret(), "access-1");
        assert_eq!(
            loaded.refresh.as_ref().map(|r| r.expose_secret().to_owned()),
            Some("refresh-1".to_string())
        );

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_uses_access_refresh_keys() {
        let path = scratch_path("tokens.json");
        let store = FileTokenStore::new(&path);
        store.save(&StoredTokens::new("a", Some("r".to_string()))).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["access"], "a");
        assert_eq!(raw["refresh"], "r");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = scratch_path("tokens.json");
        FileTokenStore::new(&path)
            .save(&StoredTokens::new("a", None))
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let path = scratch_path("tokens.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileTokenStore::new(&path).load(),
            Err(TokenStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = StoredTokens::new("super-secret", Some("also-secret".to_string()));
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("also-secret"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        store.save(&StoredTokens::new("x", None)).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
