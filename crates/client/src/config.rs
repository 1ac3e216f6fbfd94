//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `GARAGE_API_URL` - Backend API base URL (default: `http://127.0.0.1:8000/api`)
//! - `GARAGE_TOKEN_PATH` - Token file location (default: `$HOME/.garage/tokens.json`)
//! - `GARAGE_HTTP_TIMEOUT_SECS` - Overall HTTP request timeout (default: 30)
//! - `GARAGE_CACHE_TTL_SECS` - Booking cache time-to-live (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend URL, matching the development server.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const TOKEN_FILE: &str = "tokens.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Garage client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL, without a trailing slash
    pub api_url: Url,
    /// Where the access and refresh tokens are persisted
    pub token_path: PathBuf,
    /// Overall timeout for a single HTTP request
    pub http_timeout: Duration,
    /// How long cached bookings stay valid without a refresh
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Configuration for `api_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("GARAGE_API_URL", api_url)?,
            token_path: default_token_path(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("GARAGE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url("GARAGE_API_URL", &api_url)?;

        let token_path = lookup("GARAGE_TOKEN_PATH")
            .filter(|p| !p.trim().is_empty())
            .map_or_else(default_token_path, PathBuf::from);

        let http_timeout = Duration::from_secs(parse_secs(
            "GARAGE_HTTP_TIMEOUT_SECS",
            lookup("GARAGE_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let cache_ttl = Duration::from_secs(parse_secs(
            "GARAGE_CACHE_TTL_SECS",
            lookup("GARAGE_CACHE_TTL_SECS"),
            DEFAULT_CACHE_TTL_SECS,
        )?);

        Ok(Self {
            api_url,
            token_path,
            http_timeout,
            cache_ttl,
        })
    }

    /// Override the token file location.
    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Absolute URL for an API path such as `/bookings/`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_api_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

/// `$HOME/.garage/tokens.json`, or `.garage/tokens.json` when no home
/// directory is known.
fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map_or_else(PathBuf::new, PathBuf::from)
        .join(".garage")
        .join(TOKEN_FILE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:8000/api");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.token_path.ends_with(".garage/tokens.json"));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("GARAGE_API_URL", "https://garage.example/api/"),
            ("GARAGE_TOKEN_PATH", "/tmp/garage-tokens.json"),
            ("GARAGE_HTTP_TIMEOUT_SECS", "5"),
            ("GARAGE_CACHE_TTL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.token_path, PathBuf::from("/tmp/garage-tokens.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(
            config.endpoint("/bookings/"),
            "https://garage.example/api/bookings/"
        );
    }

    #[test]
    fn test_invalid_url() {
        let err = ClientConfig::from_lookup(lookup(&[("GARAGE_API_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "GARAGE_API_URL"));

        let err = ClientConfig::from_lookup(lookup(&[("GARAGE_API_URL", "ftp://x/api")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        for bad in ["0", "soon", "-1"] {
            let err = ClientConfig::from_lookup(lookup(&[("GARAGE_HTTP_TIMEOUT_SECS", bad)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            config.endpoint("bookings/4/approve/"),
            "http://localhost:8000/api/bookings/4/approve/"
        );
    }
}
