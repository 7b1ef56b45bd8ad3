//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CAMPUS_MARKET_API_URL` - Marketplace REST API base URL (default: `http://localhost:5000`)
//! - `CAMPUS_MARKET_CART_MODE` - Cart backend: `local`, `session` or `authenticated` (default: `local`)
//! - `CAMPUS_MARKET_STORAGE_DIR` - Directory for durable client storage (default: `.campus-market`)
//! - `CAMPUS_MARKET_HTTP_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `CAMPUS_MARKET_CATALOG_TTL_SECS` - Product catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Required in `authenticated` mode
//! - `CAMPUS_MARKET_AUTH_TOKEN` - Bearer token for the authenticated cart API

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_STORAGE_DIR: &str = ".campus-market";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which backend holds the durable cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartMode {
    /// Cart lives in durable client storage only.
    #[default]
    Local,
    /// Cart lives on the server, keyed by the anonymous session id.
    Session,
    /// Cart lives on the server, keyed by the authenticated user.
    Authenticated,
}

impl FromStr for CartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "session" => Ok(Self::Session),
            "authenticated" | "auth" => Ok(Self::Authenticated),
            other => Err(format!(
                "unknown cart mode '{other}' (expected local, session or authenticated)"
            )),
        }
    }
}

impl fmt::Display for CartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Session => "session",
            Self::Authenticated => "authenticated",
        })
    }
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Marketplace REST API base URL
    pub api_url: Url,
    /// Cart backend selection
    pub cart_mode: CartMode,
    /// Directory backing durable client storage
    pub storage_dir: PathBuf,
    /// Bearer token for the authenticated cart API
    pub auth_token: Option<SecretString>,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// How long catalog responses are cached
    pub catalog_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("cart_mode", &self.cart_mode)
            .field("storage_dir", &self.storage_dir)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("http_timeout", &self.http_timeout)
            .field("catalog_ttl", &self.catalog_ttl)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, or if authenticated
    /// mode is selected without a usable auth token.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let api_url = parse_var(
            "CAMPUS_MARKET_API_URL",
            &env.or_default("CAMPUS_MARKET_API_URL", DEFAULT_API_URL),
        )?;
        let cart_mode = parse_var(
            "CAMPUS_MARKET_CART_MODE",
            &env.or_default("CAMPUS_MARKET_CART_MODE", "local"),
        )?;
        let storage_dir =
            PathBuf::from(env.or_default("CAMPUS_MARKET_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let http_timeout = Duration::from_secs(parse_var(
            "CAMPUS_MARKET_HTTP_TIMEOUT_SECS",
            &env.or_default("CAMPUS_MARKET_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
        )?);
        let catalog_ttl = Duration::from_secs(parse_var(
            "CAMPUS_MARKET_CATALOG_TTL_SECS",
            &env.or_default("CAMPUS_MARKET_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS),
        )?);

        let auth_token = match env.optional("CAMPUS_MARKET_AUTH_TOKEN") {
            Some(token) => Some(SecretString::from(token)),
            None if cart_mode == CartMode::Authenticated => {
                return Err(ConfigError::MissingEnvVar(
                    "CAMPUS_MARKET_AUTH_TOKEN".to_string(),
                ));
            }
            None => None,
        };

        Ok(Self {
            api_url,
            cart_mode,
            storage_dir,
            auth_token,
            http_timeout,
            catalog_ttl,
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    #[must_use]
    pub fn for_api(api_url: Url, cart_mode: CartMode) -> Self {
        Self {
            api_url,
            cart_mode,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            auth_token: None,
            http_timeout: Duration::from_secs(10),
            catalog_ttl: Duration::from_secs(300),
            sentry_dsn: None,
        }
    }

    /// Expose the auth token for building request headers.
    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_ref().map(|token| token.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
