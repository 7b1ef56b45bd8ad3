//! Unified error handling.
//!
//! The cart store absorbs its own failures; everything else a caller can hit
//! (configuration, catalog lookups, building the runtime) surfaces as
//! [`AppError`].

use thiserror::Error;

use crate::backend::BackendError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Application-level error type for the storefront runtime.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cart backend could not be built or reached.
    #[error("Cart backend error: {0}")]
    Backend(#[from] BackendError),

    /// Catalog could not be fetched.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Process exit code for this error (`sysexits.h` conventions).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78,
            Self::NotFound(_) => 66,
            Self::Backend(_) | Self::Catalog(_) | Self::HttpClient(_) => 69,
        }
    }

    /// Whether this error indicates a bug or outage worth reporting.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::NotFound(_))
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
