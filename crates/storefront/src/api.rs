//! Marketplace REST API client.
//!
//! Shared by the server-backed carts and the catalog. Knows the base URL, the
//! optional bearer token, and how to turn a non-success response into an
//! [`ApiError`]. Response bodies are returned as text; callers parse them.

use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::error;
use url::Url;

/// Errors that can occur when calling the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Status { status, .. } => Some(*status),
        }
    }
}

/// Marketplace REST API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Option<SecretString>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &Url) -> Self {
        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            bearer: None,
        }
    }

    /// Send `token` as a bearer credential on every request.
    #[must_use]
    pub fn with_bearer(mut self, token: SecretString) -> Self {
        self.bearer = Some(token);
        self
    }

    /// Build a URL from already-encoded path segments.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request, attaching the bearer token if configured.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.bearer {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and read its body, mapping non-success statuses to errors.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the request fails and `ApiError::Status`
    /// if the server answers with a non-success status.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Marketplace API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }
}
