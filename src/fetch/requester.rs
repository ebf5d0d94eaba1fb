//! Backend requester
//!
//! The `Requester` trait is the seam between the fetch logic and the HTTP
//! stack. `AuthenticatedRequester` is the reqwest implementation: it joins
//! relative paths onto the configured base URL and attaches the bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;

use super::error::{FetchError, FetchResult};

/// Where a GET request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Path relative to the backend base URL (first page)
    Path(String),
    /// Absolute URL handed back by the server (`next` links)
    Absolute(String),
}

impl Target {
    pub fn as_str(&self) -> &str {
        match self {
            Target::Path(p) => p,
            Target::Absolute(u) => u,
        }
    }
}

/// Raw HTTP response as seen by the fetch layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs authenticated GET requests against the backend
#[async_trait]
pub trait Requester: Send + Sync {
    /// Issue one GET request.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// transport failures are errors.
    async fn get(&self, target: &Target) -> FetchResult<HttpResponse>;

    /// URL the target resolves to, for logs and error reports
    fn resolve_url(&self, target: &Target) -> String {
        target.as_str().to_string()
    }
}

/// Configuration for the reqwest requester
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    /// Base URL for the backend (e.g., "https://api.example.com")
    pub base_url: String,
    /// Bearer token attached to every request
    pub token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            request_timeout_ms: 10_000,
        }
    }
}

/// reqwest-backed requester that attaches bearer credentials.
///
/// Token refresh is handled outside this crate; a rotated token means
/// building a new requester.
pub struct AuthenticatedRequester {
    client: Client,
    config: RequesterConfig,
}

impl AuthenticatedRequester {
    /// Create a new requester with the given configuration
    pub fn new(config: RequesterConfig) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FetchError::Transport(format!("invalid token header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .user_agent(concat!("vitalboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Requester for AuthenticatedRequester {
    async fn get(&self, target: &Target) -> FetchResult<HttpResponse> {
        let url = self.resolve_url(target);

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }

    fn resolve_url(&self, target: &Target) -> String {
        match target {
            Target::Path(path) => self.join(path),
            Target::Absolute(url) => url.clone(),
        }
    }
}
