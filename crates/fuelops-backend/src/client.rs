//! Hosted backend HTTP client
//!
//! Wraps `reqwest::Client` with the `apikey` and bearer headers the backend
//! expects on every request, base URL construction, 429 retry handling and
//! HTTP status classification.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fuelops_backend::client::BackendClient;
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), fuelops_backend::BackendError> {
//! let client = BackendClient::new("https://abc.example.co", "anon-key");
//! let rows = client
//!     .get_rows("/rest/v1/sites", &[("select", "id,name".to_string())])
//!     .await?;
//! println!("{} sites", rows.len());
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    rate_limit::{parse_retry_after, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_AFTER},
    BackendError,
};

/// A loosely-typed table row
pub type Row = Map<String, Value>;

// ============================================================================
// BackendClient
// ============================================================================

/// HTTP client for the hosted backend
pub struct BackendClient {
    client: Client,
    base_url: String,
    anon_key: String,
    max_retries: u32,
}

impl BackendClient {
    /// Creates a client for the project at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Project URL; a trailing slash is ignored
    /// * `anon_key` - Public API key sent as `apikey` and bearer token
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets how many times a 429 response is retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Creates an authenticated request for a path relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, &format!("{}{}", self.base_url, path))
    }

    /// Creates an authenticated request for an absolute URL
    pub fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    // ========================================================================
    // execute_with_retry - 429 handling and status classification
    // ========================================================================

    /// Sends `request`, retrying on HTTP 429
    ///
    /// The `Retry-After` header sets the delay (30 seconds if absent). Other
    /// non-success statuses are classified into [`BackendError`] without a
    /// retry. Requests whose body cannot be cloned (streams) are sent once.
    pub async fn execute_with_retry(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let mut pending = request;
        let mut attempt: u32 = 0;

        loop {
            let retry = pending.try_clone();
            let response = pending.send().await?;
            let status = response.status();

            if status.is_success() {
                if attempt > 0 {
                    info!(attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            if status != StatusCode::TOO_MANY_REQUESTS {
                let url = response.url().path().to_string();
                let body = response.text().await.unwrap_or_default();
                debug!(status = status.as_u16(), url = %url, "Request failed");
                return Err(classify(status, body));
            }

            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                .unwrap_or(DEFAULT_RETRY_AFTER);

            let Some(next) = retry.filter(|_| attempt < self.max_retries) else {
                warn!(attempts = attempt + 1, "429 retry limit exhausted");
                return Err(BackendError::TooManyRequests { retry_after });
            };

            info!(
                attempt,
                retry_after_ms = retry_after.as_millis() as u64,
                "Received 429, backing off"
            );
            tokio::time::sleep(retry_after).await;
            pending = next;
            attempt += 1;
        }
    }

    /// Sends `request` and decodes a JSON array of rows
    pub async fn fetch_rows(&self, request: RequestBuilder) -> Result<Vec<Row>, BackendError> {
        let response = self.execute_with_retry(request).await?;
        let body: Value = response.json().await?;
        match body {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect()),
            Value::Object(row) => Ok(vec![row]),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::InvalidResponse(format!(
                "expected rows, got {other}"
            ))),
        }
    }

    /// `GET path?query` returning rows
    pub async fn get_rows(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(self.request(Method::GET, path).query(query))
            .await
    }
}

/// Maps a non-success status to a [`BackendError`]
pub(crate) fn classify(status: StatusCode, body: String) -> BackendError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body
    };
    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        StatusCode::FORBIDDEN => BackendError::Forbidden(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::CONFLICT => BackendError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::TooManyRequests {
            retry_after: DEFAULT_RETRY_AFTER,
        },
        other => BackendError::ServerError {
            status: other.as_u16(),
            message,
        },
    }
}
