//! FuelOps Backend - Hosted backend adapter
//!
//! Provides async adapters for:
//! - The PostgREST-style data API (drivers, tasks, entries, notifications,
//!   push tokens, sites)
//! - Object storage uploads for completion photos
//! - The server-sent-event change feed for `driver_tasks`
//! - The optional dispatch notify relay
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client with 429 retry handling
//! - [`rate_limit`] - `Retry-After` parsing
//! - [`rows`] - Coercion of loose JSON rows into domain types
//! - [`provider`] - `IBackendService`, `ISiteDirectory` and `IFileStorage`
//! - [`realtime`] - Change-feed decoding and the reconnecting subscriber
//! - [`notify`] - Dispatch relay client

pub mod client;
pub mod notify;
pub mod provider;
pub mod rate_limit;
pub mod realtime;
pub mod rows;

use std::time::Duration;
use thiserror::Error;

pub use client::BackendClient;
pub use notify::HttpDispatchNotifier;
pub use provider::RestBackend;
pub use realtime::HttpRealtimeFeed;

/// Errors that can occur when talking to the hosted backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The API key or session was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Row-level security denied the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested table, row or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique constraint or duplicate object was hit
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded and the retry budget is spent
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration the server asked to wait
        retry_after: Duration,
    },

    /// Any other non-success status (400, 5xx, ...)
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response could not be parsed or was missing required fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
