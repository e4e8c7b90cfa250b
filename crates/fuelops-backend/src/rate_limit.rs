//! `Retry-After` handling for HTTP 429 responses
//!
//! The data API answers bursts with 429 and a `Retry-After` header holding
//! either delay seconds or an HTTP date. [`BackendClient`](crate::client::BackendClient)
//! sleeps for the parsed delay and retries, up to [`DEFAULT_MAX_RETRIES`] times.

use std::time::Duration;

use tracing::warn;

/// Delay used when the header is missing or unparseable
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Retries after the first 429 before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Longest delay honored from an HTTP-date header
const MAX_DATE_DELAY_SECS: u64 = 3600;

/// Parses a `Retry-After` value
///
/// Accepts integer seconds (`"120"`) or an RFC 2822 date in the future
/// (at most an hour away). Anything else yields `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let remaining = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        if let Ok(secs) = u64::try_from(remaining.num_seconds()) {
            if secs > 0 && secs <= MAX_DATE_DELAY_SECS {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
