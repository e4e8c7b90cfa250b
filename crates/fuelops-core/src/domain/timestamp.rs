//! Timestamp parsing and completion-date resolution
//!
//! Task rows carry their completion time in whichever field the writing
//! path happened to populate. [`TimestampField::COMPLETION_PRIORITY`] is the
//! order in which those fields are consulted; the first one that parses wins.
//! Older write paths populated `completion_date` or `submitted_at` only, so
//! the list is kept as a compatibility shim.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A timestamp field of a task row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    /// Set by this client when it observes a completion
    LocalCompletedAt,
    CompletedAt,
    CompletionDate,
    SubmittedAt,
    UpdatedAt,
    CreatedAt,
}

impl TimestampField {
    /// Fields consulted, in order, to find when a task was completed
    pub const COMPLETION_PRIORITY: [TimestampField; 6] = [
        TimestampField::LocalCompletedAt,
        TimestampField::CompletedAt,
        TimestampField::CompletionDate,
        TimestampField::SubmittedAt,
        TimestampField::UpdatedAt,
        TimestampField::CreatedAt,
    ];

    /// Column name in `driver_tasks`
    pub fn column(&self) -> &'static str {
        match self {
            TimestampField::LocalCompletedAt => "local_completed_at",
            TimestampField::CompletedAt => "completed_at",
            TimestampField::CompletionDate => "completion_date",
            TimestampField::SubmittedAt => "submitted_at",
            TimestampField::UpdatedAt => "updated_at",
            TimestampField::CreatedAt => "created_at",
        }
    }
}

impl std::fmt::Display for TimestampField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Parses the timestamp encodings seen in backend rows
///
/// Accepted forms:
/// - RFC 3339 (`2026-03-01T08:00:00Z`, `2026-03-01T08:00:00+03:00`)
/// - naive date-time with `T` or space separator, optional fraction (UTC assumed)
/// - bare date (`2026-03-01`, midnight UTC)
/// - all-digit epoch milliseconds
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = s.parse().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Postgres `timestamptz` text output uses a space and a short offset.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats an instant the way this client writes timestamps
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
