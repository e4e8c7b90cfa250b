//! Row coercion at the backend boundary
//!
//! The REST API returns loosely-typed JSON: ids may arrive as numbers or
//! strings, numeric columns as text, flags as `"true"` or `1`. These helpers
//! read such rows into domain types so nothing untyped leaves this crate.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use fuelops_core::{
    domain::{
        parse_timestamp, Coordinates, DriverId, DriverRecord, Notification,
        NotificationReadMarker, Task, TaskId, TaskStatus, TaskTimestamps, TimestampField,
    },
    ports::{DeletedTask, SiteRecord},
};

use crate::{client::Row, BackendError};

// ============================================================================
// Field helpers
// ============================================================================

/// Non-blank text; numbers are rendered as text
pub(crate) fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number from a JSON number or numeric text
pub(crate) fn number(row: &Row, key: &str) -> Option<f64> {
    let value = match row.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Integer from a JSON number or numeric text
pub(crate) fn integer(row: &Row, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Boolean from `true`/`false`, `"true"`/`"false"` or `1`/`0`
pub(crate) fn boolean(row: &Row, key: &str) -> Option<bool> {
    match row.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Some(true),
            "false" | "f" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn timestamp(row: &Row, key: &str) -> Option<DateTime<Utc>> {
    text(row, key).as_deref().and_then(parse_timestamp)
}

fn required_id(row: &Row, table: &str) -> Result<i64, BackendError> {
    integer(row, "id")
        .ok_or_else(|| BackendError::InvalidResponse(format!("{table} row without a usable id")))
}

// ============================================================================
// Tasks
// ============================================================================

/// Reads a `driver_tasks` row
///
/// Unknown status values are logged and read as pending. Coordinates come
/// from `site_latitude`/`site_longitude`, falling back to
/// `latitude`/`longitude`.
pub fn task_from_row(row: &Row) -> Result<Task, BackendError> {
    let id = TaskId::new(required_id(row, "driver_tasks")?);

    let status = match text(row, "status") {
        None => TaskStatus::Pending,
        Some(raw) => TaskStatus::parse(&raw).unwrap_or_else(|| {
            warn!(task_id = %id, status = %raw, "Unknown task status, reading as pending");
            TaskStatus::Pending
        }),
    };

    let coordinates = match (number(row, "site_latitude"), number(row, "site_longitude")) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => match (number(row, "latitude"), number(row, "longitude")) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => None,
        },
    };

    let raw_ts = |field: TimestampField| text(row, field.column());
    let timestamps = TaskTimestamps {
        local_completed_at: raw_ts(TimestampField::LocalCompletedAt),
        completed_at: raw_ts(TimestampField::CompletedAt),
        completion_date: raw_ts(TimestampField::CompletionDate),
        submitted_at: raw_ts(TimestampField::SubmittedAt),
        updated_at: raw_ts(TimestampField::UpdatedAt),
        created_at: raw_ts(TimestampField::CreatedAt),
    };

    Ok(Task::new(id)
        .with_site(text(row, "site_id"), text(row, "site_name"))
        .with_driver(text(row, "driver_name"), text(row, "driver_phone"))
        .with_status(status)
        .with_admin_status(text(row, "admin_status"))
        .with_scheduled_at(timestamp(row, "scheduled_at"))
        .with_required_quantity(number(row, "required_quantity"))
        .with_notes(text(row, "notes"))
        .with_coordinates(coordinates)
        .with_timestamps(timestamps))
}

/// Reads the `old` side of a delete event
pub fn deleted_from_row(row: &Row) -> Result<DeletedTask, BackendError> {
    Ok(DeletedTask {
        id: TaskId::new(required_id(row, "driver_tasks")?),
        driver_name: text(row, "driver_name"),
        driver_phone: text(row, "driver_phone"),
    })
}

// ============================================================================
// Drivers
// ============================================================================

/// Reads a `drivers` row
///
/// A missing `active` column means active. The legacy plaintext column is
/// `password`.
pub fn driver_from_row(row: &Row) -> Result<DriverRecord, BackendError> {
    let id = DriverId::new(required_id(row, "drivers")?);
    Ok(
        DriverRecord::new(
            id,
            text(row, "name").unwrap_or_default(),
            text(row, "phone").unwrap_or_default(),
        )
        .with_email(text(row, "email"))
        .with_password_sha256(text(row, "password_sha256"))
        .with_legacy_password(text(row, "password"))
        .with_active(boolean(row, "active").unwrap_or(true))
        .with_created_at(timestamp(row, "created_at")),
    )
}

// ============================================================================
// Notifications
// ============================================================================

pub fn notification_from_row(row: &Row) -> Result<Notification, BackendError> {
    let id = required_id(row, "driver_notifications")?;
    Ok(Notification::new(
        id,
        text(row, "title").unwrap_or_default(),
        text(row, "message").unwrap_or_default(),
    )
    .with_driver_name(text(row, "driver_name"))
    .with_created_at(timestamp(row, "created_at"))
    .with_sent_by(text(row, "sent_by")))
}

/// Reads a `driver_notification_reads` row, `None` if incomplete
pub fn marker_from_row(row: &Row) -> Option<NotificationReadMarker> {
    Some(NotificationReadMarker {
        notification_id: integer(row, "notification_id")?,
        driver_name: text(row, "driver_name")?,
        read_at: timestamp(row, "read_at").unwrap_or_else(Utc::now),
    })
}

// ============================================================================
// Sites
// ============================================================================

/// Reads a `sites` row; the id is kept as text
pub fn site_from_row(row: &Row) -> SiteRecord {
    let coordinates = match (number(row, "latitude"), number(row, "longitude")) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => None,
    };
    SiteRecord {
        id: text(row, "id"),
        name: text(row, "name"),
        coordinates,
    }
}
