//! Backend data service port (driven/secondary port)
//!
//! This module defines the interface to the hosted backend's tables.
//! The primary implementation is a PostgREST-style REST adapter, but the
//! trait only speaks domain types so use cases can be tested with in-memory
//! fakes.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - Rows are coerced into domain types inside the adapter; nothing untyped
//!   crosses this boundary.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    DriverId, DriverProfile, DriverRecord, NewDriver, Notification, NotificationReadMarker,
    PushRegistration, TaskEntry, TaskId, TaskStatus, Task,
};

// ============================================================================
// TaskPatch
// ============================================================================

/// Partial update of a `driver_tasks` row
///
/// `None` fields are omitted from the request body, so a degraded retry
/// that drops `completed_at` leaves the column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskPatch {
    /// Status-only patch
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status,
            completed_at: None,
            notes: None,
        }
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// The same patch without the optional completion timestamp
    pub fn degraded(&self) -> Self {
        Self {
            status: self.status,
            completed_at: None,
            notes: self.notes.clone(),
        }
    }
}

// ============================================================================
// IBackendService trait
// ============================================================================

/// Port for the hosted backend's data tables
#[async_trait]
pub trait IBackendService: Send + Sync {
    // --- drivers ---

    /// Looks up a driver by exact id
    async fn find_driver_by_id(&self, id: DriverId) -> Result<Option<DriverRecord>>;

    /// Case-insensitive match of `identifier` against name, email and phone
    ///
    /// Results are ordered newest first by `created_at`.
    async fn search_drivers(&self, identifier: &str) -> Result<Vec<DriverRecord>>;

    /// Inserts a driver row and returns it as stored
    async fn create_driver(&self, driver: &NewDriver) -> Result<DriverRecord>;

    // --- tasks ---

    /// Tasks assigned to `driver` (by name or phone)
    async fn fetch_tasks(&self, driver: &DriverProfile) -> Result<Vec<Task>>;

    /// Applies `patch` to one task row
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<()>;

    /// Appends a completion entry
    async fn insert_task_entry(&self, entry: &TaskEntry) -> Result<()>;

    // --- notifications ---

    /// Notifications targeted at `driver` plus broadcasts, newest first
    async fn fetch_notifications(&self, driver: &DriverProfile) -> Result<Vec<Notification>>;

    /// Read markers recorded for `driver`
    async fn fetch_read_markers(&self, driver: &DriverProfile)
        -> Result<Vec<NotificationReadMarker>>;

    /// Upserts read markers (conflict key `notification_id, driver_name`)
    async fn mark_notifications_read(&self, markers: &[NotificationReadMarker]) -> Result<()>;

    // --- push ---

    /// Upserts a push token row (conflict key `token`)
    async fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()>;
}
