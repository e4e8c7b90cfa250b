//! Task domain entity
//!
//! A [`Task`] is one fueling assignment routed to a driver. Tasks are owned
//! by the backend; the client holds a cached copy scoped to the signed-in
//! driver and mutates it through the lifecycle methods below.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──start──► InProgress ──complete──► Completed
//!    │                   │                        ▲
//!    └──report_issue─────┴──► Issue               │
//!    └────────────────complete────────────────────┘
//! ```
//!
//! Dispatch may set `admin_status` to [`RETURNED_TO_DRIVER`], which allows a
//! completed task to be completed again. That annotation arrives through
//! realtime events and never replaces `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    errors::DomainError,
    newtypes::{Coordinates, SiteKey, TaskId},
    profile::DriverProfile,
    timestamp::{format_timestamp, parse_timestamp, TimestampField},
};

/// Admin annotation that flags a task for re-work
pub const RETURNED_TO_DRIVER: &str = "Task returned to the driver";

// ============================================================================
// TaskStatus
// ============================================================================

/// Driver-facing lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, not started
    #[default]
    Pending,
    /// Driver is on the way or fueling
    InProgress,
    /// Fueling recorded
    Completed,
    /// Driver reported a problem
    Issue,
}

impl TaskStatus {
    /// Wire value written to `driver_tasks.status`
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Issue => "issue",
        }
    }

    /// Lenient parse of the values found in existing rows
    ///
    /// Accepts any case and space or dash separators
    /// (`"In Progress"`, `"in-progress"`), plus a few historical aliases.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "pending" | "assigned" | "new" => Some(TaskStatus::Pending),
            "in_progress" | "inprogress" | "started" => Some(TaskStatus::InProgress),
            "completed" | "complete" | "done" => Some(TaskStatus::Completed),
            "issue" | "issue_reported" | "reported_issue" => Some(TaskStatus::Issue),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

// ============================================================================
// TaskTimestamps
// ============================================================================

/// Raw timestamp fields of a task row
///
/// Values are kept as the backend sent them. Resolution to an instant goes
/// through [`Task::completion_date`], which skips values that do not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTimestamps {
    pub local_completed_at: Option<String>,
    pub completed_at: Option<String>,
    pub completion_date: Option<String>,
    pub submitted_at: Option<String>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
}

impl TaskTimestamps {
    /// Raw value of `field`
    pub fn get(&self, field: TimestampField) -> Option<&str> {
        let value = match field {
            TimestampField::LocalCompletedAt => &self.local_completed_at,
            TimestampField::CompletedAt => &self.completed_at,
            TimestampField::CompletionDate => &self.completion_date,
            TimestampField::SubmittedAt => &self.submitted_at,
            TimestampField::UpdatedAt => &self.updated_at,
            TimestampField::CreatedAt => &self.created_at,
        };
        value.as_deref()
    }

    /// Parsed value of `field`
    pub fn parsed(&self, field: TimestampField) -> Option<DateTime<Utc>> {
        self.get(field).and_then(parse_timestamp)
    }
}

// ============================================================================
// Task
// ============================================================================

/// One fueling assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    site_name: Option<String>,
    site_id: Option<String>,
    driver_name: Option<String>,
    driver_phone: Option<String>,
    status: TaskStatus,
    admin_status: Option<String>,
    scheduled_at: Option<DateTime<Utc>>,
    required_quantity: Option<f64>,
    notes: Option<String>,
    coordinates: Option<Coordinates>,
    timestamps: TaskTimestamps,
}

impl Task {
    /// Creates a pending task with only an id
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            site_name: None,
            site_id: None,
            driver_name: None,
            driver_phone: None,
            status: TaskStatus::Pending,
            admin_status: None,
            scheduled_at: None,
            required_quantity: None,
            notes: None,
            coordinates: None,
            timestamps: TaskTimestamps::default(),
        }
    }

    // --- Builders (used when reconstituting rows) ---

    pub fn with_site(mut self, site_id: Option<String>, site_name: Option<String>) -> Self {
        self.site_id = non_blank(site_id);
        self.site_name = non_blank(site_name);
        self
    }

    pub fn with_driver(mut self, name: Option<String>, phone: Option<String>) -> Self {
        self.driver_name = non_blank(name);
        self.driver_phone = non_blank(phone);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_admin_status(mut self, admin_status: Option<String>) -> Self {
        self.admin_status = non_blank(admin_status);
        self
    }

    pub fn with_scheduled_at(mut self, scheduled_at: Option<DateTime<Utc>>) -> Self {
        self.scheduled_at = scheduled_at;
        self
    }

    pub fn with_required_quantity(mut self, quantity: Option<f64>) -> Self {
        self.required_quantity = quantity.filter(|q| q.is_finite());
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn with_timestamps(mut self, timestamps: TaskTimestamps) -> Self {
        self.timestamps = timestamps;
        self
    }

    // --- Getters ---

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn site_name(&self) -> Option<&str> {
        self.site_name.as_deref()
    }

    pub fn site_id(&self) -> Option<&str> {
        self.site_id.as_deref()
    }

    pub fn driver_name(&self) -> Option<&str> {
        self.driver_name.as_deref()
    }

    pub fn driver_phone(&self) -> Option<&str> {
        self.driver_phone.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn admin_status(&self) -> Option<&str> {
        self.admin_status.as_deref()
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    pub fn required_quantity(&self) -> Option<f64> {
        self.required_quantity
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn site_latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude())
    }

    pub fn site_longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude())
    }

    pub fn timestamps(&self) -> &TaskTimestamps {
        &self.timestamps
    }

    // --- Queries ---

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// True when dispatch has sent the task back for re-work
    pub fn is_returned_to_driver(&self) -> bool {
        self.admin_status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case(RETURNED_TO_DRIVER))
            .unwrap_or(false)
    }

    /// True when the task's driver fields match `driver`
    pub fn belongs_to(&self, driver: &DriverProfile) -> bool {
        driver.matches(self.driver_name(), self.driver_phone())
    }

    /// Cache key derived from the site id
    pub fn site_id_key(&self) -> Option<SiteKey> {
        self.site_id.as_deref().and_then(SiteKey::new)
    }

    /// Cache key derived from the site name
    pub fn site_name_key(&self) -> Option<SiteKey> {
        self.site_name.as_deref().and_then(SiteKey::new)
    }

    /// Schedule as epoch milliseconds, `0` when missing
    pub fn schedule_millis(&self) -> i64 {
        self.scheduled_at.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    /// First timestamp in [`TimestampField::COMPLETION_PRIORITY`] that parses
    pub fn completion_date(&self) -> Option<(TimestampField, DateTime<Utc>)> {
        TimestampField::COMPLETION_PRIORITY
            .iter()
            .find_map(|field| self.timestamps.parsed(*field).map(|t| (*field, t)))
    }

    /// The client-side completion marker, if it parses
    pub fn local_completed_at(&self) -> Option<DateTime<Utc>> {
        self.timestamps.parsed(TimestampField::LocalCompletedAt)
    }

    // --- Mutations ---

    /// Applies resolved coordinates
    ///
    /// Returns `false` and leaves the task untouched if the coordinates are
    /// numerically equal to the current ones.
    pub fn apply_coordinates(&mut self, coordinates: Coordinates) -> bool {
        match self.coordinates {
            Some(current) if current.same_position(&coordinates) => false,
            _ => {
                self.coordinates = Some(coordinates);
                true
            }
        }
    }

    /// Sets the client-side completion marker
    pub fn set_local_completed_at(&mut self, at: DateTime<Utc>) {
        self.timestamps.local_completed_at = Some(format_timestamp(at));
    }

    /// Keeps client-only state from an older copy of the same task
    ///
    /// The local completion marker only carries over from one completed copy
    /// to the next, and only when it is not older than the server's own
    /// completion time. A task that leaves `Completed` loses its marker.
    pub fn inherit_local_state(&mut self, previous: &Task) {
        if !self.is_completed() {
            self.timestamps.local_completed_at = None;
            return;
        }
        if self.timestamps.local_completed_at.is_some() || !previous.is_completed() {
            return;
        }
        let Some(marker) = previous.local_completed_at() else {
            return;
        };
        let server = [TimestampField::CompletedAt, TimestampField::CompletionDate]
            .into_iter()
            .find_map(|field| self.timestamps.parsed(field));
        if server.map_or(true, |server| marker >= server) {
            self.timestamps.local_completed_at = previous.timestamps.local_completed_at.clone();
        }
    }

    /// Checks whether `start` is allowed
    pub fn can_start(&self) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Pending => Ok(()),
            other => Err(invalid(other, TaskStatus::InProgress)),
        }
    }

    /// Checks whether `complete` is allowed
    pub fn can_complete(&self) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::InProgress => Ok(()),
            TaskStatus::Completed if self.is_returned_to_driver() => Ok(()),
            other => Err(invalid(other, TaskStatus::Completed)),
        }
    }

    /// Checks whether `report_issue` is allowed
    pub fn can_report_issue(&self) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::InProgress => Ok(()),
            other => Err(invalid(other, TaskStatus::Issue)),
        }
    }

    /// `Pending -> InProgress`
    pub fn start(&mut self) -> Result<(), DomainError> {
        self.can_start()?;
        self.status = TaskStatus::InProgress;
        Ok(())
    }

    /// `Pending | InProgress -> Completed`, or re-completion of a returned task
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.can_complete()?;
        self.status = TaskStatus::Completed;
        self.timestamps.completed_at = Some(format_timestamp(at));
        self.set_local_completed_at(at);
        Ok(())
    }

    /// `Pending | InProgress -> Issue`
    ///
    /// A non-blank `reason` replaces the notes; otherwise notes are kept.
    pub fn report_issue(&mut self, reason: Option<&str>) -> Result<(), DomainError> {
        self.can_report_issue()?;
        self.status = TaskStatus::Issue;
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            self.notes = Some(reason.to_string());
        }
        Ok(())
    }
}

fn invalid(from: TaskStatus, to: TaskStatus) -> DomainError {
    DomainError::InvalidState {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
