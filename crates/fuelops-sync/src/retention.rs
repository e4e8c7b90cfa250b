//! Completed-task retention window
//!
//! A completed task stays on the driver's board while
//! `now - completion_date <= 7 days`. The completion date is the first
//! parseable field in [`TimestampField::COMPLETION_PRIORITY`]. Completed
//! tasks with no parseable date stay visible. Other statuses are never
//! filtered.

use chrono::{DateTime, Duration, Utc};
use fuelops_core::domain::{Task, TimestampField};
use tracing::debug;

/// Days a completed task stays visible
pub const RETENTION_DAYS: i64 = 7;

/// Prunes completed tasks that fell out of the retention window
#[derive(Debug, Clone, Copy)]
pub struct RetentionFilter {
    window: Duration,
}

impl Default for RetentionFilter {
    fn default() -> Self {
        Self {
            window: Duration::days(RETENTION_DAYS),
        }
    }
}

impl RetentionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Filters `tasks` against `now`, preserving order
    ///
    /// Retained completed tasks that lack a usable local completion marker
    /// get one backfilled from the resolved completion date.
    pub fn apply(&self, tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
        let before = tasks.len();
        let kept: Vec<Task> = tasks
            .into_iter()
            .filter_map(|mut task| self.retain(&mut task, now).then_some(task))
            .collect();
        if kept.len() != before {
            debug!(pruned = before - kept.len(), "Completed tasks aged out");
        }
        kept
    }

    /// Decides whether `task` stays, backfilling its local marker
    pub fn retain(&self, task: &mut Task, now: DateTime<Utc>) -> bool {
        if !task.is_completed() {
            return true;
        }
        let Some((field, completed)) = task.completion_date() else {
            return true;
        };
        if field != TimestampField::LocalCompletedAt {
            task.set_local_completed_at(completed);
        }
        now.signed_duration_since(completed) <= self.window
    }
}
