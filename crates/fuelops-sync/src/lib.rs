//! FuelOps Sync - Driver task board synchronization
//!
//! Provides:
//! - A shared coordinate cache for fueling sites
//! - Batched coordinate enrichment of task rows
//! - The 7-day retention window for completed tasks
//! - A pure reducer applying realtime events to the task list
//! - An actor-style engine owning the list and publishing snapshots
//!
//! ## Modules
//!
//! - [`coordinates`] - Process-lifetime site coordinate cache
//! - [`enrichment`] - Fills missing task coordinates from cache and directory
//! - [`retention`] - Prunes completed tasks older than the retention window
//! - [`merge`] - Event reducer and board ordering
//! - [`engine`] - Refresh / realtime loop with graceful shutdown

pub mod coordinates;
pub mod engine;
pub mod enrichment;
pub mod merge;
pub mod retention;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use coordinates::{CachedSite, CoordinateCache};
pub use engine::TaskSyncEngine;
pub use enrichment::TaskEnricher;
pub use merge::{reduce, sort_tasks};
pub use retention::{RetentionFilter, RETENTION_DAYS};

/// Errors that can occur while synchronizing the task board
#[derive(Debug, Error)]
pub enum SyncError {
    /// The task list could not be fetched from the backend
    #[error("Failed to fetch tasks: {0}")]
    Fetch(String),

    /// The local snapshot could not be read or written
    #[error("Task snapshot error: {0}")]
    Snapshot(String),

    /// The engine was shut down while work was in flight
    #[error("Sync cancelled")]
    Cancelled,
}

/// Site directory lookup failures; logged and skipped
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Site lookup by id failed: {0}")]
    ById(String),

    #[error("Site lookup by name failed: {0}")]
    ByName(String),
}
