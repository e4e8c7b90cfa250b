//! Task sync engine
//!
//! The engine owns the signed-in driver's task list. It is driven by two
//! sources:
//!
//! - full refreshes from the backend (on start and on a fixed interval)
//! - realtime [`TaskEvent`]s delivered over an `mpsc` channel
//!
//! Every change goes through enrichment, the pure [`reduce`] step, the
//! retention filter and board ordering, and is then published on a
//! `watch` channel and saved as the local snapshot.
//!
//! ## Flow
//!
//! ```text
//! IRealtimeFeed ──→ mpsc::Receiver ──→ TaskSyncEngine ──→ watch::Sender<Vec<Task>>
//!                                          │
//!                        TaskEnricher ─────┤
//!                        RetentionFilter ──┘
//! ```
//!
//! Cancelling the shutdown token stops the loop. Results of lookups that
//! finish after cancellation are discarded.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use fuelops_core::{
    domain::{DriverProfile, Task, TaskId},
    ports::{IBackendService, ILocalStore, TaskEvent},
};
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    enrichment::TaskEnricher,
    merge::{reduce, sort_tasks},
    retention::RetentionFilter,
    SyncError,
};

/// Default seconds between full refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// TaskSyncEngine struct
// ============================================================================

/// Keeps one driver's task board in sync with the backend
pub struct TaskSyncEngine {
    driver: DriverProfile,
    backend: Arc<dyn IBackendService + Send + Sync>,
    store: Arc<dyn ILocalStore + Send + Sync>,
    enricher: TaskEnricher,
    retention: RetentionFilter,
    tasks: Vec<Task>,
    snapshots: watch::Sender<Vec<Task>>,
    shutdown: CancellationToken,
    refresh_interval: Duration,
}

impl TaskSyncEngine {
    /// Creates an engine for `driver`
    ///
    /// # Returns
    /// The engine and a receiver that observes every published board.
    pub fn new(
        driver: DriverProfile,
        backend: Arc<dyn IBackendService + Send + Sync>,
        store: Arc<dyn ILocalStore + Send + Sync>,
        enricher: TaskEnricher,
        shutdown: CancellationToken,
    ) -> (Self, watch::Receiver<Vec<Task>>) {
        let (snapshots, rx) = watch::channel(Vec::new());
        let engine = Self {
            driver,
            backend,
            store,
            enricher: enricher.with_shutdown(shutdown.clone()),
            retention: RetentionFilter::new(),
            tasks: Vec::new(),
            snapshots,
            shutdown,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        };
        (engine, rx)
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn driver(&self) -> &DriverProfile {
        &self.driver
    }

    /// Current board
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Replaces the board with a fresh fetch
    ///
    /// On failure the current board is kept. If the board is still empty,
    /// the last saved snapshot is shown instead.
    #[tracing::instrument(skip(self), fields(driver = %self.driver.name()))]
    pub async fn refresh(&mut self) -> Result<(), SyncError> {
        let rows = match self.backend.fetch_tasks(&self.driver).await {
            Ok(rows) => rows,
            Err(e) => {
                let err = SyncError::Fetch(format!("{e:#}"));
                warn!(error = %err, "Keeping last known tasks");
                if self.tasks.is_empty() {
                    self.restore_snapshot().await;
                }
                return Err(err);
            }
        };

        let fetched = rows.len();
        let mine: Vec<Task> = rows
            .into_iter()
            .filter(|t| t.belongs_to(&self.driver))
            .collect();
        let mut enriched = self.enricher.enrich(mine).await;

        if self.shutdown.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let previous: HashMap<TaskId, &Task> = self.tasks.iter().map(|t| (t.id(), t)).collect();
        for task in enriched.iter_mut() {
            if let Some(prev) = previous.get(&task.id()) {
                task.inherit_local_state(prev);
            }
        }

        self.commit(enriched).await;
        info!(fetched, shown = self.tasks.len(), "Tasks refreshed");
        Ok(())
    }

    async fn restore_snapshot(&mut self) {
        match self.store.load_task_snapshot(&self.driver).await {
            Ok(saved) if !saved.is_empty() => {
                info!(tasks = saved.len(), "Showing last saved task list");
                self.tasks = self.ordered(saved);
                self.snapshots.send_replace(self.tasks.clone());
            }
            Ok(_) => debug!("No saved task list"),
            Err(e) => {
                let err = SyncError::Snapshot(format!("{e:#}"));
                warn!(error = %err, "Failed to load saved task list");
            }
        }
    }

    // ========================================================================
    // Realtime events
    // ========================================================================

    /// Applies one realtime event
    ///
    /// Returns `Ok(false)` when the event was dropped: it names another
    /// driver, or the engine was shut down while it was being enriched.
    #[tracing::instrument(skip(self, event), fields(kind = event.kind(), task_id = %event.task_id()))]
    pub async fn handle_event(&mut self, event: TaskEvent) -> Result<bool, SyncError> {
        if !event.concerns(&self.driver) {
            debug!("Ignoring event for another driver");
            return Ok(false);
        }

        let event = match event {
            TaskEvent::Inserted(task) => TaskEvent::Inserted(self.enricher.enrich_one(task).await),
            TaskEvent::Updated(task) => TaskEvent::Updated(self.enricher.enrich_one(task).await),
            deleted @ TaskEvent::Deleted(_) => deleted,
        };

        if self.shutdown.is_cancelled() {
            debug!("Dropping event received during shutdown");
            return Ok(false);
        }

        let tasks = reduce(std::mem::take(&mut self.tasks), event, &self.driver);
        self.commit(tasks).await;
        Ok(true)
    }

    /// Records the result of a local action (start, complete, report issue)
    pub async fn apply_local(&mut self, task: Task) {
        let tasks = reduce(
            std::mem::take(&mut self.tasks),
            TaskEvent::Updated(task),
            &self.driver,
        );
        self.commit(tasks).await;
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Runs until the shutdown token is cancelled
    ///
    /// If the event channel closes, the engine keeps refreshing on the
    /// interval.
    pub async fn run(mut self, mut events: mpsc::Receiver<TaskEvent>) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Initial refresh failed");
        }

        let shutdown = self.shutdown.clone();
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut feed_open = true;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sync engine shutting down");
                    break;
                }
                event = events.recv(), if feed_open => match event {
                    Some(event) => {
                        if let Err(e) = self.handle_event(event).await {
                            warn!(error = %e, "Failed to apply realtime event");
                        }
                    }
                    None => {
                        warn!("Realtime feed closed, continuing with periodic refresh");
                        feed_open = false;
                    }
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        debug!(error = %e, "Periodic refresh failed");
                    }
                }
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn ordered(&self, tasks: Vec<Task>) -> Vec<Task> {
        let mut tasks = self.retention.apply(tasks, Utc::now());
        sort_tasks(&mut tasks);
        tasks
    }

    /// Installs `tasks` as the board, publishes it and saves the snapshot
    async fn commit(&mut self, tasks: Vec<Task>) {
        self.tasks = self.ordered(tasks);
        self.snapshots.send_replace(self.tasks.clone());

        if let Err(e) = self
            .store
            .save_task_snapshot(&self.driver, &self.tasks)
            .await
        {
            let err = SyncError::Snapshot(format!("{e:#}"));
            warn!(error = %err, "Failed to save task list");
        }
    }
}
