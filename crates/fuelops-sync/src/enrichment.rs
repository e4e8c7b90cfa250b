//! Task coordinate enrichment
//!
//! Fills in site coordinates for tasks that have none. Resolution order:
//!
//! 1. Coordinate cache (id key, then name key)
//! 2. One batched directory lookup for every distinct missing site id
//! 3. One batched directory lookup for every distinct name still missing
//!
//! Tasks with neither a site id nor a site name are left alone, as are tasks
//! that already carry coordinates. Lookup failures are logged and the
//! affected tasks stay without coordinates. Once the shutdown token is
//! cancelled no further lookups are issued.

use std::collections::BTreeSet;
use std::sync::Arc;

use fuelops_core::{
    domain::{SiteKey, Task},
    ports::{ISiteDirectory, SiteRecord},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{coordinates::CoordinateCache, LookupError};

/// Resolves missing task coordinates
pub struct TaskEnricher {
    cache: Arc<CoordinateCache>,
    directory: Arc<dyn ISiteDirectory + Send + Sync>,
    shutdown: CancellationToken,
}

impl TaskEnricher {
    pub fn new(
        cache: Arc<CoordinateCache>,
        directory: Arc<dyn ISiteDirectory + Send + Sync>,
    ) -> Self {
        Self {
            cache,
            directory,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stops issuing directory lookups once `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn cache(&self) -> &Arc<CoordinateCache> {
        &self.cache
    }

    /// Enriches `tasks`, preserving order
    pub async fn enrich(&self, mut tasks: Vec<Task>) -> Vec<Task> {
        self.enrich_in_place(&mut tasks).await;
        tasks
    }

    /// Enriches a single task
    pub async fn enrich_one(&self, mut task: Task) -> Task {
        self.enrich_in_place(std::slice::from_mut(&mut task)).await;
        task
    }

    #[tracing::instrument(skip_all, fields(tasks = tasks.len()))]
    async fn enrich_in_place(&self, tasks: &mut [Task]) {
        if self.apply_cached(tasks) == 0 {
            return;
        }

        let ids: BTreeSet<SiteKey> = unresolved(tasks).filter_map(Task::site_id_key).collect();
        if !ids.is_empty() {
            if self.shutdown.is_cancelled() {
                return;
            }
            let ids: Vec<SiteKey> = ids.into_iter().collect();
            match self.directory.lookup_by_ids(&ids).await {
                Ok(records) => self.remember(&records),
                Err(e) => {
                    let err = LookupError::ById(format!("{e:#}"));
                    warn!(error = %err, keys = ids.len(), "Coordinate lookup skipped");
                }
            }
            if self.apply_cached(tasks) == 0 {
                return;
            }
        }

        let names: BTreeSet<SiteKey> = unresolved(tasks)
            .filter_map(Task::site_name_key)
            .collect();
        if !names.is_empty() {
            if self.shutdown.is_cancelled() {
                debug!("Shutdown requested, skipping site name lookup");
                return;
            }
            let names: Vec<SiteKey> = names.into_iter().collect();
            match self.directory.lookup_by_names(&names).await {
                Ok(records) => self.remember(&records),
                Err(e) => {
                    let err = LookupError::ByName(format!("{e:#}"));
                    warn!(error = %err, keys = names.len(), "Coordinate lookup skipped");
                }
            }
            let left = self.apply_cached(tasks);
            if left > 0 {
                debug!(unresolved = left, "Some tasks have no known site position");
            }
        }
    }

    /// Applies cached coordinates; returns how many tasks remain unresolved
    fn apply_cached(&self, tasks: &mut [Task]) -> usize {
        let mut left = 0;
        for task in tasks.iter_mut().filter(|t| needs_coordinates(t)) {
            match self.cache.resolve_task(task) {
                Some(coordinates) => {
                    task.apply_coordinates(coordinates);
                }
                None => left += 1,
            }
        }
        left
    }

    fn remember(&self, records: &[SiteRecord]) {
        let cached = records.iter().filter(|r| self.cache.insert(r)).count();
        debug!(returned = records.len(), cached, "Site records cached");
    }
}

fn needs_coordinates(task: &Task) -> bool {
    task.coordinates().is_none() && (task.site_id_key().is_some() || task.site_name_key().is_some())
}

fn unresolved(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|t| needs_coordinates(t))
}
