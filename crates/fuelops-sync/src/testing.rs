//! In-memory ports for the sync tests

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fuelops_core::{
    domain::{
        DriverId, DriverProfile, DriverRecord, NewDriver, Notification, NotificationReadMarker,
        PushRegistration, SiteKey, Task, TaskEntry, TaskId,
    },
    ports::{IBackendService, ILocalStore, ISiteDirectory, SiteRecord, TaskPatch},
};

// ============================================================================
// Site directory
// ============================================================================

#[derive(Default)]
pub struct FakeDirectory {
    sites: Vec<SiteRecord>,
    failing: Mutex<bool>,
    id_calls: Mutex<usize>,
    name_calls: Mutex<usize>,
    last_names: Mutex<Vec<SiteKey>>,
}

impl FakeDirectory {
    pub fn with_sites(sites: Vec<SiteRecord>) -> Self {
        Self {
            sites,
            ..Default::default()
        }
    }

    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn id_calls(&self) -> usize {
        *self.id_calls.lock().unwrap()
    }

    pub fn name_calls(&self) -> usize {
        *self.name_calls.lock().unwrap()
    }

    pub fn last_names(&self) -> Vec<SiteKey> {
        self.last_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl ISiteDirectory for FakeDirectory {
    async fn lookup_by_ids(&self, ids: &[SiteKey]) -> Result<Vec<SiteRecord>> {
        *self.id_calls.lock().unwrap() += 1;
        if *self.failing.lock().unwrap() {
            return Err(anyhow!("sites table unavailable"));
        }
        Ok(self
            .sites
            .iter()
            .filter(|s| s.id_key().map(|k| ids.contains(&k)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn lookup_by_names(&self, names: &[SiteKey]) -> Result<Vec<SiteRecord>> {
        *self.name_calls.lock().unwrap() += 1;
        *self.last_names.lock().unwrap() = names.to_vec();
        if *self.failing.lock().unwrap() {
            return Err(anyhow!("sites table unavailable"));
        }
        Ok(self
            .sites
            .iter()
            .filter(|s| s.name_key().map(|k| names.contains(&k)).unwrap_or(false))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Backend (task reads only)
// ============================================================================

#[derive(Default)]
pub struct FakeBackend {
    pub tasks: Mutex<Vec<Task>>,
    pub unreachable: Mutex<bool>,
    pub fetches: Mutex<usize>,
}

#[async_trait]
impl IBackendService for FakeBackend {
    async fn find_driver_by_id(&self, _id: DriverId) -> Result<Option<DriverRecord>> {
        Ok(None)
    }

    async fn search_drivers(&self, _identifier: &str) -> Result<Vec<DriverRecord>> {
        Ok(Vec::new())
    }

    async fn create_driver(&self, _driver: &NewDriver) -> Result<DriverRecord> {
        Err(anyhow!("not supported"))
    }

    async fn fetch_tasks(&self, _driver: &DriverProfile) -> Result<Vec<Task>> {
        *self.fetches.lock().unwrap() += 1;
        if *self.unreachable.lock().unwrap() {
            return Err(anyhow!("connection refused"));
        }
        // Returns every row; the engine filters by driver.
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn update_task(&self, _id: TaskId, _patch: &TaskPatch) -> Result<()> {
        Ok(())
    }

    async fn insert_task_entry(&self, _entry: &TaskEntry) -> Result<()> {
        Ok(())
    }

    async fn fetch_notifications(&self, _driver: &DriverProfile) -> Result<Vec<Notification>> {
        Ok(Vec::new())
    }

    async fn fetch_read_markers(
        &self,
        _driver: &DriverProfile,
    ) -> Result<Vec<NotificationReadMarker>> {
        Ok(Vec::new())
    }

    async fn mark_notifications_read(&self, _markers: &[NotificationReadMarker]) -> Result<()> {
        Ok(())
    }

    async fn upsert_push_token(&self, _registration: &PushRegistration) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Local store (snapshot only)
// ============================================================================

#[derive(Default)]
pub struct FakeStore {
    pub snapshot: Mutex<Vec<Task>>,
}

#[async_trait]
impl ILocalStore for FakeStore {
    async fn save_profile(&self, _profile: &DriverProfile) -> Result<()> {
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<DriverProfile>> {
        Ok(None)
    }

    async fn clear_profile(&self) -> Result<()> {
        Ok(())
    }

    async fn last_push_signature(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn save_push_signature(&self, _signature: &str) -> Result<()> {
        Ok(())
    }

    async fn save_task_snapshot(&self, _driver: &DriverProfile, tasks: &[Task]) -> Result<()> {
        *self.snapshot.lock().unwrap() = tasks.to_vec();
        Ok(())
    }

    async fn load_task_snapshot(&self, _driver: &DriverProfile) -> Result<Vec<Task>> {
        Ok(self.snapshot.lock().unwrap().clone())
    }
}
