//! In-memory port implementations shared by the use case tests

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::domain::{
    DriverId, DriverProfile, DriverRecord, NewDriver, Notification, NotificationReadMarker,
    PushRegistration, Task, TaskEntry, TaskId,
};
use crate::ports::{
    DispatchMessage, IBackendService, IDispatchNotifier, IFileStorage, ILocalStore, TaskPatch,
};

// ============================================================================
// Backend
// ============================================================================

#[derive(Default)]
pub struct FakeBackend {
    pub drivers: Mutex<Vec<DriverRecord>>,
    pub tasks: Mutex<Vec<Task>>,
    pub entries: Mutex<Vec<TaskEntry>>,
    pub patches: Mutex<Vec<(TaskId, TaskPatch)>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub markers: Mutex<Vec<NotificationReadMarker>>,
    pub push_rows: Mutex<Vec<PushRegistration>>,
    /// Number of upcoming `update_task` calls that fail
    pub failing_updates: Mutex<u32>,
    pub fail_entry_insert: Mutex<bool>,
    pub fail_push: Mutex<bool>,
    pub unreachable: Mutex<bool>,
}

impl FakeBackend {
    fn check_reachable(&self) -> Result<()> {
        if *self.unreachable.lock().unwrap() {
            Err(anyhow!("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IBackendService for FakeBackend {
    async fn find_driver_by_id(&self, id: DriverId) -> Result<Option<DriverRecord>> {
        self.check_reachable()?;
        Ok(self
            .drivers
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == id)
            .cloned())
    }

    async fn search_drivers(&self, identifier: &str) -> Result<Vec<DriverRecord>> {
        self.check_reachable()?;
        let needle = identifier.trim().to_lowercase();
        let mut found: Vec<DriverRecord> = self
            .drivers
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.name().to_lowercase() == needle
                    || d.phone().to_lowercase() == needle
                    || d.email().map(|e| e.to_lowercase() == needle).unwrap_or(false)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(found)
    }

    async fn create_driver(&self, driver: &NewDriver) -> Result<DriverRecord> {
        self.check_reachable()?;
        let mut drivers = self.drivers.lock().unwrap();
        let record = DriverRecord::new(
            DriverId::new(drivers.len() as i64 + 1),
            driver.name.clone(),
            driver.phone.clone(),
        )
        .with_email(driver.email.clone())
        .with_password_sha256(Some(driver.password_sha256.clone()))
        .with_active(driver.active)
        .with_created_at(Some(chrono::Utc::now()));
        drivers.push(record.clone());
        Ok(record)
    }

    async fn fetch_tasks(&self, driver: &DriverProfile) -> Result<Vec<Task>> {
        self.check_reachable()?;
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.belongs_to(driver))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<()> {
        self.check_reachable()?;
        self.patches.lock().unwrap().push((id, patch.clone()));
        let mut failing = self.failing_updates.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(anyhow!("column \"completed_at\" does not exist"));
        }
        Ok(())
    }

    async fn insert_task_entry(&self, entry: &TaskEntry) -> Result<()> {
        self.check_reachable()?;
        if *self.fail_entry_insert.lock().unwrap() {
            return Err(anyhow!("insert rejected"));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn fetch_notifications(&self, _driver: &DriverProfile) -> Result<Vec<Notification>> {
        self.check_reachable()?;
        Ok(self.notifications.lock().unwrap().clone())
    }

    async fn fetch_read_markers(
        &self,
        driver: &DriverProfile,
    ) -> Result<Vec<NotificationReadMarker>> {
        self.check_reachable()?;
        Ok(self
            .markers
            .lock()
            .unwrap()
            .iter()
            .filter(|m| driver.is_named(&m.driver_name))
            .cloned()
            .collect())
    }

    async fn mark_notifications_read(&self, markers: &[NotificationReadMarker]) -> Result<()> {
        self.check_reachable()?;
        let mut stored = self.markers.lock().unwrap();
        for marker in markers {
            stored.retain(|m| {
                !(m.notification_id == marker.notification_id && m.driver_name == marker.driver_name)
            });
            stored.push(marker.clone());
        }
        Ok(())
    }

    async fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()> {
        self.check_reachable()?;
        if *self.fail_push.lock().unwrap() {
            return Err(anyhow!("push table unavailable"));
        }
        self.push_rows.lock().unwrap().push(registration.clone());
        Ok(())
    }
}

// ============================================================================
// Local store
// ============================================================================

#[derive(Default)]
pub struct FakeStore {
    pub profile: Mutex<Option<DriverProfile>>,
    pub signature: Mutex<Option<String>>,
    pub snapshot: Mutex<Vec<Task>>,
}

#[async_trait]
impl ILocalStore for FakeStore {
    async fn save_profile(&self, profile: &DriverProfile) -> Result<()> {
        *self.profile.lock().unwrap() = Some(profile.clone());
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<DriverProfile>> {
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn clear_profile(&self) -> Result<()> {
        *self.profile.lock().unwrap() = None;
        Ok(())
    }

    async fn last_push_signature(&self) -> Result<Option<String>> {
        Ok(self.signature.lock().unwrap().clone())
    }

    async fn save_push_signature(&self, signature: &str) -> Result<()> {
        *self.signature.lock().unwrap() = Some(signature.to_string());
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

// ============================================================================
// Storage and dispatch
// ============================================================================

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<(String, usize, String)>>,
}

#[async_trait]
impl IFileStorage for FakeStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len(), content_type.to_string()));
        Ok(format!("https://storage.test/{path}"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<DispatchMessage>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl IDispatchNotifier for RecordingNotifier {
    async fn notify(&self, message: &DispatchMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("relay down"));
        }
        Ok(())
    }
}
