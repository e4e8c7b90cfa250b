//! Local store port
//!
//! Durable client-side state that survives restarts:
//! - the remembered driver profile (only written when "remember" is set)
//! - the last successfully synchronized push-token signature
//! - the last successful task list per driver, used when the backend is
//!   unreachable

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{DriverProfile, Task};

/// Port for local persistence
#[async_trait]
pub trait ILocalStore: Send + Sync {
    async fn save_profile(&self, profile: &DriverProfile) -> Result<()>;

    async fn load_profile(&self) -> Result<Option<DriverProfile>>;

    /// Removes the remembered profile; succeeds if none was stored
    async fn clear_profile(&self) -> Result<()>;

    async fn last_push_signature(&self) -> Result<Option<String>>;

    async fn save_push_signature(&self, signature: &str) -> Result<()>;

    /// Replaces the snapshot for `driver`
    async fn save_task_snapshot(&self, driver: &DriverProfile, tasks: &[Task]) -> Result<()>;

    /// Last snapshot for `driver`, empty if none
    async fn load_task_snapshot(&self, driver: &DriverProfile) -> Result<Vec<Task>>;
}
