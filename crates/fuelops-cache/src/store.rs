//! SQLite implementation of ILocalStore
//!
//! ## Type Mapping
//!
//! | Domain Type       | SQL Type | Strategy                                 |
//! |-------------------|----------|------------------------------------------|
//! | DriverProfile     | TEXT x2  | `name` and `phone` columns                |
//! | push signature    | TEXT     | stored verbatim                          |
//! | Vec<Task>         | TEXT     | serde_json array, keyed by storage key   |
//! | DateTime<Utc>     | TEXT     | RFC 3339 via `to_rfc3339()`              |

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use fuelops_core::{
    domain::{DriverProfile, Task},
    ports::ILocalStore,
};

use crate::CacheError;

/// SQLite-backed local store
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ILocalStore for SqliteLocalStore {
    async fn save_profile(&self, profile: &DriverProfile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO session_profile (slot, name, phone, saved_at) VALUES (1, ?, ?, ?)
             ON CONFLICT(slot) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                saved_at = excluded.saved_at",
        )
        .bind(profile.name())
        .bind(profile.phone())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(CacheError::from)?;

        tracing::debug!(driver = profile.name(), "Saved driver profile");
        Ok(())
    }

    async fn load_profile(&self) -> anyhow::Result<Option<DriverProfile>> {
        let row = sqlx::query("SELECT name, phone FROM session_profile WHERE slot = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(CacheError::from)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let name: String = row.get("name");
                let phone: String = row.get("phone");
                let profile = DriverProfile::new(name, phone).map_err(|e| {
                    CacheError::SerializationError(format!("Stored profile is invalid: {e}"))
                })?;
                Ok(Some(profile))
            }
        }
    }

    async fn clear_profile(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM session_profile")
            .execute(&self.pool)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn last_push_signature(&self) -> anyhow::Result<Option<String>> {
        let signature: Option<String> =
            sqlx::query_scalar("SELECT signature FROM push_signature WHERE slot = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(CacheError::from)?;
        Ok(signature)
    }

    async fn save_push_signature(&self, signature: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO push_signature (slot, signature, synced_at) VALUES (1, ?, ?)
             ON CONFLICT(slot) DO UPDATE SET
                signature = excluded.signature,
                synced_at = excluded.synced_at",
        )
        .bind(signature)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(CacheError::from)?;
        Ok(())
    }

    async fn save_task_snapshot(&self, driver: &DriverProfile, tasks: &[Task]) -> anyhow::Result<()> {
        let tasks_json = serde_json::to_string(tasks)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO task_snapshot (driver_key, tasks_json, saved_at) VALUES (?, ?, ?)
             ON CONFLICT(driver_key) DO UPDATE SET
                tasks_json = excluded.tasks_json,
                saved_at = excluded.saved_at",
        )
        .bind(driver.storage_key())
        .bind(tasks_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(CacheError::from)?;

        tracing::debug!(driver = driver.name(), count = tasks.len(), "Saved task snapshot");
        Ok(())
    }

    async fn load_task_snapshot(&self, driver: &DriverProfile) -> anyhow::Result<Vec<Task>> {
        let tasks_json: Option<String> =
            sqlx::query_scalar("SELECT tasks_json FROM task_snapshot WHERE driver_key = ?")
                .bind(driver.storage_key())
                .fetch_optional(&self.pool)
                .await
                .map_err(CacheError::from)?;

        match tasks_json {
            None => Ok(Vec::new()),
            Some(json) => {
                let tasks = serde_json::from_str(&json).map_err(|e| {
                    CacheError::SerializationError(format!("Stored snapshot is invalid: {e}"))
                })?;
                Ok(tasks)
            }
        }
    }
}
