//! RestBackend - port implementations over the hosted backend's REST API
//!
//! Implements [`IBackendService`], [`ISiteDirectory`] and [`IFileStorage`]
//! on top of one shared [`BackendClient`].
//!
//! ## Design Notes
//!
//! - Filters use PostgREST operators (`eq.`, `in.()`, `ilike.`, `or=()`).
//!   Values inside `or=()` and `in.()` are double-quoted; `ilike` values
//!   have their `%`/`_` wildcards escaped so they match literally.
//! - Rows that cannot be read (no id) are skipped with a warning rather than
//!   failing the whole list.
//! - Upserts send `Prefer: resolution=merge-duplicates` with `on_conflict`.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Method};
use tracing::{debug, warn};

use fuelops_core::{
    domain::{
        DriverId, DriverProfile, DriverRecord, NewDriver, Notification, NotificationReadMarker,
        PushRegistration, SiteKey, Task, TaskEntry, TaskId,
    },
    ports::{IBackendService, IFileStorage, ISiteDirectory, SiteRecord, TaskPatch},
};

use crate::{
    client::{BackendClient, Row},
    rows, BackendError,
};

const DRIVERS: &str = "/rest/v1/drivers";
const TASKS: &str = "/rest/v1/driver_tasks";
const TASK_ENTRIES: &str = "/rest/v1/driver_task_entries";
const NOTIFICATIONS: &str = "/rest/v1/driver_notifications";
const NOTIFICATION_READS: &str = "/rest/v1/driver_notification_reads";
const PUSH_TOKENS: &str = "/rest/v1/driver_push_tokens";
const SITES: &str = "/rest/v1/sites";

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

// ============================================================================
// Filter value encoding
// ============================================================================

/// Double-quotes a filter value, escaping `\` and `"`
pub(crate) fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Quoted `ilike` operand that matches `value` literally
///
/// `%` and `_` are escaped and the `*` wildcard alias is removed.
pub(crate) fn ilike_exact(value: &str) -> String {
    let literal = value
        .trim()
        .replace('*', "")
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    quote(&literal)
}

/// `or=` operand selecting rows assigned to `driver`
///
/// Case-insensitive name match, or an exact phone match when the profile
/// has a phone. Shared by task fetches and the realtime feed.
pub(crate) fn driver_filter(driver: &DriverProfile) -> String {
    if driver.phone().is_empty() {
        format!("(driver_name.ilike.{})", ilike_exact(driver.name()))
    } else {
        format!(
            "(driver_name.ilike.{},driver_phone.eq.{})",
            ilike_exact(driver.name()),
            quote(driver.phone())
        )
    }
}

fn collect<T>(
    rows: Vec<Row>,
    table: &str,
    read: impl Fn(&Row) -> Result<T, BackendError>,
) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match read(row) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(table, error = %e, "Skipping unreadable row");
                None
            }
        })
        .collect()
}

// ============================================================================
// RestBackend
// ============================================================================

/// REST adapter for the hosted backend
pub struct RestBackend {
    client: Arc<BackendClient>,
    bucket: String,
}

impl RestBackend {
    /// Creates the adapter; `bucket` is the storage bucket for photos
    pub fn new(client: Arc<BackendClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn client(&self) -> &Arc<BackendClient> {
        &self.client
    }

    /// Public URL of an object in the photo bucket
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.base_url(),
            self.bucket,
            path
        )
    }

    async fn upsert<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        on_conflict: &str,
        body: &T,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .request(Method::POST, path)
            .query(&[("on_conflict", on_conflict)])
            .header(PREFER, MERGE_DUPLICATES)
            .json(body);
        self.client.execute_with_retry(request).await?;
        Ok(())
    }
}

#[async_trait]
impl IBackendService for RestBackend {
    async fn find_driver_by_id(&self, id: DriverId) -> Result<Option<DriverRecord>> {
        let rows = self
            .client
            .get_rows(
                DRIVERS,
                &[
                    ("select", "*".to_string()),
                    ("id", format!("eq.{id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await
            .with_context(|| format!("Failed to look up driver {id}"))?;

        Ok(collect(rows, "drivers", rows::driver_from_row).into_iter().next())
    }

    async fn search_drivers(&self, identifier: &str) -> Result<Vec<DriverRecord>> {
        let value = ilike_exact(identifier);
        let rows = self
            .client
            .get_rows(
                DRIVERS,
                &[
                    ("select", "*".to_string()),
                    (
                        "or",
                        format!("(name.ilike.{value},email.ilike.{value},phone.ilike.{value})"),
                    ),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await
            .context("Failed to search drivers")?;

        debug!(matches = rows.len(), "Driver search complete");
        Ok(collect(rows, "drivers", rows::driver_from_row))
    }

    async fn create_driver(&self, driver: &NewDriver) -> Result<DriverRecord> {
        let request = self
            .client
            .request(Method::POST, DRIVERS)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(driver);
        let rows = self
            .client
            .fetch_rows(request)
            .await
            .with_context(|| format!("Failed to create driver {}", driver.name))?;

        let row = rows
            .first()
            .ok_or_else(|| BackendError::InvalidResponse("insert returned no row".into()))?;
        Ok(rows::driver_from_row(row)?)
    }

    async fn fetch_tasks(&self, driver: &DriverProfile) -> Result<Vec<Task>> {
        let filter = driver_filter(driver);
        let rows = self
            .client
            .get_rows(
                TASKS,
                &[
                    ("select", "*".to_string()),
                    ("or", filter),
                    ("order", "scheduled_at.asc".to_string()),
                ],
            )
            .await
            .context("Failed to fetch tasks")?;

        debug!(count = rows.len(), "Fetched task rows");
        Ok(collect(rows, "driver_tasks", rows::task_from_row))
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<()> {
        let request = self
            .client
            .request(Method::PATCH, TASKS)
            .query(&[("id", format!("eq.{id}"))])
            .json(patch);
        self.client
            .execute_with_retry(request)
            .await
            .with_context(|| format!("Failed to update task {id}"))?;
        Ok(())
    }

    async fn insert_task_entry(&self, entry: &TaskEntry) -> Result<()> {
        let request = self.client.request(Method::POST, TASK_ENTRIES).json(entry);
        self.client
            .execute_with_retry(request)
            .await
            .with_context(|| format!("Failed to insert entry for task {}", entry.task_id()))?;
        Ok(())
    }

    async fn fetch_notifications(&self, driver: &DriverProfile) -> Result<Vec<Notification>> {
        let rows = self
            .client
            .get_rows(
                NOTIFICATIONS,
                &[
                    ("select", "*".to_string()),
                    (
                        "or",
                        format!(
                            "(driver_name.is.null,driver_name.ilike.{})",
                            ilike_exact(driver.name())
                        ),
                    ),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await
            .context("Failed to fetch notifications")?;

        Ok(collect(rows, "driver_notifications", rows::notification_from_row))
    }

    async fn fetch_read_markers(
        &self,
        driver: &DriverProfile,
    ) -> Result<Vec<NotificationReadMarker>> {
        let rows = self
            .client
            .get_rows(
                NOTIFICATION_READS,
                &[
                    ("select", "*".to_string()),
                    ("driver_name", format!("eq.{}", driver.name())),
                ],
            )
            .await
            .context("Failed to fetch notification read markers")?;

        Ok(rows.iter().filter_map(rows::marker_from_row).collect())
    }

    async fn mark_notifications_read(&self, markers: &[NotificationReadMarker]) -> Result<()> {
        if markers.is_empty() {
            return Ok(());
        }
        self.upsert(NOTIFICATION_READS, "notification_id,driver_name", markers)
            .await
            .context("Failed to record notification reads")
    }

    async fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()> {
        self.upsert(PUSH_TOKENS, "token", registration)
            .await
            .context("Failed to register push token")
    }
}

#[async_trait]
impl ISiteDirectory for RestBackend {
    async fn lookup_by_ids(&self, ids: &[SiteKey]) -> Result<Vec<SiteRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids
            .iter()
            .map(|k| quote(k.as_str()))
            .collect::<Vec<_>>()
            .join(",");
        let rows = self
            .client
            .get_rows(
                SITES,
                &[
                    ("select", "id,name,latitude,longitude".to_string()),
                    ("id", format!("in.({list})")),
                ],
            )
            .await
            .context("Failed to look up sites by id")?;

        Ok(rows.iter().map(rows::site_from_row).collect())
    }

    async fn lookup_by_names(&self, names: &[SiteKey]) -> Result<Vec<SiteRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let clauses = names
            .iter()
            .map(|k| format!("name.ilike.{}", ilike_exact(k.as_str())))
            .collect::<Vec<_>>()
            .join(",");
        let rows = self
            .client
            .get_rows(
                SITES,
                &[
                    ("select", "id,name,latitude,longitude".to_string()),
                    ("or", format!("({clauses})")),
                ],
            )
            .await
            .context("Failed to look up sites by name")?;

        Ok(rows.iter().map(rows::site_from_row).collect())
    }
}

#[async_trait]
impl IFileStorage for RestBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();
        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", self.bucket, path),
            )
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        self.client
            .execute_with_retry(request)
            .await
            .with_context(|| format!("Failed to upload {path}"))?;

        debug!(path, size, "Uploaded object");
        Ok(self.public_url(path))
    }
}
