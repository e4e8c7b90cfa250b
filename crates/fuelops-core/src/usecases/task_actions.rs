//! Task actions use case
//!
//! Driver-initiated transitions: start, complete and report issue.
//!
//! ## Completion sequence
//!
//! 1. Check the transition and every photo's size (no network yet)
//! 2. Upload photos to unique paths
//! 3. Append the completion entry
//! 4. Flip the status, retrying once without `completed_at` on failure
//!
//! The entry is written at most once per call. If the status update still
//! fails after the degraded retry, the error says the entry was saved so the
//! caller does not submit the form again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    domain::{
        DriverProfile, MutationError, Task, TaskEntry, TaskStatus, UploadError,
    },
    ports::{DispatchMessage, IBackendService, IDispatchNotifier, IFileStorage, TaskPatch},
};

/// A photo attached to a completion
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// What the photo shows, e.g. "receipt" or "meter"
    pub tag: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl PhotoUpload {
    /// File extension derived from the content type
    pub fn extension(&self) -> &'static str {
        match self.content_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/heic" => "heic",
            _ => "bin",
        }
    }
}

/// Fields of the completion form
#[derive(Debug, Clone, Default)]
pub struct CompletionForm {
    pub quantity: f64,
    pub odometer: Option<f64>,
    pub station: Option<String>,
    pub receipt_number: Option<String>,
    pub photos: Vec<PhotoUpload>,
}

/// Use case for driver task transitions
pub struct TaskActionsUseCase {
    backend: Arc<dyn IBackendService + Send + Sync>,
    storage: Arc<dyn IFileStorage + Send + Sync>,
    notifier: Option<Arc<dyn IDispatchNotifier + Send + Sync>>,
    max_photo_bytes: usize,
}

impl TaskActionsUseCase {
    pub fn new(
        backend: Arc<dyn IBackendService + Send + Sync>,
        storage: Arc<dyn IFileStorage + Send + Sync>,
        max_photo_bytes: usize,
    ) -> Self {
        Self {
            backend,
            storage,
            notifier: None,
            max_photo_bytes,
        }
    }

    /// Enables the "task started" message to dispatch
    pub fn with_notifier(mut self, notifier: Arc<dyn IDispatchNotifier + Send + Sync>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// `Pending -> InProgress`
    ///
    /// Dispatch is notified in the background; a failed notification is
    /// logged and never rolls the transition back.
    pub async fn start(&self, driver: &DriverProfile, task: &Task) -> Result<Task, MutationError> {
        let mut next = task.clone();
        next.start()?;

        self.backend
            .update_task(task.id(), &TaskPatch::status(TaskStatus::InProgress))
            .await
            .map_err(|e| MutationError::StatusUpdate {
                entry_saved: false,
                message: format!("{e:#}"),
            })?;

        info!(task_id = %task.id(), "Task started");

        if let Some(notifier) = self.notifier.clone() {
            let message = DispatchMessage {
                title: "Task started".to_string(),
                message: format!(
                    "{} started the task at {}",
                    driver.name(),
                    task.site_name().unwrap_or("an unnamed site")
                ),
                task_id: task.id(),
                driver_name: driver.name().to_string(),
            };
            tokio::spawn(async move {
                if let Err(e) = notifier.notify(&message).await {
                    warn!(task_id = %message.task_id, error = %format!("{e:#}"), "Dispatch notification failed");
                }
            });
        }

        Ok(next)
    }

    /// Completes a task and records the completion entry
    pub async fn complete(
        &self,
        driver: &DriverProfile,
        task: &Task,
        form: CompletionForm,
    ) -> Result<Task, MutationError> {
        self.complete_at(driver, task, form, Utc::now()).await
    }

    pub(crate) async fn complete_at(
        &self,
        driver: &DriverProfile,
        task: &Task,
        form: CompletionForm,
        now: DateTime<Utc>,
    ) -> Result<Task, MutationError> {
        let mut next = task.clone();
        next.complete(now)?;

        let entry = TaskEntry::new(task.id(), driver, form.quantity, now)?
            .with_odometer(form.odometer)
            .with_station(form.station)
            .with_receipt_number(form.receipt_number);

        for photo in &form.photos {
            if photo.bytes.len() > self.max_photo_bytes {
                return Err(UploadError::TooLarge {
                    tag: photo.tag.clone(),
                    size: photo.bytes.len(),
                    limit: self.max_photo_bytes,
                }
                .into());
            }
        }

        let mut urls = Vec::with_capacity(form.photos.len());
        for (index, photo) in form.photos.into_iter().enumerate() {
            let path = photo_path(driver, task, &photo, index, now);
            let tag = photo.tag.clone();
            let url = self
                .storage
                .upload(&path, photo.bytes, &photo.content_type)
                .await
                .map_err(|e| UploadError::Failed {
                    tag,
                    message: format!("{e:#}"),
                })?;
            debug!(task_id = %task.id(), path = %path, "Photo uploaded");
            urls.push(url);
        }
        let entry = entry.with_photo_urls(urls);

        self.backend
            .insert_task_entry(&entry)
            .await
            .map_err(|e| MutationError::EntryInsert(format!("{e:#}")))?;

        let patch = TaskPatch::status(TaskStatus::Completed).with_completed_at(now);
        if let Err(first) = self.backend.update_task(task.id(), &patch).await {
            warn!(
                task_id = %task.id(),
                error = %format!("{first:#}"),
                "Status update failed after entry was saved, retrying without completed_at"
            );
            self.backend
                .update_task(task.id(), &patch.degraded())
                .await
                .map_err(|e| MutationError::StatusUpdate {
                    entry_saved: true,
                    message: format!("{e:#}"),
                })?;
        }

        info!(task_id = %task.id(), quantity = entry.quantity(), "Task completed");
        Ok(next)
    }

    /// `Pending | InProgress -> Issue`; a non-blank reason replaces the notes
    pub async fn report_issue(
        &self,
        task: &Task,
        reason: Option<&str>,
    ) -> Result<Task, MutationError> {
        let mut next = task.clone();
        next.report_issue(reason)?;

        let patch = TaskPatch::status(TaskStatus::Issue).with_notes(
            reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        );

        self.backend
            .update_task(task.id(), &patch)
            .await
            .map_err(|e| MutationError::StatusUpdate {
                entry_saved: false,
                message: format!("{e:#}"),
            })?;

        info!(task_id = %task.id(), "Issue reported");
        Ok(next)
    }
}

/// `{driver}/{task_id}/{tag}-{millis}-{index}.{ext}`
///
/// Path segments are restricted to ASCII alphanumerics, `-` and `_`.
fn photo_path(
    driver: &DriverProfile,
    task: &Task,
    photo: &PhotoUpload,
    index: usize,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}/{}/{}-{}-{}.{}",
        sanitize(driver.name()),
        task.id(),
        sanitize(&photo.tag),
        now.timestamp_millis(),
        index,
        photo.extension()
    )
}

fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned
    }
}
