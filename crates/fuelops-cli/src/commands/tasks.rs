//! Tasks commands - the driver's task board and task actions
//!
//! Every subcommand refreshes the board first (falling back to the local
//! snapshot when the backend is unreachable), then acts on the task by id.
//! Results of actions are written back into the snapshot.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use fuelops_core::{
    domain::{directions::directions_url, DriverProfile, MutationError, Task, TaskId},
    usecases::{CompletionForm, PhotoUpload},
};
use fuelops_sync::TaskSyncEngine;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    context::{AppContext, GlobalArgs},
    output::OutputFormatter,
};

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// Show the task board
    List,
    /// Start a pending task
    Start { id: i64 },
    /// Record a completed fueling
    Complete {
        id: i64,
        /// Liters delivered
        #[arg(long)]
        quantity: f64,
        /// Vehicle odometer reading
        #[arg(long)]
        odometer: Option<f64>,
        /// Station the fuel was drawn from
        #[arg(long)]
        station: Option<String>,
        /// Receipt number
        #[arg(long)]
        receipt: Option<String>,
        /// Photo as tag=path, e.g. receipt=./receipt.jpg (repeatable)
        #[arg(long)]
        photo: Vec<String>,
    },
    /// Report a problem with a task
    Issue {
        id: i64,
        /// What went wrong (replaces the task notes)
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show (or open) directions to the task's site
    Route {
        id: i64,
        /// Open the directions in the default browser
        #[arg(long)]
        open: bool,
    },
}

impl TasksCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(globals).await?;
        let fmt = globals.formatter();
        let driver = ctx.require_profile().await?;
        let mut engine = load_board(&ctx, &driver, &*fmt).await;

        match self {
            TasksCommand::List => {
                print_board(engine.tasks(), globals, &*fmt);
            }
            TasksCommand::Start { id } => {
                let task = find_task(&engine, *id)?;
                let next = ctx
                    .task_actions()
                    .start(&driver, &task)
                    .await
                    .map_err(mutation_error)?;
                engine.apply_local(next.clone()).await;
                report(globals, &*fmt, &next, "Started");
            }
            TasksCommand::Complete {
                id,
                quantity,
                odometer,
                station,
                receipt,
                photo,
            } => {
                let task = find_task(&engine, *id)?;
                let mut photos = Vec::with_capacity(photo.len());
                for spec in photo {
                    photos.push(read_photo(spec).await?);
                }
                let form = CompletionForm {
                    quantity: *quantity,
                    odometer: *odometer,
                    station: station.clone(),
                    receipt_number: receipt.clone(),
                    photos,
                };

                let next = ctx
                    .task_actions()
                    .complete(&driver, &task, form)
                    .await
                    .map_err(mutation_error)?;
                engine.apply_local(next.clone()).await;
                report(globals, &*fmt, &next, "Completed");
            }
            TasksCommand::Issue { id, reason } => {
                let task = find_task(&engine, *id)?;
                let next = ctx
                    .task_actions()
                    .report_issue(&task, reason.as_deref())
                    .await
                    .map_err(mutation_error)?;
                engine.apply_local(next.clone()).await;
                report(globals, &*fmt, &next, "Issue reported for");
            }
            TasksCommand::Route { id, open } => {
                let task = find_task(&engine, *id)?;
                let coordinates = task
                    .coordinates()
                    .ok_or_else(|| anyhow!("Task {id} has no site coordinates"))?;
                let url = directions_url(coordinates);

                if globals.is_json() {
                    fmt.print_json(&serde_json::json!({ "id": id, "url": url }));
                } else {
                    println!("{url}");
                }
                if *open {
                    webbrowser::open(&url).context("Failed to open browser")?;
                    info!(task_id = id, "Opened directions");
                }
            }
        }
        Ok(())
    }
}

/// Refreshes the board, warning (not failing) when only the snapshot is available
async fn load_board(
    ctx: &AppContext,
    driver: &DriverProfile,
    fmt: &dyn OutputFormatter,
) -> TaskSyncEngine {
    let (mut engine, _board) = ctx.engine(driver.clone(), CancellationToken::new());
    if let Err(e) = engine.refresh().await {
        warn!(error = %e, "Refresh failed");
        fmt.warn("Backend unreachable, showing the last saved tasks");
    }
    engine
}

fn find_task(engine: &TaskSyncEngine, id: i64) -> Result<Task> {
    engine
        .find(TaskId::new(id))
        .cloned()
        .ok_or_else(|| anyhow!("Task {id} is not on your board"))
}

fn mutation_error(e: MutationError) -> anyhow::Error {
    match e {
        MutationError::StatusUpdate {
            entry_saved: true, ..
        } => anyhow!(
            "{e}. The completion entry was saved; do not submit the form again, \
             the status will be corrected by dispatch"
        ),
        other => anyhow::Error::new(other),
    }
}

/// Parses `tag=path` and reads the file
async fn read_photo(spec: &str) -> Result<PhotoUpload> {
    let (tag, path) = spec
        .split_once('=')
        .filter(|(tag, path)| !tag.trim().is_empty() && !path.trim().is_empty())
        .ok_or_else(|| anyhow!("Photo must be given as tag=path, got '{spec}'"))?;
    let path = Path::new(path.trim());
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read photo {}", path.display()))?;

    Ok(PhotoUpload {
        tag: tag.trim().to_string(),
        bytes,
        content_type: content_type_for(path).to_string(),
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

fn report(globals: &GlobalArgs, fmt: &dyn OutputFormatter, task: &Task, verb: &str) {
    if globals.is_json() {
        fmt.print_json(&task_json(task));
    } else {
        fmt.success(&format!("{verb} task {}", task.id()));
    }
}

// ============================================================================
// Board rendering (shared with `watch`)
// ============================================================================

pub(crate) fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id().value(),
        "status": task.status().as_str(),
        "site_id": task.site_id(),
        "site_name": task.site_name(),
        "scheduled_at": task.scheduled_at(),
        "required_quantity": task.required_quantity(),
        "latitude": task.site_latitude(),
        "longitude": task.site_longitude(),
        "admin_status": task.admin_status(),
        "returned_to_driver": task.is_returned_to_driver(),
        "notes": task.notes(),
    })
}

pub(crate) fn task_line(task: &Task) -> String {
    let when = task
        .scheduled_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unscheduled".to_string());
    let site = task.site_name().or(task.site_id()).unwrap_or("unknown site");
    let quantity = task
        .required_quantity()
        .map(|q| format!(" {q} L"))
        .unwrap_or_default();
    let returned = if task.is_returned_to_driver() {
        " (returned)"
    } else {
        ""
    };
    format!(
        "#{:<6} {:<12} {when}  {site}{quantity}{returned}",
        task.id(),
        task.status().as_str()
    )
}

pub(crate) fn print_board(tasks: &[Task], globals: &GlobalArgs, fmt: &dyn OutputFormatter) {
    if globals.is_json() {
        let items: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
        fmt.print_json(&serde_json::Value::Array(items));
        return;
    }
    if tasks.is_empty() {
        fmt.success("No tasks assigned");
        return;
    }
    let open = tasks.iter().filter(|t| !t.is_completed()).count();
    fmt.success(&format!("{} task(s), {open} open", tasks.len()));
    for task in tasks {
        fmt.info(&task_line(task));
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use fuelops_core::domain::{TaskStatus, RETURNED_TO_DRIVER};

    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/receipt.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("meter.png")), "image/png");
        assert_eq!(content_type_for(Path::new("scan")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_read_photo() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("meter.webp");
        std::fs::write(&file, [1u8, 2, 3]).unwrap();

        let photo = read_photo(&format!("meter={}", file.display())).await.unwrap();
        assert_eq!(photo.tag, "meter");
        assert_eq!(photo.bytes, vec![1, 2, 3]);
        assert_eq!(photo.content_type, "image/webp");

        assert!(read_photo("no-separator").await.is_err());
        assert!(read_photo("=path").await.is_err());
        assert!(read_photo("tag=/does/not/exist.jpg").await.is_err());
    }

    #[test]
    fn test_task_line() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let task = Task::new(TaskId::new(11))
            .with_site(None, Some("North Depot".into()))
            .with_scheduled_at(Some(at))
            .with_required_quantity(Some(1500.0))
            .with_status(TaskStatus::Completed)
            .with_admin_status(Some(RETURNED_TO_DRIVER.into()));
        let line = task_line(&task);
        assert!(line.starts_with("#11"));
        assert!(line.contains("completed"));
        assert!(line.contains("2026-03-01 08:00  North Depot 1500 L (returned)"));
    }

    #[test]
    fn test_saved_entry_error_warns_against_resubmit() {
        let err = mutation_error(MutationError::StatusUpdate {
            entry_saved: true,
            message: "timeout".into(),
        });
        assert!(err.to_string().contains("do not submit the form again"));
    }
}
