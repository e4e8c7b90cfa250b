//! Dispatch notification port
//!
//! Messages from a driver's client to the dispatch desk (e.g. "task
//! started"). Delivery is best-effort: callers log failures and move on.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::TaskId;

/// Body sent to the dispatch relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchMessage {
    pub title: String,
    pub message: String,
    pub task_id: TaskId,
    pub driver_name: String,
}

/// Port for notifying dispatch
#[async_trait]
pub trait IDispatchNotifier: Send + Sync {
    async fn notify(&self, message: &DispatchMessage) -> Result<()>;
}
