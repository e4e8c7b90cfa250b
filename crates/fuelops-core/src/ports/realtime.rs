//! Realtime change feed port
//!
//! The backend pushes row changes for `driver_tasks`. Adapters decode the
//! transport frames (whose shape varies by transport version) into
//! [`TaskEvent`]s and deliver them over a bounded channel. The sync engine
//! consumes them one at a time in arrival order.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{DriverProfile, Task, TaskId};

/// Identity of a deleted row
///
/// Delete payloads often carry only the primary key, so the driver fields
/// are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedTask {
    pub id: TaskId,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
}

/// A decoded change to `driver_tasks`
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Inserted(Task),
    Updated(Task),
    Deleted(DeletedTask),
}

impl TaskEvent {
    /// Id of the affected task
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskEvent::Inserted(t) | TaskEvent::Updated(t) => t.id(),
            TaskEvent::Deleted(d) => d.id,
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            TaskEvent::Inserted(_) => "insert",
            TaskEvent::Updated(_) => "update",
            TaskEvent::Deleted(_) => "delete",
        }
    }

    /// True if the event may be applied to `driver`'s task list
    ///
    /// Inserts and updates must name the driver. Deletes without driver
    /// fields are accepted, since removing an id the driver does not hold
    /// is a no-op.
    pub fn concerns(&self, driver: &DriverProfile) -> bool {
        match self {
            TaskEvent::Inserted(t) | TaskEvent::Updated(t) => t.belongs_to(driver),
            TaskEvent::Deleted(d) => {
                if d.driver_name.is_none() && d.driver_phone.is_none() {
                    true
                } else {
                    driver.matches(d.driver_name.as_deref(), d.driver_phone.as_deref())
                }
            }
        }
    }
}

/// Port for subscribing to task changes
#[async_trait]
pub trait IRealtimeFeed: Send + Sync {
    /// Starts delivering events for `driver`
    ///
    /// The adapter keeps the subscription alive (reconnecting as needed)
    /// until `shutdown` is cancelled or the receiver is dropped.
    async fn subscribe(
        &self,
        driver: &DriverProfile,
        shutdown: CancellationToken,
    ) -> Result<mpsc::Receiver<TaskEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn irfan() -> DriverProfile {
        DriverProfile::new("Irfan", "566041714").unwrap()
    }

    #[test]
    fn test_concerns_upsert() {
        let mine = Task::new(TaskId::new(1)).with_driver(Some("irfan".into()), None);
        let theirs = Task::new(TaskId::new(2)).with_driver(Some("Bilal".into()), Some("5".into()));
        let anonymous = Task::new(TaskId::new(3));

        assert!(TaskEvent::Updated(mine).concerns(&irfan()));
        assert!(!TaskEvent::Inserted(theirs).concerns(&irfan()));
        assert!(!TaskEvent::Inserted(anonymous).concerns(&irfan()));
    }

    #[test]
    fn test_concerns_delete() {
        let bare = TaskEvent::Deleted(DeletedTask {
            id: TaskId::new(1),
            driver_name: None,
            driver_phone: None,
        });
        let foreign = TaskEvent::Deleted(DeletedTask {
            id: TaskId::new(1),
            driver_name: Some("Bilal".into()),
            driver_phone: None,
        });
        assert!(bare.concerns(&irfan()));
        assert!(!foreign.concerns(&irfan()));
        assert_eq!(bare.kind(), "delete");
        assert_eq!(bare.task_id(), TaskId::new(1));
    }
}
