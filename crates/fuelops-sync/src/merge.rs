//! Realtime event reducer
//!
//! `reduce` applies one [`TaskEvent`] to the driver's task list and returns
//! the new list in board order: open tasks first, then completed ones, each
//! group by ascending schedule (missing schedule sorts as epoch 0). The sort
//! is stable, so tasks with equal keys keep their relative order.
//!
//! Events are expected to be enriched already; the reducer does no I/O.

use fuelops_core::{
    domain::{DriverProfile, Task},
    ports::TaskEvent,
};

/// Applies `event` to `tasks` for `driver`
///
/// Events that do not concern `driver` leave the list unchanged (but
/// sorted). A replaced task passes its client-only state to the incoming
/// row when the row lacks it.
pub fn reduce(mut tasks: Vec<Task>, event: TaskEvent, driver: &DriverProfile) -> Vec<Task> {
    if event.concerns(driver) {
        match event {
            TaskEvent::Deleted(deleted) => tasks.retain(|t| t.id() != deleted.id),
            TaskEvent::Inserted(incoming) | TaskEvent::Updated(incoming) => {
                upsert(&mut tasks, incoming)
            }
        }
    }
    sort_tasks(&mut tasks);
    tasks
}

/// Stable sort into board order
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.is_completed(), t.schedule_millis()));
}

fn upsert(tasks: &mut Vec<Task>, mut incoming: Task) {
    let id = incoming.id();
    match tasks.iter_mut().find(|t| t.id() == id) {
        Some(existing) => {
            incoming.inherit_local_state(existing);
            *existing = incoming;
        }
        None => tasks.push(incoming),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use fuelops_core::{
        domain::{TaskId, TaskStatus, TaskTimestamps, TimestampField},
        ports::DeletedTask,
    };

    use super::*;
    use crate::retention::RetentionFilter;

    fn irfan() -> DriverProfile {
        DriverProfile::new("Irfan", "566041714").unwrap()
    }

    fn task(id: i64, hours: Option<i64>) -> Task {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        Task::new(TaskId::new(id))
            .with_driver(Some("Irfan".into()), Some("566041714".into()))
            .with_scheduled_at(hours.map(|h| base + Duration::hours(h)))
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id().value()).collect()
    }

    fn is_board_ordered(tasks: &[Task]) -> bool {
        tasks.windows(2).all(|w| {
            (w[0].is_completed(), w[0].schedule_millis()) <= (w[1].is_completed(), w[1].schedule_millis())
        })
    }

    #[test]
    fn test_insert_update_delete() {
        let driver = irfan();
        let tasks = reduce(vec![], TaskEvent::Inserted(task(1, Some(5))), &driver);
        let tasks = reduce(tasks, TaskEvent::Inserted(task(2, Some(1))), &driver);
        assert_eq!(ids(&tasks), vec![2, 1]);

        let done = task(2, Some(1)).with_status(TaskStatus::Completed);
        let tasks = reduce(tasks, TaskEvent::Updated(done), &driver);
        assert_eq!(ids(&tasks), vec![1, 2]);

        let tasks = reduce(
            tasks,
            TaskEvent::Deleted(DeletedTask {
                id: TaskId::new(1),
                driver_name: None,
                driver_phone: None,
            }),
            &driver,
        );
        assert_eq!(ids(&tasks), vec![2]);
    }

    #[test]
    fn test_update_for_unknown_id_appends() {
        let tasks = reduce(vec![task(1, Some(1))], TaskEvent::Updated(task(9, Some(2))), &irfan());
        assert_eq!(ids(&tasks), vec![1, 9]);
    }

    #[test]
    fn test_missing_schedule_sorts_first() {
        let tasks = reduce(vec![task(1, Some(1))], TaskEvent::Inserted(task(2, None)), &irfan());
        assert_eq!(ids(&tasks), vec![2, 1]);
    }

    #[test]
    fn test_foreign_events_ignored() {
        let driver = irfan();
        let foreign = Task::new(TaskId::new(5)).with_driver(Some("Bilal".into()), Some("1".into()));
        let tasks = reduce(vec![task(1, Some(1))], TaskEvent::Inserted(foreign), &driver);
        assert_eq!(ids(&tasks), vec![1]);

        let foreign_delete = TaskEvent::Deleted(DeletedTask {
            id: TaskId::new(1),
            driver_name: Some("Bilal".into()),
            driver_phone: None,
        });
        assert_eq!(ids(&reduce(tasks, foreign_delete, &driver)), vec![1]);
    }

    #[test]
    fn test_local_marker_survives_update() {
        let driver = irfan();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let mut local = task(1, Some(1));
        local.complete(at).unwrap();

        let server_row = task(1, Some(1)).with_status(TaskStatus::Completed);
        let tasks = reduce(vec![local], TaskEvent::Updated(server_row), &driver);
        assert_eq!(tasks[0].local_completed_at(), Some(at));
    }

    #[test]
    fn test_recompleted_task_uses_new_completion_date() {
        let driver = irfan();
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let mut local = task(1, Some(1));
        local.complete(t0).unwrap();

        let returned = task(1, Some(1)).with_status(TaskStatus::Pending);
        let tasks = reduce(vec![local], TaskEvent::Updated(returned), &driver);
        assert_eq!(tasks[0].local_completed_at(), None);

        let recompleted_at = t0 + Duration::days(6);
        let recompleted = task(1, Some(1))
            .with_status(TaskStatus::Completed)
            .with_timestamps(TaskTimestamps {
                completed_at: Some(recompleted_at.to_rfc3339()),
                ..Default::default()
            });
        let tasks = reduce(tasks, TaskEvent::Updated(recompleted), &driver);
        assert_eq!(
            tasks[0].completion_date(),
            Some((TimestampField::CompletedAt, recompleted_at))
        );

        let kept = RetentionFilter::new().apply(tasks, t0 + Duration::days(8));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].local_completed_at(), Some(recompleted_at));
    }

    #[test]
    fn test_order_holds_after_event_sequence() {
        let driver = irfan();
        let mut tasks = Vec::new();
        for (i, hours) in [7, 3, 9, 1, 4, 8].into_iter().enumerate() {
            let mut t = task(i as i64, Some(hours));
            if i % 2 == 0 {
                t = t.with_status(TaskStatus::Completed);
            }
            tasks = reduce(tasks, TaskEvent::Inserted(t), &driver);
            assert!(is_board_ordered(&tasks));
        }
        tasks = reduce(tasks, TaskEvent::Updated(task(0, Some(0))), &driver);
        assert!(is_board_ordered(&tasks));
        assert_eq!(tasks.len(), 6);
    }
}
