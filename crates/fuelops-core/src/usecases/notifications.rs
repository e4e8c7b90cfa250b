//! Notifications use case
//!
//! Builds the driver's inbox from the notification feed and the per-driver
//! read markers, and writes new markers.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::{
    domain::{notification, DriverProfile, Notification, NotificationReadMarker},
    ports::IBackendService,
};

/// Notifications visible to one driver
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    /// Newest first
    pub notifications: Vec<Notification>,
    pub read_ids: HashSet<i64>,
}

impl Inbox {
    pub fn is_read(&self, id: i64) -> bool {
        self.read_ids.contains(&id)
    }

    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !self.is_read(n.id()))
    }

    pub fn unread_count(&self) -> usize {
        self.unread().count()
    }
}

/// Use case for the notification inbox
pub struct NotificationsUseCase {
    backend: Arc<dyn IBackendService + Send + Sync>,
}

impl NotificationsUseCase {
    pub fn new(backend: Arc<dyn IBackendService + Send + Sync>) -> Self {
        Self { backend }
    }

    /// Loads broadcast and targeted notifications with read state
    pub async fn inbox(&self, driver: &DriverProfile) -> Result<Inbox> {
        let all = self
            .backend
            .fetch_notifications(driver)
            .await
            .context("Failed to fetch notifications")?;
        let markers = self
            .backend
            .fetch_read_markers(driver)
            .await
            .context("Failed to fetch read markers")?;

        let mut notifications: Vec<Notification> =
            all.into_iter().filter(|n| n.is_visible_to(driver)).collect();
        notifications.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        Ok(Inbox {
            notifications,
            read_ids: notification::read_ids(&markers, driver),
        })
    }

    /// Marks the given notifications read; already-read ids are rewritten
    pub async fn mark_read(&self, driver: &DriverProfile, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let markers: Vec<NotificationReadMarker> = ids
            .iter()
            .map(|id| NotificationReadMarker::new(*id, driver, now))
            .collect();

        self.backend
            .mark_notifications_read(&markers)
            .await
            .context("Failed to mark notifications read")?;
        info!(count = markers.len(), "Notifications marked read");
        Ok(())
    }

    /// Marks every unread notification read and returns how many there were
    pub async fn mark_all_read(&self, driver: &DriverProfile) -> Result<usize> {
        let inbox = self.inbox(driver).await?;
        let ids: Vec<i64> = inbox.unread().map(Notification::id).collect();
        self.mark_read(driver, &ids).await?;
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::usecases::testing::FakeBackend;

    fn irfan() -> DriverProfile {
        DriverProfile::new("Irfan", "566041714").unwrap()
    }

    fn setup() -> (NotificationsUseCase, Arc<FakeBackend>) {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let backend = Arc::new(FakeBackend::default());
        *backend.notifications.lock().unwrap() = vec![
            Notification::new(1, "Depot closed", "North depot closed today")
                .with_created_at(Some(base)),
            Notification::new(2, "Route change", "Take the ring road")
                .with_driver_name(Some("irfan".into()))
                .with_created_at(Some(base + Duration::hours(1))),
            Notification::new(3, "Other driver", "Not for you")
                .with_driver_name(Some("Noor".into()))
                .with_created_at(Some(base + Duration::hours(2))),
        ];
        (NotificationsUseCase::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_inbox_filters_and_orders() {
        let (uc, _) = setup();
        let inbox = uc.inbox(&irfan()).await.unwrap();
        let ids: Vec<i64> = inbox.notifications.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(inbox.unread_count(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_then_mark_all() {
        let (uc, backend) = setup();
        let driver = irfan();

        uc.mark_read(&driver, &[2]).await.unwrap();
        let inbox = uc.inbox(&driver).await.unwrap();
        assert!(inbox.is_read(2));
        assert_eq!(inbox.unread_count(), 1);

        assert_eq!(uc.mark_all_read(&driver).await.unwrap(), 1);
        assert_eq!(uc.inbox(&driver).await.unwrap().unread_count(), 0);
        assert_eq!(backend.markers.lock().unwrap().len(), 2);

        assert_eq!(uc.mark_all_read(&driver).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_markers_are_per_driver() {
        let (uc, _) = setup();
        let noor = DriverProfile::new("Noor", "1").unwrap();
        uc.mark_all_read(&noor).await.unwrap();

        let inbox = uc.inbox(&irfan()).await.unwrap();
        assert!(!inbox.is_read(1));
    }
}
