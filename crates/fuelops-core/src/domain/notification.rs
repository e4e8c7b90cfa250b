//! Driver notifications and read markers
//!
//! Dispatch sends notifications either to a named driver or to everyone
//! (`driver_name` is null). Read state is tracked per driver with one
//! [`NotificationReadMarker`] per (notification, driver) pair.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::DriverProfile;

/// A message from dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: i64,
    title: String,
    message: String,
    driver_name: Option<String>,
    created_at: Option<DateTime<Utc>>,
    sent_by: Option<String>,
}

impl Notification {
    pub fn new(id: i64, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            message: message.into(),
            driver_name: None,
            created_at: None,
            sent_by: None,
        }
    }

    /// Targets a single driver; `None` or blank means broadcast
    pub fn with_driver_name(mut self, driver_name: Option<String>) -> Self {
        self.driver_name = driver_name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_sent_by(mut self, sent_by: Option<String>) -> Self {
        self.sent_by = sent_by;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn driver_name(&self) -> Option<&str> {
        self.driver_name.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn sent_by(&self) -> Option<&str> {
        self.sent_by.as_deref()
    }

    pub fn is_broadcast(&self) -> bool {
        self.driver_name.is_none()
    }

    /// Broadcasts are visible to everyone, targeted ones to the named driver
    pub fn is_visible_to(&self, driver: &DriverProfile) -> bool {
        match self.driver_name.as_deref() {
            None => true,
            Some(name) => driver.is_named(name),
        }
    }
}

/// Records that a driver has read a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReadMarker {
    pub notification_id: i64,
    pub driver_name: String,
    pub read_at: DateTime<Utc>,
}

impl NotificationReadMarker {
    pub fn new(notification_id: i64, driver: &DriverProfile, read_at: DateTime<Utc>) -> Self {
        Self {
            notification_id,
            driver_name: driver.name().to_string(),
            read_at,
        }
    }
}

/// Ids of notifications `driver` has read
pub fn read_ids(markers: &[NotificationReadMarker], driver: &DriverProfile) -> HashSet<i64> {
    markers
        .iter()
        .filter(|m| driver.is_named(&m.driver_name))
        .map(|m| m.notification_id)
        .collect()
}

/// Notifications visible to `driver` without a read marker for `driver`
pub fn unread<'a>(
    notifications: &'a [Notification],
    markers: &[NotificationReadMarker],
    driver: &DriverProfile,
) -> Vec<&'a Notification> {
    let read = read_ids(markers, driver);
    notifications
        .iter()
        .filter(|n| n.is_visible_to(driver) && !read.contains(&n.id))
        .collect()
}

/// Count of [`unread`] notifications
pub fn unread_count(
    notifications: &[Notification],
    markers: &[NotificationReadMarker],
    driver: &DriverProfile,
) -> usize {
    unread(notifications, markers, driver).len()
}
