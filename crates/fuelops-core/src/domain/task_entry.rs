//! Task completion entries
//!
//! A [`TaskEntry`] is the immutable record appended to `driver_task_entries`
//! when a driver completes a task. A task may accumulate several entries if
//! dispatch returns it for re-work; entries are never updated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{errors::DomainError, newtypes::TaskId, profile::DriverProfile};

/// A completion record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    task_id: TaskId,
    driver_name: String,
    driver_phone: String,
    quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    odometer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt_number: Option<String>,
    photo_urls: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TaskEntry {
    /// Creates an entry for `task_id` filed by `driver`
    ///
    /// # Errors
    /// `quantity` must be finite and greater than zero.
    pub fn new(
        task_id: TaskId,
        driver: &DriverProfile,
        quantity: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::ValidationFailed(format!(
                "quantity must be greater than 0, got {quantity}"
            )));
        }
        Ok(Self {
            task_id,
            driver_name: driver.name().to_string(),
            driver_phone: driver.phone().to_string(),
            quantity,
            odometer: None,
            station: None,
            receipt_number: None,
            photo_urls: Vec::new(),
            created_at,
        })
    }

    pub fn with_odometer(mut self, odometer: Option<f64>) -> Self {
        self.odometer = odometer.filter(|o| o.is_finite());
        self
    }

    pub fn with_station(mut self, station: Option<String>) -> Self {
        self.station = station.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_receipt_number(mut self, receipt_number: Option<String>) -> Self {
        self.receipt_number = receipt_number.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_photo_urls(mut self, urls: Vec<String>) -> Self {
        self.photo_urls = urls;
        self
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn driver_phone(&self) -> &str {
        &self.driver_phone
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn odometer(&self) -> Option<f64> {
        self.odometer
    }

    pub fn station(&self) -> Option<&str> {
        self.station.as_deref()
    }

    pub fn receipt_number(&self) -> Option<&str> {
        self.receipt_number.as_deref()
    }

    pub fn photo_urls(&self) -> &[String] {
        &self.photo_urls
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
