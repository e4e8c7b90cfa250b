//! Push token registration
//!
//! A device push token is written to `driver_push_tokens` (conflict key
//! `token`) only when the (token, name, phone, platform) tuple differs from
//! the last one that was successfully written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{errors::DomainError, profile::DriverProfile};

/// Row written to `driver_push_tokens`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRegistration {
    pub token: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub platform: String,
    pub updated_at: DateTime<Utc>,
}

impl PushRegistration {
    pub fn new(
        token: &str,
        driver: &DriverProfile,
        platform: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let token = token.trim();
        let platform = platform.trim();
        if token.is_empty() {
            return Err(DomainError::ValidationFailed(
                "push token must not be empty".into(),
            ));
        }
        if platform.is_empty() {
            return Err(DomainError::ValidationFailed(
                "platform must not be empty".into(),
            ));
        }
        Ok(Self {
            token: token.to_string(),
            driver_name: driver.name().to_string(),
            driver_phone: driver.phone().to_string(),
            platform: platform.to_lowercase(),
            updated_at,
        })
    }

    /// Dedupe signature, without `updated_at`
    pub fn signature(&self) -> String {
        [
            self.token.as_str(),
            self.driver_name.as_str(),
            self.driver_phone.as_str(),
            self.platform.as_str(),
        ]
        .join("|")
    }
}
