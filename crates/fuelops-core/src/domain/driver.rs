//! Driver credential record
//!
//! A row of the `drivers` table as seen by the login path, plus the
//! [`NewDriver`] payload used when dispatch registers a driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    errors::{AuthError, DomainError},
    newtypes::DriverId,
    password::{self, constant_time_eq},
    profile::DriverProfile,
};

/// A driver account in the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRecord {
    id: DriverId,
    name: String,
    phone: String,
    email: Option<String>,
    password_sha256: Option<String>,
    legacy_password: Option<String>,
    active: bool,
    created_at: Option<DateTime<Utc>>,
}

impl DriverRecord {
    /// Creates an active record with no password configured
    pub fn new(id: DriverId, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
            email: None,
            password_sha256: None,
            legacy_password: None,
            active: true,
            created_at: None,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn with_password_sha256(mut self, hash: Option<String>) -> Self {
        self.password_sha256 = hash;
        self
    }

    pub fn with_legacy_password(mut self, password: Option<String>) -> Self {
        self.legacy_password = password;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    // --- Getters ---

    pub fn id(&self) -> DriverId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Checks `input` against the stored credentials
    ///
    /// Order of checks:
    /// 1. Inactive accounts are rejected regardless of the password.
    /// 2. A populated SHA-256 field is compared against the hash of `input`.
    /// 3. Otherwise a populated legacy plaintext field is compared directly.
    /// 4. With neither field populated the check fails closed.
    pub fn verify_password(&self, input: &str) -> Result<(), AuthError> {
        if !self.active {
            return Err(AuthError::AccountInactive);
        }

        if let Some(hash) = non_blank(self.password_sha256.as_deref()) {
            return if password::verify_sha256(input, hash) {
                Ok(())
            } else {
                Err(AuthError::InvalidCredentials)
            };
        }

        if let Some(legacy) = non_blank(self.legacy_password.as_deref()) {
            return if constant_time_eq(legacy.as_bytes(), input.as_bytes()) {
                Ok(())
            } else {
                Err(AuthError::InvalidCredentials)
            };
        }

        Err(AuthError::PasswordNotConfigured)
    }

    /// The session identity for this driver
    pub fn profile(&self) -> Result<DriverProfile, DomainError> {
        DriverProfile::new(self.name.clone(), self.phone.clone())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Payload for registering a driver
///
/// Only the SHA-256 of the password is ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDriver {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password_sha256: String,
    pub active: bool,
}

impl NewDriver {
    /// Validates the fields and hashes `password`
    pub fn new(
        name: &str,
        phone: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() {
            return Err(DomainError::ValidationFailed("name must not be empty".into()));
        }
        if phone.is_empty() {
            return Err(DomainError::ValidationFailed("phone must not be empty".into()));
        }
        if password.is_empty() {
            return Err(DomainError::ValidationFailed(
                "password must not be empty".into(),
            ));
        }
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        if let Some(ref e) = email {
            if !e.contains('@') {
                return Err(DomainError::ValidationFailed(format!(
                    "invalid email address: {e}"
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
            email,
            password_sha256: password::sha256_hex(password),
            active: true,
        })
    }
}
