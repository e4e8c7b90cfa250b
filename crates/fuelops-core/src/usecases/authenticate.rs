//! Authentication use case
//!
//! Validates a driver against the `drivers` credential store and manages
//! the session profile that gates every sync operation. Delegates lookups
//! to the backend port and persistence of the remembered profile to the
//! local store port.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    domain::{AuthError, DriverId, DriverProfile, DriverRecord, NewDriver},
    ports::{IBackendService, ILocalStore},
};

/// Use case for driver sign-in and registration
pub struct AuthenticateUseCase {
    backend: Arc<dyn IBackendService + Send + Sync>,
    store: Arc<dyn ILocalStore + Send + Sync>,
}

impl AuthenticateUseCase {
    /// Creates a new AuthenticateUseCase with the required dependencies
    ///
    /// # Arguments
    ///
    /// * `backend` - Credential store lookups and driver creation
    /// * `store` - Local persistence for the remembered profile
    pub fn new(
        backend: Arc<dyn IBackendService + Send + Sync>,
        store: Arc<dyn ILocalStore + Send + Sync>,
    ) -> Self {
        Self { backend, store }
    }

    /// Signs a driver in
    ///
    /// This method:
    /// 1. Resolves `identifier` to a driver record (numeric id first, then a
    ///    case-insensitive match on name, email or phone, newest record wins)
    /// 2. Verifies the password against the record
    /// 3. Persists the profile locally if `remember` is set
    ///
    /// # Errors
    ///
    /// Every credential failure is an [`AuthError`]; callers should show
    /// [`AuthError::user_message`] so account existence is not revealed.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        remember: bool,
    ) -> Result<DriverProfile, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let record = self
            .resolve_driver(identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if let Err(e) = record.verify_password(password) {
            info!(driver_id = %record.id(), reason = %e, "Login rejected");
            return Err(e);
        }

        let profile = record
            .profile()
            .map_err(|_| AuthError::InvalidCredentials)?;

        if remember {
            if let Err(e) = self.store.save_profile(&profile).await {
                // Non-fatal: the session lasts for this process only.
                warn!(error = %format!("{e:#}"), "Failed to remember driver profile");
            }
        }

        info!(driver = %profile.name(), remember, "Driver signed in");
        Ok(profile)
    }

    /// Clears the remembered profile
    pub async fn logout(&self) -> Result<()> {
        self.store
            .clear_profile()
            .await
            .context("Failed to clear remembered profile")?;
        info!("Driver signed out");
        Ok(())
    }

    /// The remembered profile, if any
    pub async fn restore(&self) -> Result<Option<DriverProfile>> {
        self.store
            .load_profile()
            .await
            .context("Failed to load remembered profile")
    }

    /// Creates a driver account with a hashed password
    pub async fn register_driver(
        &self,
        name: &str,
        phone: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<DriverRecord> {
        let new_driver =
            NewDriver::new(name, phone, email, password).context("Invalid driver details")?;

        let record = self
            .backend
            .create_driver(&new_driver)
            .await
            .context("Failed to create driver")?;

        info!(driver_id = %record.id(), name = %record.name(), "Driver registered");
        Ok(record)
    }

    async fn resolve_driver(&self, identifier: &str) -> Result<Option<DriverRecord>, AuthError> {
        if let Ok(id) = identifier.parse::<i64>() {
            let by_id = self
                .backend
                .find_driver_by_id(DriverId::new(id))
                .await
                .map_err(backend_error)?;
            if by_id.is_some() {
                return Ok(by_id);
            }
            // Phone numbers are numeric too.
            debug!("No driver with numeric id, falling back to field match");
        }

        let candidates = self
            .backend
            .search_drivers(identifier)
            .await
            .map_err(backend_error)?;

        Ok(newest(candidates))
    }
}

/// The most recently created record; records without `created_at` rank last
fn newest(candidates: Vec<DriverRecord>) -> Option<DriverRecord> {
    candidates
        .into_iter()
        .reduce(|best, next| {
            if next.created_at() > best.created_at() {
                next
            } else {
                best
            }
        })
}

fn backend_error(e: anyhow::Error) -> AuthError {
    AuthError::Backend(format!("{e:#}"))
}
