//! Push registration use case

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    domain::{DriverProfile, PushRegistration},
    ports::{IBackendService, ILocalStore},
};

/// Result of [`PushRegistrationUseCase::sync_token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushSyncOutcome {
    /// Same tuple as the last successful write
    Skipped,
    Synced,
}

/// Writes the device push token to the backend when it changes
pub struct PushRegistrationUseCase {
    backend: Arc<dyn IBackendService + Send + Sync>,
    store: Arc<dyn ILocalStore + Send + Sync>,
}

impl PushRegistrationUseCase {
    pub fn new(
        backend: Arc<dyn IBackendService + Send + Sync>,
        store: Arc<dyn ILocalStore + Send + Sync>,
    ) -> Self {
        Self { backend, store }
    }

    /// Upserts the token unless the stored signature already matches
    ///
    /// The signature is stored only after the upsert succeeds, so a failed
    /// write is retried on the next call.
    pub async fn sync_token(
        &self,
        token: &str,
        driver: &DriverProfile,
        platform: &str,
    ) -> Result<PushSyncOutcome> {
        let registration = PushRegistration::new(token, driver, platform, Utc::now())
            .context("Invalid push registration")?;
        let signature = registration.signature();

        let last = match self.store.last_push_signature().await {
            Ok(last) => last,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to read push signature, syncing anyway");
                None
            }
        };
        if last.as_deref() == Some(signature.as_str()) {
            debug!("Push token unchanged, skipping");
            return Ok(PushSyncOutcome::Skipped);
        }

        self.backend
            .upsert_push_token(&registration)
            .await
            .context("Failed to register push token")?;

        self.store
            .save_push_signature(&signature)
            .await
            .context("Failed to save push signature")?;

        info!(platform = %registration.platform, "Push token registered");
        Ok(PushSyncOutcome::Synced)
    }
}
