//! Shared command wiring
//!
//! Loads configuration, opens the local database and builds the backend
//! adapters and use cases each command needs.

use std::{path::Path, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use fuelops_backend::{BackendClient, HttpDispatchNotifier, HttpRealtimeFeed, RestBackend};
use fuelops_cache::{DatabasePool, SqliteLocalStore};
use fuelops_core::{
    config::Config,
    domain::{DriverProfile, Task},
    ports::ILocalStore,
    usecases::{
        AuthenticateUseCase, NotificationsUseCase, PushRegistrationUseCase, TaskActionsUseCase,
    },
};
use fuelops_sync::{CoordinateCache, TaskEnricher, TaskSyncEngine};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
}

impl GlobalArgs {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Reads the config file (defaults if absent) and applies env overrides
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
    } else {
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

/// Everything a backend-facing command needs
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteLocalStore>,
    pub client: Arc<BackendClient>,
    pub backend: Arc<RestBackend>,
    pub coordinates: Arc<CoordinateCache>,
    _pool: DatabasePool,
}

impl AppContext {
    /// Loads and validates the configuration, then opens the database
    pub async fn open(globals: &GlobalArgs) -> Result<Self> {
        let config = load_config(&globals.config_path)?;

        let errors = config.validate();
        if !errors.is_empty() {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!(
                "Invalid configuration ({}): {}",
                globals.config_path.display(),
                details.join("; ")
            );
        }

        let pool = DatabasePool::new(&config.storage.database)
            .await
            .context("Failed to open local database")?;
        let store = Arc::new(SqliteLocalStore::new(pool.pool().clone()));

        let client = Arc::new(BackendClient::new(
            config.backend.base_url(),
            config.backend.anon_key.clone(),
        ));
        let backend = Arc::new(RestBackend::new(
            Arc::clone(&client),
            config.backend.storage_bucket.clone(),
        ));

        info!(backend = %config.backend.base_url(), "Context ready");

        Ok(Self {
            config,
            store,
            client,
            backend,
            coordinates: Arc::new(CoordinateCache::new()),
            _pool: pool,
        })
    }

    pub fn auth(&self) -> AuthenticateUseCase {
        AuthenticateUseCase::new(self.backend.clone(), self.store.clone())
    }

    pub fn task_actions(&self) -> TaskActionsUseCase {
        let actions = TaskActionsUseCase::new(
            self.backend.clone(),
            self.backend.clone(),
            self.config.uploads.max_photo_bytes(),
        );
        match self.config.backend.dispatch_notify_url.as_deref() {
            Some(url) => actions.with_notifier(Arc::new(HttpDispatchNotifier::new(
                Arc::clone(&self.client),
                url,
            ))),
            None => actions,
        }
    }

    pub fn notifications(&self) -> NotificationsUseCase {
        NotificationsUseCase::new(self.backend.clone())
    }

    pub fn push(&self) -> PushRegistrationUseCase {
        PushRegistrationUseCase::new(self.backend.clone(), self.store.clone())
    }

    pub fn realtime(&self) -> HttpRealtimeFeed {
        HttpRealtimeFeed::new(
            Arc::clone(&self.client),
            self.config.backend.realtime_endpoint(),
            self.config.sync.event_buffer,
        )
    }

    /// A sync engine for `driver` sharing this context's coordinate cache
    pub fn engine(
        &self,
        driver: DriverProfile,
        shutdown: CancellationToken,
    ) -> (TaskSyncEngine, watch::Receiver<Vec<Task>>) {
        let enricher = TaskEnricher::new(Arc::clone(&self.coordinates), self.backend.clone());
        let (engine, rx) = TaskSyncEngine::new(
            driver,
            self.backend.clone(),
            self.store.clone(),
            enricher,
            shutdown,
        );
        (
            engine.with_refresh_interval(Duration::from_secs(self.config.sync.refresh_interval)),
            rx,
        )
    }

    /// The remembered driver, or an error telling the user to sign in
    pub async fn require_profile(&self) -> Result<DriverProfile> {
        match self
            .store
            .load_profile()
            .await
            .context("Failed to read remembered profile")?
        {
            Some(profile) => Ok(profile),
            None => bail!("Not signed in. Run 'fuelops auth login <identifier> --remember' first."),
        }
    }
}
