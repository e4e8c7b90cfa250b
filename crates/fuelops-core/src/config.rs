//! Configuration module for FuelOps.
//!
//! Typed configuration structs mapped to the YAML configuration file, with
//! loading, environment overrides, validation, defaults and a builder.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `backend.url`
pub const ENV_BACKEND_URL: &str = "FUELOPS_BACKEND_URL";
/// Environment variable overriding `backend.anon_key`
pub const ENV_ANON_KEY: &str = "FUELOPS_ANON_KEY";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for FuelOps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub sync: SyncConfig,
    pub uploads: UploadsConfig,
    pub push: PushConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Hosted backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abc.example.co`.
    pub url: String,
    /// Public anonymous API key sent with every request.
    pub anon_key: String,
    /// Object storage bucket for completion photos.
    pub storage_bucket: String,
    /// Change-feed endpoint. Defaults to `{url}/realtime/v1/changes`.
    pub realtime_url: Option<String>,
    /// Relay endpoint for "task started" messages. Disabled when unset.
    pub dispatch_notify_url: Option<String>,
}

/// Task board synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between full refreshes while watching.
    pub refresh_interval: u64,
    /// Capacity of the realtime event channel.
    pub event_buffer: usize,
}

/// Photo upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Largest accepted photo, in MiB.
    pub max_photo_mb: u64,
}

/// Push token registration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Platform label stored with the token.
    pub platform: String,
}

/// Local database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    pub database: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/fuelops/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("fuelops")
            .join("config.yaml")
    }

    /// Applies `FUELOPS_BACKEND_URL` and `FUELOPS_ANON_KEY` from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(ENV_BACKEND_URL) {
            self.backend.url = url.trim().to_string();
        }
        if let Some(key) = non_blank(ENV_ANON_KEY) {
            self.backend.anon_key = key.trim().to_string();
        }
    }
}

impl BackendConfig {
    /// `url` without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Change-feed endpoint, explicit or derived from `url`
    pub fn realtime_endpoint(&self) -> String {
        match self.realtime_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => format!("{}/realtime/v1/changes", self.base_url()),
        }
    }
}

impl UploadsConfig {
    pub fn max_photo_bytes(&self) -> usize {
        (self.max_photo_mb as usize).saturating_mul(1024 * 1024)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            storage_bucket: "task-photos".to_string(),
            realtime_url: None,
            dispatch_notify_url: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval: 60,
            event_buffer: 256,
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self { max_photo_mb: 10 }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            platform: "linux".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("fuelops")
                .join("fuelops.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.refresh_interval"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            })
        };

        // --- backend ---
        if !is_http_url(&self.backend.url) {
            push(
                "backend.url",
                format!("must be an http(s) URL, got '{}'", self.backend.url),
            );
        }
        if self.backend.anon_key.trim().is_empty() {
            push("backend.anon_key", "must be set".into());
        }
        if self.backend.storage_bucket.trim().is_empty() {
            push("backend.storage_bucket", "must not be empty".into());
        }
        if let Some(url) = &self.backend.realtime_url {
            if !is_http_url(url) {
                push(
                    "backend.realtime_url",
                    format!("must be an http(s) URL, got '{url}'"),
                );
            }
        }
        if let Some(url) = &self.backend.dispatch_notify_url {
            if !is_http_url(url) {
                push(
                    "backend.dispatch_notify_url",
                    format!("must be an http(s) URL, got '{url}'"),
                );
            }
        }

        // --- sync ---
        if self.sync.refresh_interval == 0 {
            push("sync.refresh_interval", "must be greater than 0".into());
        }
        if self.sync.event_buffer == 0 {
            push("sync.event_buffer", "must be greater than 0".into());
        }

        // --- uploads ---
        if self.uploads.max_photo_mb == 0 {
            push("uploads.max_photo_mb", "must be greater than 0".into());
        }

        // --- push ---
        if self.push.platform.trim().is_empty() {
            push("push.platform", "must not be empty".into());
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            push(
                "logging.format",
                format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use fuelops_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .backend_url("https://abc.example.co")
///     .anon_key("public-anon-key")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- backend ---

    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.url = url.into();
        self
    }

    pub fn anon_key(mut self, key: impl Into<String>) -> Self {
        self.config.backend.anon_key = key.into();
        self
    }

    pub fn storage_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.backend.storage_bucket = bucket.into();
        self
    }

    pub fn realtime_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.realtime_url = Some(url.into());
        self
    }

    pub fn dispatch_notify_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.dispatch_notify_url = Some(url.into());
        self
    }

    // --- sync ---

    pub fn refresh_interval(mut self, seconds: u64) -> Self {
        self.config.sync.refresh_interval = seconds;
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.config.sync.event_buffer = capacity;
        self
    }

    // --- uploads / push / storage ---

    pub fn max_photo_mb(mut self, mb: u64) -> Self {
        self.config.uploads.max_photo_mb = mb;
        self
    }

    pub fn push_platform(mut self, platform: impl Into<String>) -> Self {
        self.config.push.platform = platform.into();
        self
    }

    pub fn database(mut self, path: PathBuf) -> Self {
        self.config.storage.database = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    /// Consume the builder and return the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
