//! SQLite pool for the local store
//!
//! File databases run in WAL mode so the `watch` loop and a one-shot
//! command can share the file. The schema is embedded and applied on open.

use std::{path::Path, str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

const SCHEMA: &str = include_str!("migrations/20261019_initial.sql");

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_FILE_CONNECTIONS: u32 = 5;

/// Migrated pool of local store connections
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database at `db_path`, creating the file and its directory
    /// when missing
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` if the directory or connection cannot
    /// be created, `CacheError::MigrationFailed` if the schema cannot be
    /// applied.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("{}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = Self::open(options, MAX_FILE_CONNECTIONS)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("{}: {e}", db_path.display())))?;

        tracing::info!(path = %db_path.display(), "Local store opened");
        Self::migrated(pool).await
    }

    /// In-memory database for tests
    ///
    /// Limited to one connection: every SQLite memory connection is a
    /// separate database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;
        let pool = Self::open(options, 1)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("in-memory database: {e}")))?;
        Self::migrated(pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn open(options: SqliteConnectOptions, max: u32) -> Result<SqlitePool, sqlx::Error> {
        SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(options)
            .await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, CacheError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(e.to_string()))?;
        tracing::debug!("Local store schema applied");
        Ok(Self { pool })
    }
}
