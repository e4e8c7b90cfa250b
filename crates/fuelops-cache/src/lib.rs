//! FuelOps Cache - Local state persistence
//!
//! SQLite-based storage for:
//! - The remembered driver profile
//! - The last synchronized push-token signature
//! - Per-driver task snapshots used when the backend is unreachable
//!
//! ## Architecture
//!
//! This crate implements the `ILocalStore` port from `fuelops-core` using
//! SQLite. It is a driven (secondary) adapter in the hexagonal architecture.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use fuelops_cache::{DatabasePool, SqliteLocalStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/fuelops/fuelops.db")).await?;
//! let store = SqliteLocalStore::new(pool.pool().clone());
//! // Use store as ILocalStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqliteLocalStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
