//! File storage port
//!
//! Completion photos are written once to unique object paths and never
//! overwritten.

use anyhow::Result;
use async_trait::async_trait;

/// Port for object storage uploads
#[async_trait]
pub trait IFileStorage: Send + Sync {
    /// Stores `bytes` at `path` and returns a URL the backend can reference
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}
