//! Site directory port
//!
//! Read-only access to the `sites` table, used to resolve task coordinates.
//! Every method takes a whole batch of keys so enrichment costs at most one
//! request per key kind.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Coordinates, SiteKey};

/// A site as returned by the directory
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    /// Site id as text (ids may be numeric or opaque)
    pub id: Option<String>,
    pub name: Option<String>,
    /// `None` when the site has no usable coordinates
    pub coordinates: Option<Coordinates>,
}

impl SiteRecord {
    pub fn id_key(&self) -> Option<SiteKey> {
        self.id.as_deref().and_then(SiteKey::new)
    }

    pub fn name_key(&self) -> Option<SiteKey> {
        self.name.as_deref().and_then(SiteKey::new)
    }
}

/// Port for batched site lookups
#[async_trait]
pub trait ISiteDirectory: Send + Sync {
    /// Sites whose id matches one of `ids`
    async fn lookup_by_ids(&self, ids: &[SiteKey]) -> Result<Vec<SiteRecord>>;

    /// Sites whose name matches one of `names`, case-insensitively
    async fn lookup_by_names(&self, names: &[SiteKey]) -> Result<Vec<SiteRecord>>;
}
