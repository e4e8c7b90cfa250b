//! Site coordinate cache
//!
//! Maps normalized site keys (from a site id or a site name) to resolved
//! coordinates. A directory record with both an id and a name populates both
//! keys with the same entry. Entries live for the process lifetime and are
//! never evicted; a later insert for the same key replaces the earlier one.

use dashmap::DashMap;
use fuelops_core::{
    domain::{Coordinates, SiteKey, Task},
    ports::SiteRecord,
};

/// A cached site position
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSite {
    pub coordinates: Coordinates,
    pub site_id: Option<String>,
    pub site_name: Option<String>,
}

/// Concurrent site coordinate cache, shared by `Arc`
#[derive(Debug, Default)]
pub struct CoordinateCache {
    entries: DashMap<SiteKey, CachedSite>,
}

impl CoordinateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, key: &SiteKey) -> Option<Coordinates> {
        self.entries.get(key).map(|entry| entry.coordinates)
    }

    /// Resolves a task by its site id key first, then its site name key
    pub fn resolve_task(&self, task: &Task) -> Option<Coordinates> {
        task.site_id_key()
            .and_then(|key| self.resolve(&key))
            .or_else(|| task.site_name_key().and_then(|key| self.resolve(&key)))
    }

    /// Caches a directory record under its id and name keys
    ///
    /// Returns `false` if the record has no coordinates or no usable key.
    pub fn insert(&self, record: &SiteRecord) -> bool {
        let Some(coordinates) = record.coordinates else {
            return false;
        };
        let keys: Vec<SiteKey> = [record.id_key(), record.name_key()]
            .into_iter()
            .flatten()
            .collect();
        if keys.is_empty() {
            return false;
        }

        let entry = CachedSite {
            coordinates,
            site_id: record.id.clone(),
            site_name: record.name.clone(),
        };
        for key in keys {
            self.entries.insert(key, entry.clone());
        }
        true
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
