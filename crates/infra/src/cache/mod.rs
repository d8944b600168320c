//! Query cache backing optimistic updates
//!
//! Views read friend lists and relationship statuses from this cache; the
//! mutation layer rewrites and invalidates entries through [`CacheStore`].

use std::time::Duration;

use friendsync_core::CacheStore;
use friendsync_domain::{CacheEntry, CacheKey};
use moka::sync::Cache;

const DEFAULT_MAX_CAPACITY: u64 = 1_024;

/// In-memory cache store on `moka`
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<CacheKey, CacheEntry>,
}

impl std::fmt::Debug for MokaCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheStore").finish_non_exhaustive()
    }
}

impl Default for MokaCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl MokaCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        Self { cache: Cache::new(max_capacity) }
    }

    /// Cache whose entries expire `ttl` after being written
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self { cache: Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build() }
    }
}

impl CacheStore for MokaCacheStore {
    fn read(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.get(key)
    }

    fn write(&self, key: CacheKey, value: CacheEntry) {
        self.cache.insert(key, value);
    }

    fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }
}
