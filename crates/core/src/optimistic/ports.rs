//! Port interface for the local view cache

use friendsync_domain::{CacheEntry, CacheKey};

/// Synchronous cache of rendered social views
///
/// Invalidating a key removes it; the next read of that view refetches.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &CacheKey) -> Option<CacheEntry>;

    fn write(&self, key: CacheKey, value: CacheEntry);

    fn invalidate(&self, key: &CacheKey);
}
