//! Optimistic local-state reconciliation
//!
//! A mutation snapshots the cache keys it touches, installs a tentative
//! representation, then commits (invalidate) or rolls back (restore) once
//! the outcome is known.

pub mod observer;
pub mod plans;
pub mod ports;
pub mod transaction;

pub use observer::CacheInvalidationObserver;
pub use plans::OptimisticUpdate;
pub use ports::CacheStore;
pub use transaction::OptimisticTransaction;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use friendsync_domain::{CacheEntry, CacheKey};
    use parking_lot::Mutex;

    use super::CacheStore;

    #[derive(Default)]
    pub(crate) struct MapCache {
        entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    }

    impl CacheStore for MapCache {
        fn read(&self, key: &CacheKey) -> Option<CacheEntry> {
            self.entries.lock().get(key).cloned()
        }

        fn write(&self, key: CacheKey, value: CacheEntry) {
            self.entries.lock().insert(key, value);
        }

        fn invalidate(&self, key: &CacheKey) {
            self.entries.lock().remove(key);
        }
    }
}
