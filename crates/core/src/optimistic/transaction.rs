//! Snapshot, tentative apply, then commit or roll back

use std::sync::Arc;

use friendsync_domain::{CacheEntry, CacheKey};
use tracing::debug;

use super::plans::OptimisticUpdate;
use super::ports::CacheStore;

/// One in-flight optimistic change
///
/// Settling consumes the transaction, so it is resolved exactly once.
pub struct OptimisticTransaction {
    cache: Arc<dyn CacheStore>,
    previous: Vec<(CacheKey, Option<CacheEntry>)>,
    tentative: Vec<(CacheKey, Option<CacheEntry>)>,
    invalidation_keys: Vec<CacheKey>,
}

impl std::fmt::Debug for OptimisticTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticTransaction")
            .field("previous", &self.previous)
            .field("tentative", &self.tentative)
            .finish_non_exhaustive()
    }
}

impl OptimisticTransaction {
    /// Snapshot the affected keys and install the tentative state
    pub fn begin(cache: Arc<dyn CacheStore>, update: &dyn OptimisticUpdate) -> Self {
        let keys = update.affected_keys();
        let previous = snapshot(cache.as_ref(), &keys);
        update.apply(cache.as_ref());
        let tentative = snapshot(cache.as_ref(), &keys);

        Self { cache, previous, tentative, invalidation_keys: update.invalidation_keys() }
    }

    /// Values before the tentative change, `None` where the key was absent
    pub fn previous(&self) -> &[(CacheKey, Option<CacheEntry>)] {
        &self.previous
    }

    pub fn tentative(&self) -> &[(CacheKey, Option<CacheEntry>)] {
        &self.tentative
    }

    /// Confirmed: drop the affected keys so they refetch
    pub fn commit(self) {
        for key in &self.invalidation_keys {
            self.cache.invalidate(key);
        }
        debug!(keys = self.invalidation_keys.len(), "optimistic_commit");
    }

    /// Failed: restore every snapshotted key exactly, including absence
    pub fn rollback(self) {
        for (key, value) in self.previous {
            match value {
                Some(value) => self.cache.write(key, value),
                None => self.cache.invalidate(&key),
            }
        }
        debug!("optimistic_rollback");
    }

    /// Pending: leave the tentative state until the queue settles it
    pub fn keep(self) {
        debug!(keys = self.tentative.len(), "optimistic_kept");
    }
}

fn snapshot(cache: &dyn CacheStore, keys: &[CacheKey]) -> Vec<(CacheKey, Option<CacheEntry>)> {
    keys.iter().map(|key| (key.clone(), cache.read(key))).collect()
}

#[cfg(test)]
mod tests {
    use friendsync_domain::{Friend, FriendOperation, FriendshipStatus};

    use super::*;
    use crate::optimistic::test_support::MapCache;

    fn seeded() -> Arc<MapCache> {
        let cache = Arc::new(MapCache::default());
        cache.write(
            CacheKey::Friends,
            CacheEntry::Friends(vec![Friend::new("friend-456"), Friend::new("friend-789")]),
        );
        cache
    }

    /// Validates the optimistic rollback scenario.
    ///
    /// Assertions:
    /// - Unfriending 456 tentatively leaves one friend.
    /// - Rolling back restores both entries.
    /// - A status key absent before the change is absent again.
    #[test]
    fn test_rollback_restores_exact_snapshot() {
        let cache = seeded();
        let txn = OptimisticTransaction::begin(cache.clone(), &FriendOperation::unfriend("friend-456"));

        let tentative = cache.read(&CacheKey::Friends).unwrap();
        assert_eq!(tentative.as_friends().unwrap().len(), 1);

        txn.rollback();

        let restored = cache.read(&CacheKey::Friends).unwrap();
        assert_eq!(restored.as_friends().unwrap().len(), 2);
        assert!(cache.read(&CacheKey::FriendshipStatus("friend-456".into())).is_none());
    }

    /// Validates that commit invalidates the affected keys.
    #[test]
    fn test_commit_invalidates() {
        let cache = seeded();
        let txn = OptimisticTransaction::begin(cache.clone(), &FriendOperation::unfriend("friend-789"));
        assert_eq!(txn.previous().len(), 2);
        assert_eq!(
            txn.tentative()[1].1,
            Some(CacheEntry::Status(FriendshipStatus::None))
        );

        txn.commit();

        assert!(cache.read(&CacheKey::Friends).is_none());
        assert!(cache.read(&CacheKey::FriendshipStatus("friend-789".into())).is_none());
    }

    #[test]
    fn test_keep_leaves_tentative_state() {
        let cache = seeded();
        OptimisticTransaction::begin(cache.clone(), &FriendOperation::unfriend("friend-789")).keep();

        let friends = cache.read(&CacheKey::Friends).unwrap();
        assert_eq!(friends.as_friends().unwrap(), &[Friend::new("friend-456")]);
    }
}
