//! Settles tentative state left behind by queued mutations

use std::sync::Arc;

use friendsync_domain::QueuedOperation;
use tracing::{debug, warn};

use super::plans::OptimisticUpdate;
use super::ports::CacheStore;
use crate::delivery::DeliveryObserver;
use crate::errors::{classify, FriendsError};

/// Invalidates cache keys once the queue delivers or drops an entry
///
/// Tentative state installed while offline is superseded by a refetch in
/// both cases.
pub struct CacheInvalidationObserver {
    cache: Arc<dyn CacheStore>,
}

impl CacheInvalidationObserver {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }
}

impl DeliveryObserver for CacheInvalidationObserver {
    fn on_delivered(&self, entry: &QueuedOperation) {
        for key in entry.operation.invalidation_keys() {
            self.cache.invalidate(&key);
        }
        debug!(operation_id = %entry.id, "queued_operation_settled");
    }

    fn on_dropped(&self, entry: &QueuedOperation, error: &FriendsError) {
        for key in entry.operation.affected_keys() {
            self.cache.invalidate(&key);
        }
        let classified = classify(error);
        warn!(
            operation_id = %entry.id,
            kind = %entry.kind(),
            category = %classified.category,
            user_message = %classified.user_message,
            "queued_operation_abandoned"
        );
    }
}

#[cfg(test)]
mod tests {
    use friendsync_domain::{CacheEntry, CacheKey, Friend, FriendOperation};

    use super::*;
    use crate::optimistic::test_support::MapCache;

    #[test]
    fn test_delivered_and_dropped_invalidate_keys() {
        let cache = Arc::new(MapCache::default());
        cache.write(CacheKey::Friends, CacheEntry::Friends(vec![Friend::new("a")]));
        cache.write(CacheKey::BlockedUsers, CacheEntry::BlockedUsers(Vec::new()));
        let observer = CacheInvalidationObserver::new(cache.clone());

        observer.on_delivered(&QueuedOperation::now(FriendOperation::unblock("b")));
        assert!(cache.read(&CacheKey::BlockedUsers).is_none());
        assert!(cache.read(&CacheKey::Friends).is_some());

        observer.on_dropped(
            &QueuedOperation::now(FriendOperation::unfriend("a")),
            &FriendsError::network("offline"),
        );
        assert!(cache.read(&CacheKey::Friends).is_none());
    }
}
