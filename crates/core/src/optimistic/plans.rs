//! Tentative cache changes per mutation kind
//!
//! | Mutation | Tentative change | Invalidated on success |
//! |---|---|---|
//! | send | pending outgoing request, status `RequestSent` | outgoing, status |
//! | accept | drop incoming request, add friend when the sender is cached | incoming, friends |
//! | reject | drop incoming request | incoming |
//! | cancel | drop outgoing request | outgoing |
//! | unfriend | drop friend, status `None` | friends, status |
//! | block | add blocked user, drop friend | blocked, friends |
//! | unblock | drop blocked user | blocked |
//!
//! List edits only touch lists that are already cached. Status keys are
//! always written.

use friendsync_domain::constants::OPTIMISTIC_ID_PREFIX;
use friendsync_domain::{
    BlockedUser, CacheEntry, CacheKey, Friend, FriendOperation, FriendRequest, FriendshipStatus,
};

use super::ports::CacheStore;

/// A mutation's effect on the local cache
pub trait OptimisticUpdate {
    /// Keys whose values the tentative change may rewrite
    fn affected_keys(&self) -> Vec<CacheKey>;

    /// Install the tentative representation
    fn apply(&self, cache: &dyn CacheStore);

    /// Keys to refetch once the server has confirmed the mutation
    fn invalidation_keys(&self) -> Vec<CacheKey>;
}

impl OptimisticUpdate for FriendOperation {
    fn affected_keys(&self) -> Vec<CacheKey> {
        match self {
            FriendOperation::SendRequest(p) => {
                vec![CacheKey::OutgoingRequests, CacheKey::FriendshipStatus(p.receiver_id.clone())]
            }
            FriendOperation::Accept(_) => vec![CacheKey::IncomingRequests, CacheKey::Friends],
            FriendOperation::Reject(_) => vec![CacheKey::IncomingRequests],
            FriendOperation::CancelRequest(_) => vec![CacheKey::OutgoingRequests],
            FriendOperation::Unfriend(p) => {
                vec![CacheKey::Friends, CacheKey::FriendshipStatus(p.friend_id.clone())]
            }
            FriendOperation::Block(_) => vec![CacheKey::BlockedUsers, CacheKey::Friends],
            FriendOperation::Unblock(_) => vec![CacheKey::BlockedUsers],
        }
    }

    fn apply(&self, cache: &dyn CacheStore) {
        match self {
            FriendOperation::SendRequest(p) => {
                update_requests(cache, CacheKey::OutgoingRequests, |requests| {
                    if !requests.iter().any(|r| r.user_id == p.receiver_id) {
                        requests.push(FriendRequest {
                            id: format!("{OPTIMISTIC_ID_PREFIX}{}", p.receiver_id),
                            user_id: p.receiver_id.clone(),
                            message: p.message.clone(),
                        });
                    }
                });
                cache.write(
                    CacheKey::FriendshipStatus(p.receiver_id.clone()),
                    CacheEntry::Status(FriendshipStatus::RequestSent),
                );
            }
            FriendOperation::Accept(p) => {
                let sender = cache
                    .read(&CacheKey::IncomingRequests)
                    .and_then(|entry| {
                        entry
                            .as_requests()
                            .and_then(|requests| requests.iter().find(|r| r.id == p.request_id))
                            .map(|request| request.user_id.clone())
                    });
                update_requests(cache, CacheKey::IncomingRequests, |requests| {
                    requests.retain(|r| r.id != p.request_id);
                });
                if let Some(sender) = sender {
                    update_friends(cache, |friends| {
                        if !friends.iter().any(|f| f.id == sender) {
                            friends.push(Friend::new(sender.clone()));
                        }
                    });
                }
            }
            FriendOperation::Reject(p) => {
                update_requests(cache, CacheKey::IncomingRequests, |requests| {
                    requests.retain(|r| r.id != p.request_id);
                });
            }
            FriendOperation::CancelRequest(p) => {
                update_requests(cache, CacheKey::OutgoingRequests, |requests| {
                    requests.retain(|r| r.id != p.request_id);
                });
            }
            FriendOperation::Unfriend(p) => {
                update_friends(cache, |friends| friends.retain(|f| f.id != p.friend_id));
                cache.write(
                    CacheKey::FriendshipStatus(p.friend_id.clone()),
                    CacheEntry::Status(FriendshipStatus::None),
                );
            }
            FriendOperation::Block(p) => {
                update_blocked(cache, |blocked| {
                    if !blocked.iter().any(|b| b.user_id == p.user_id) {
                        blocked.push(BlockedUser { user_id: p.user_id.clone(), reason: p.reason.clone() });
                    }
                });
                update_friends(cache, |friends| friends.retain(|f| f.id != p.user_id));
            }
            FriendOperation::Unblock(p) => {
                update_blocked(cache, |blocked| blocked.retain(|b| b.user_id != p.user_id));
            }
        }
    }

    fn invalidation_keys(&self) -> Vec<CacheKey> {
        // Every tentative key is also refetched on success.
        self.affected_keys()
    }
}

fn update_friends(cache: &dyn CacheStore, edit: impl FnOnce(&mut Vec<Friend>)) {
    if let Some(CacheEntry::Friends(mut friends)) = cache.read(&CacheKey::Friends) {
        edit(&mut friends);
        cache.write(CacheKey::Friends, CacheEntry::Friends(friends));
    }
}

fn update_requests(cache: &dyn CacheStore, key: CacheKey, edit: impl FnOnce(&mut Vec<FriendRequest>)) {
    if let Some(CacheEntry::Requests(mut requests)) = cache.read(&key) {
        edit(&mut requests);
        cache.write(key, CacheEntry::Requests(requests));
    }
}

fn update_blocked(cache: &dyn CacheStore, edit: impl FnOnce(&mut Vec<BlockedUser>)) {
    if let Some(CacheEntry::BlockedUsers(mut blocked)) = cache.read(&CacheKey::BlockedUsers) {
        edit(&mut blocked);
        cache.write(CacheKey::BlockedUsers, CacheEntry::BlockedUsers(blocked));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimistic::test_support::MapCache;

    fn friends(ids: &[&str]) -> CacheEntry {
        CacheEntry::Friends(ids.iter().map(|id| Friend::new(*id)).collect())
    }

    /// Validates the send plan.
    ///
    /// Assertions:
    /// - A pending outgoing request with the optimistic id prefix is appended.
    /// - The relationship status becomes `RequestSent`.
    #[test]
    fn test_send_request_plan() {
        let cache = MapCache::default();
        cache.write(CacheKey::OutgoingRequests, CacheEntry::Requests(Vec::new()));

        FriendOperation::send_request("user-7", Some("hi".into())).apply(&cache);

        let outgoing = cache.read(&CacheKey::OutgoingRequests).unwrap();
        let requests = outgoing.as_requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].id.starts_with("optimistic-"));
        assert_eq!(requests[0].message.as_deref(), Some("hi"));
        assert_eq!(
            cache.read(&CacheKey::FriendshipStatus("user-7".into())),
            Some(CacheEntry::Status(FriendshipStatus::RequestSent))
        );
    }

    /// Validates that accept moves a known sender into the friends list.
    #[test]
    fn test_accept_plan_adds_friend() {
        let cache = MapCache::default();
        cache.write(
            CacheKey::IncomingRequests,
            CacheEntry::Requests(vec![FriendRequest::new("req-1", "user-3"), FriendRequest::new("req-2", "user-4")]),
        );
        cache.write(CacheKey::Friends, friends(&["friend-1"]));

        FriendOperation::accept("req-1").apply(&cache);

        let incoming = cache.read(&CacheKey::IncomingRequests).unwrap();
        assert_eq!(incoming.as_requests().unwrap().len(), 1);
        let list = cache.read(&CacheKey::Friends).unwrap();
        assert_eq!(list, friends(&["friend-1", "user-3"]));
    }

    /// Validates that uncached lists are left absent.
    #[test]
    fn test_plans_skip_uncached_lists() {
        let cache = MapCache::default();

        FriendOperation::block("user-1", None).apply(&cache);
        FriendOperation::unfriend("user-2").apply(&cache);

        assert!(cache.read(&CacheKey::BlockedUsers).is_none());
        assert!(cache.read(&CacheKey::Friends).is_none());
        assert_eq!(
            cache.read(&CacheKey::FriendshipStatus("user-2".into())),
            Some(CacheEntry::Status(FriendshipStatus::None))
        );
    }

    #[test]
    fn test_block_plan_moves_friend_to_blocked() {
        let cache = MapCache::default();
        cache.write(CacheKey::Friends, friends(&["user-1", "user-2"]));
        cache.write(CacheKey::BlockedUsers, CacheEntry::BlockedUsers(Vec::new()));

        FriendOperation::block("user-1", Some("spam".into())).apply(&cache);

        assert_eq!(cache.read(&CacheKey::Friends), Some(friends(&["user-2"])));
        let blocked = cache.read(&CacheKey::BlockedUsers).unwrap();
        assert_eq!(blocked.as_blocked().unwrap()[0].reason.as_deref(), Some("spam"));
    }

    #[test]
    fn test_invalidation_keys() {
        assert_eq!(
            FriendOperation::reject("req-1").invalidation_keys(),
            vec![CacheKey::IncomingRequests]
        );
        assert_eq!(
            FriendOperation::unfriend("f").invalidation_keys(),
            vec![CacheKey::Friends, CacheKey::FriendshipStatus("f".into())]
        );
    }
}
