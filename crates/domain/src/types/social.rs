//! Locally cached social graph
//!
//! These are the values the optimistic layer reads and rewrites while a
//! mutation is in flight. The server remains authoritative.

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Friend {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: None }
    }
}

/// An incoming or outgoing friend request
///
/// `user_id` is the other party: the sender for incoming requests, the
/// receiver for outgoing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FriendRequest {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { id: id.into(), user_id: user_id.into(), message: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedUser {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Relationship between the current user and another user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    None,
    RequestSent,
    RequestReceived,
    Friends,
    Blocked,
}

impl_domain_status_conversions!(FriendshipStatus {
    None => "none",
    RequestSent => "request_sent",
    RequestReceived => "request_received",
    Friends => "friends",
    Blocked => "blocked",
});

/// Key of one cached view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Friends,
    IncomingRequests,
    OutgoingRequests,
    BlockedUsers,
    /// Relationship status with one user
    FriendshipStatus(String),
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Friends => write!(f, "friends"),
            CacheKey::IncomingRequests => write!(f, "incoming_requests"),
            CacheKey::OutgoingRequests => write!(f, "outgoing_requests"),
            CacheKey::BlockedUsers => write!(f, "blocked_users"),
            CacheKey::FriendshipStatus(user_id) => write!(f, "friendship_status:{user_id}"),
        }
    }
}

/// Value stored under a [`CacheKey`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CacheEntry {
    Friends(Vec<Friend>),
    Requests(Vec<FriendRequest>),
    BlockedUsers(Vec<BlockedUser>),
    Status(FriendshipStatus),
}

impl CacheEntry {
    pub fn as_friends(&self) -> Option<&[Friend]> {
        match self {
            CacheEntry::Friends(friends) => Some(friends),
            _ => None,
        }
    }

    pub fn as_requests(&self) -> Option<&[FriendRequest]> {
        match self {
            CacheEntry::Requests(requests) => Some(requests),
            _ => None,
        }
    }

    pub fn as_blocked(&self) -> Option<&[BlockedUser]> {
        match self {
            CacheEntry::BlockedUsers(users) => Some(users),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<FriendshipStatus> {
        match self {
            CacheEntry::Status(status) => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display() {
        assert_eq!(CacheKey::Friends.to_string(), "friends");
        assert_eq!(
            CacheKey::FriendshipStatus("user-1".into()).to_string(),
            "friendship_status:user-1"
        );
    }

    #[test]
    fn test_cache_entry_accessors() {
        let entry = CacheEntry::Friends(vec![Friend::new("friend-456")]);
        assert_eq!(entry.as_friends().map(<[Friend]>::len), Some(1));
        assert!(entry.as_requests().is_none());
        assert_eq!(
            CacheEntry::Status(FriendshipStatus::Blocked).as_status(),
            Some(FriendshipStatus::Blocked)
        );
    }
}
