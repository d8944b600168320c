//! Domain types and models

pub mod network;
pub mod operation;
pub mod social;

pub use network::NetworkStatus;
pub use operation::{
    BlockPayload, FriendOperation, FriendPayload, OperationKind, QueuedOperation, RequestPayload,
    SendRequestPayload, UserPayload,
};
pub use social::{BlockedUser, CacheEntry, CacheKey, Friend, FriendRequest, FriendshipStatus};
