//! Port interfaces for mutation delivery

use async_trait::async_trait;
use friendsync_domain::{FriendOperation, NetworkStatus, QueuedOperation};
use tokio::sync::watch;

use crate::errors::{FriendsError, Result};

/// Remote backend that performs friend mutations
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn send_friend_request(&self, receiver_id: &str, message: Option<&str>) -> Result<()>;

    async fn accept_friend_request(&self, request_id: &str) -> Result<()>;

    async fn reject_friend_request(&self, request_id: &str) -> Result<()>;

    async fn cancel_friend_request(&self, request_id: &str) -> Result<()>;

    async fn unfriend(&self, friend_id: &str) -> Result<()>;

    async fn block_user(&self, user_id: &str, reason: Option<&str>) -> Result<()>;

    async fn unblock_user(&self, user_id: &str) -> Result<()>;
}

/// Sends one operation through the resilience stack
#[async_trait]
pub trait OperationDispatcher: Send + Sync {
    async fn dispatch(&self, operation: &FriendOperation) -> Result<()>;
}

/// Source of connectivity state
pub trait NetworkMonitor: Send + Sync {
    /// Current connectivity
    fn status(&self) -> NetworkStatus;

    /// Change stream, or `None` when the monitor can only be polled
    fn subscribe(&self) -> Option<watch::Receiver<NetworkStatus>>;

    fn is_connected(&self) -> bool {
        self.status().connected
    }
}

/// Durable string storage keyed by name
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// Receives the final fate of queued entries
pub trait DeliveryObserver: Send + Sync {
    fn on_delivered(&self, entry: &QueuedOperation);

    /// Entry removed after exhausting its retries
    fn on_dropped(&self, entry: &QueuedOperation, error: &FriendsError);
}
