//! Shared doubles for app-level tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use friendsync_core::{FriendsError, OperationExecutor, Result};
use friendsync_domain::{FriendSyncConfig, RetrySettings};
use friendsync_lib::AppContext;
use parking_lot::Mutex;

/// Backend double whose every call returns the scripted outcome
#[derive(Default)]
pub struct ScriptedExecutor {
    failure: Mutex<Option<FriendsError>>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn fail_with(&self, error: Option<FriendsError>) {
        *self.failure.lock() = error;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OperationExecutor for ScriptedExecutor {
    async fn send_friend_request(&self, _receiver_id: &str, _message: Option<&str>) -> Result<()> {
        self.outcome()
    }
    async fn accept_friend_request(&self, _request_id: &str) -> Result<()> {
        self.outcome()
    }
    async fn reject_friend_request(&self, _request_id: &str) -> Result<()> {
        self.outcome()
    }
    async fn cancel_friend_request(&self, _request_id: &str) -> Result<()> {
        self.outcome()
    }
    async fn unfriend(&self, _friend_id: &str) -> Result<()> {
        self.outcome()
    }
    async fn block_user(&self, _user_id: &str, _reason: Option<&str>) -> Result<()> {
        self.outcome()
    }
    async fn unblock_user(&self, _user_id: &str) -> Result<()> {
        self.outcome()
    }
}

/// Config with millisecond backoff so real-time retries stay fast
pub fn fast_config(storage_path: Option<String>) -> FriendSyncConfig {
    let mut config = FriendSyncConfig::default();
    config.retry = RetrySettings {
        max_retries: 3,
        base_delay_ms: 1,
        max_delay_ms: 2,
        jitter_ms: 0,
        skip_non_retryable: false,
    };
    config.network.poll_interval_ms = 10;
    config.queue.storage_path = storage_path;
    config
}

/// Poll until the queue is empty or the deadline passes
pub async fn wait_for_empty_queue(ctx: &AppContext, deadline: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if ctx.queue.get_queued_count() == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    ctx.queue.get_queued_count() == 0
}

pub fn executor() -> Arc<ScriptedExecutor> {
    Arc::new(ScriptedExecutor::default())
}
