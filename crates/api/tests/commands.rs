//! Command surface tests
//!
//! Exercise the serializable command results the frontend consumes.

mod support;

use std::fmt;
use std::sync::Arc;

use friendsync_core::FriendsError;
use friendsync_infra::PlatformNetworkMonitor;
use friendsync_lib::{commands, AppContext};
use parking_lot::Mutex;
use support::{executor, fast_config, ScriptedExecutor};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

async fn context(online: bool) -> (AppContext, Arc<ScriptedExecutor>, Arc<PlatformNetworkMonitor>) {
    let backend = executor();
    let network = Arc::new(PlatformNetworkMonitor::new(online));
    let ctx = AppContext::build(fast_config(None), backend.clone(), network.clone())
        .await
        .unwrap();
    (ctx, backend, network)
}

#[tokio::test]
async fn test_send_request_online_is_delivered() {
    let (ctx, backend, _network) = context(true).await;

    let response =
        commands::send_friend_request(&ctx, "user-9", Some("hi".into())).await.unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "delivered");
    assert!(json["operationId"].is_null());
    assert_eq!(backend.calls(), 1);
    assert_eq!(commands::get_queue_status(&ctx).queued, 0);

    ctx.shutdown().await.unwrap();
}

/// Validates queue inspection and clearing while offline.
///
/// Assertions:
/// - Offline mutations report `queued` with an operation id
/// - Queue status and listing reflect both entries in order
/// - Clearing empties the queue
#[tokio::test]
async fn test_offline_queue_inspection_and_clear() {
    let (ctx, backend, _network) = context(false).await;

    let first = commands::reject_friend_request(&ctx, "req-1").await.unwrap();
    let second = commands::unblock_user(&ctx, "user-2").await.unwrap();
    assert_eq!(first.status, "queued");
    assert_eq!(second.status, "queued");

    let status = commands::get_queue_status(&ctx);
    assert_eq!(status.queued, 2);
    assert!(!status.online);
    assert!(!status.processing);

    let queued = commands::get_queued_operations(&ctx);
    assert_eq!(queued.len(), 2);
    assert_eq!(Some(queued[0].id.clone()), first.operation_id);
    assert_eq!(Some(queued[1].id.clone()), second.operation_id);

    commands::clear_offline_queue(&ctx).await.unwrap();
    assert_eq!(commands::get_queue_status(&ctx).queued, 0);
    assert_eq!(backend.calls(), 0);

    ctx.shutdown().await.unwrap();
}

/// Validates that a permanent failure surfaces only the classified message.
///
/// # Test Steps
/// 1. Script the backend to deny permission
/// 2. Cancel a request while online
/// 3. Verify the command error and that nothing was queued
/// 4. Verify the breaker counted one failed dispatch
#[tokio::test]
async fn test_permanent_failure_maps_to_command_error() {
    let (ctx, backend, _network) = context(true).await;
    backend.fail_with(Some(FriendsError::PermissionDenied("row level security: friends".into())));

    let err = commands::cancel_friend_request(&ctx, "req-4").await.unwrap_err();

    assert_eq!(err.category, "permission_denied");
    assert!(!err.retryable);
    assert_eq!(err.message, "You don't have permission to do that.");
    assert!(!err.message.contains("row level security"));
    assert_eq!(commands::get_queue_status(&ctx).queued, 0);

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["category"], "permission_denied");
    assert_eq!(json["retryable"], false);

    let breaker = commands::get_breaker_status(&ctx);
    assert_eq!(breaker.state, "CLOSED");
    assert_eq!(breaker.consecutive_failures, 1);
    assert_eq!(breaker.remaining_cooldown_ms, None);

    ctx.shutdown().await.unwrap();
}

/// Validates a manual drain after the backend recovers.
#[tokio::test]
async fn test_manual_drain_after_network_failure() {
    let (ctx, backend, _network) = context(true).await;
    backend.fail_with(Some(FriendsError::Network("connection reset".into())));

    let response = commands::unfriend(&ctx, "friend-1").await.unwrap();
    assert_eq!(response.status, "queued");

    backend.fail_with(None);
    let summary = commands::process_offline_queue(&ctx).await;

    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.remaining, 0);
    assert!(!summary.stalled);
    assert!(!summary.skipped);

    ctx.shutdown().await.unwrap();
}

/// Records `(message, command)` for every event carrying a `command` field
#[derive(Clone, Default)]
struct CommandEvents(Arc<Mutex<Vec<(String, String)>>>);

#[derive(Default)]
struct CommandVisitor {
    message: String,
    command: Option<String>,
}

impl Visit for CommandVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "command" {
            self.command = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CommandEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = CommandVisitor::default();
        event.record(&mut visitor);
        if let Some(command) = visitor.command {
            self.0.lock().push((visitor.message, command));
        }
    }
}

impl CommandEvents {
    fn commands_with(&self, message: &str) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter(|(m, _)| m == message)
            .map(|(_, command)| command.clone())
            .collect()
    }
}

/// Validates that every mutation command logs the same way.
///
/// # Test Steps
/// 1. Capture events while offline so each command queues
/// 2. Run all seven mutation commands
/// 3. Verify each logged `executing_command` and a success event in order
#[tokio::test]
async fn test_every_mutation_command_is_logged() {
    let events = CommandEvents::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));
    let (ctx, _backend, _network) = context(false).await;

    commands::send_friend_request(&ctx, "user-1", None).await.unwrap();
    commands::accept_friend_request(&ctx, "req-1").await.unwrap();
    commands::reject_friend_request(&ctx, "req-2").await.unwrap();
    commands::cancel_friend_request(&ctx, "req-3").await.unwrap();
    commands::unfriend(&ctx, "friend-1").await.unwrap();
    commands::block_user(&ctx, "user-2", None).await.unwrap();
    commands::unblock_user(&ctx, "user-3").await.unwrap();

    let expected: Vec<String> = [
        "friends::send_friend_request",
        "friends::accept_friend_request",
        "friends::reject_friend_request",
        "friends::cancel_friend_request",
        "friends::unfriend",
        "friends::block_user",
        "friends::unblock_user",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect();
    assert_eq!(events.commands_with("executing_command"), expected);
    assert_eq!(events.commands_with("command_execution_success"), expected);

    ctx.shutdown().await.unwrap();
}
