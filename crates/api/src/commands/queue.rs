//! Offline queue and breaker inspection commands

use std::time::Instant;

use friendsync_core::DrainReport;
use friendsync_domain::QueuedOperation;
use serde::Serialize;

use crate::context::AppContext;
use crate::utils::logging::log_command_execution;

use super::CommandError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queued: usize,
    pub processing: bool,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainSummary {
    pub delivered: usize,
    pub dropped: usize,
    pub remaining: usize,
    pub stalled: bool,
    pub skipped: bool,
}

impl From<DrainReport> for DrainSummary {
    fn from(report: DrainReport) -> Self {
        Self {
            delivered: report.delivered,
            dropped: report.dropped,
            remaining: report.remaining,
            stalled: report.stalled,
            skipped: report.skipped,
        }
    }
}

/// Circuit breaker snapshot for diagnostics views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStatus {
    /// `CLOSED`, `OPEN` or `HALF_OPEN`
    pub state: String,
    pub consecutive_failures: u64,
    pub rejected_calls: u64,
    pub remaining_cooldown_ms: Option<u64>,
}

pub fn get_queue_status(ctx: &AppContext) -> QueueStatus {
    QueueStatus {
        queued: ctx.queue.get_queued_count(),
        processing: ctx.queue.is_processing(),
        online: ctx.queue.is_online(),
    }
}

pub fn get_queued_operations(ctx: &AppContext) -> Vec<QueuedOperation> {
    ctx.queue.get_queue()
}

/// Drain the queue now, regardless of the listener
pub async fn process_offline_queue(ctx: &AppContext) -> DrainSummary {
    let start = Instant::now();
    let report = ctx.queue.process_queue().await;
    log_command_execution("queue::process_offline_queue", start.elapsed(), !report.stalled, None);
    report.into()
}

pub async fn clear_offline_queue(ctx: &AppContext) -> Result<(), CommandError> {
    let start = Instant::now();
    let result = ctx.queue.clear_queue().await;
    log_command_execution("queue::clear_offline_queue", start.elapsed(), result.is_ok(), None);
    result.map_err(|e| CommandError::from(&e))
}

/// Forward an app-resume signal to the listener
pub async fn notify_app_resumed(ctx: &AppContext) -> DrainSummary {
    ctx.resume().await.into()
}

pub fn get_breaker_status(ctx: &AppContext) -> BreakerStatus {
    let breaker = ctx.dispatcher.breaker();
    let metrics = breaker.metrics();
    BreakerStatus {
        state: metrics.state.to_string(),
        consecutive_failures: metrics.consecutive_failures,
        rejected_calls: metrics.rejected_calls,
        remaining_cooldown_ms: breaker
            .remaining_cooldown()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
    }
}
