//! Friend mutation commands
//!
//! Every command resolves to a [`MutationResponse`] or a classified
//! [`CommandError`]; raw backend detail is logged, never returned.

use std::future::Future;
use std::time::Instant;

use friendsync_core::{MutationFailure, MutationOutcome};
use serde::Serialize;
use tracing::info;

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_command_execution};

use super::CommandError;

/// How a mutation command settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    /// `delivered` or `queued`
    pub status: &'static str,
    pub operation_id: Option<String>,
}

impl From<MutationOutcome> for MutationResponse {
    fn from(outcome: MutationOutcome) -> Self {
        match outcome {
            MutationOutcome::Delivered => Self { status: "delivered", operation_id: None },
            MutationOutcome::Queued { operation_id } => {
                Self { status: "queued", operation_id: Some(operation_id) }
            }
        }
    }
}

/// Execute a mutation and log its outcome under `command`
async fn run(
    command: &'static str,
    mutation: impl Future<Output = Result<MutationOutcome, MutationFailure>>,
) -> Result<MutationResponse, CommandError> {
    info!(command, "executing_command");
    let start = Instant::now();
    let result = mutation.await;
    let elapsed = start.elapsed();
    match result {
        Ok(outcome) => {
            log_command_execution(command, elapsed, true, None);
            Ok(outcome.into())
        }
        Err(failure) => {
            log_command_execution(command, elapsed, false, Some(error_label(&failure)));
            Err(failure.into())
        }
    }
}

pub async fn send_friend_request(
    ctx: &AppContext,
    receiver_id: &str,
    message: Option<String>,
) -> Result<MutationResponse, CommandError> {
    run("friends::send_friend_request", ctx.mutations.send_friend_request(receiver_id, message)).await
}

pub async fn accept_friend_request(
    ctx: &AppContext,
    request_id: &str,
) -> Result<MutationResponse, CommandError> {
    run("friends::accept_friend_request", ctx.mutations.accept_friend_request(request_id)).await
}

pub async fn reject_friend_request(
    ctx: &AppContext,
    request_id: &str,
) -> Result<MutationResponse, CommandError> {
    run("friends::reject_friend_request", ctx.mutations.reject_friend_request(request_id)).await
}

pub async fn cancel_friend_request(
    ctx: &AppContext,
    request_id: &str,
) -> Result<MutationResponse, CommandError> {
    run("friends::cancel_friend_request", ctx.mutations.cancel_friend_request(request_id)).await
}

pub async fn unfriend(ctx: &AppContext, friend_id: &str) -> Result<MutationResponse, CommandError> {
    run("friends::unfriend", ctx.mutations.unfriend(friend_id)).await
}

pub async fn block_user(
    ctx: &AppContext,
    user_id: &str,
    reason: Option<String>,
) -> Result<MutationResponse, CommandError> {
    run("friends::block_user", ctx.mutations.block_user(user_id, reason)).await
}

pub async fn unblock_user(ctx: &AppContext, user_id: &str) -> Result<MutationResponse, CommandError> {
    run("friends::unblock_user", ctx.mutations.unblock_user(user_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization() {
        let queued = MutationResponse::from(MutationOutcome::Queued { operation_id: "op-1".into() });
        let json = serde_json::to_value(&queued).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "queued", "operationId": "op-1" }));

        let delivered = MutationResponse::from(MutationOutcome::Delivered);
        assert_eq!(delivered.operation_id, None);
    }
}
