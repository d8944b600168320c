//! Commands - frontend to backend bridge

mod friends;
mod queue;

use friendsync_core::{FriendsError, MutationFailure};
use serde::Serialize;
use thiserror::Error;

pub use friends::*;
pub use queue::*;

/// Error returned to the frontend
///
/// Carries only the classified, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
    pub retryable: bool,
    pub category: &'static str,
}

impl From<MutationFailure> for CommandError {
    fn from(failure: MutationFailure) -> Self {
        Self {
            category: failure.category().as_str(),
            retryable: failure.classified.retryable,
            message: failure.classified.user_message,
        }
    }
}

impl From<&FriendsError> for CommandError {
    fn from(error: &FriendsError) -> Self {
        MutationFailure::from(error).into()
    }
}
