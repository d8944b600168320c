//! Failure classification
//!
//! Rules are checked in a fixed priority and the first match wins:
//!
//! | Category | Retryable |
//! |---|---|
//! | network | yes |
//! | rate limited | yes |
//! | auth expired | no |
//! | permission denied | no |
//! | not found | no |
//! | server (5xx) | yes |
//! | timeout | yes |
//! | circuit open | no |
//! | unclassified | no |
//!
//! Typed variants map directly. [`FriendsError::Remote`] is matched on its
//! status code and message text. Classification is pure and does no I/O.

use std::fmt;

use super::FriendsError;

const MSG_NETWORK: &str = "Unable to connect. Check your internet connection and try again.";
const MSG_RATE_LIMITED: &str = "Too many requests. Please wait a moment and try again.";
const MSG_AUTH_EXPIRED: &str = "Your session has expired. Please sign in again.";
const MSG_PERMISSION: &str = "You don't have permission to do that.";
const MSG_NOT_FOUND: &str = "That user or request could not be found.";
const MSG_SERVER: &str = "Something went wrong on our end. Please try again shortly.";
const MSG_TIMEOUT: &str = "The request timed out. Please try again.";
const MSG_FALLBACK: &str = "Something went wrong. Please try again.";

/// Signal a failure was classified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    RateLimited,
    AuthExpired,
    PermissionDenied,
    NotFound,
    Server,
    Timeout,
    CircuitOpen,
    Unclassified,
}

impl ErrorCategory {
    /// Failures worth parking in the offline queue instead of reverting
    pub fn is_queue_eligible(self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::AuthExpired => "auth_expired",
            ErrorCategory::PermissionDenied => "permission_denied",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Server => "server",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::CircuitOpen => "circuit_open",
            ErrorCategory::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry decision and user-facing message for one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub retryable: bool,
    pub user_message: String,
}

impl ClassifiedError {
    fn new(category: ErrorCategory, retryable: bool, user_message: impl Into<String>) -> Self {
        Self { category, retryable, user_message: user_message.into() }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Classify a failure
pub fn classify(error: &FriendsError) -> ClassifiedError {
    let category = category_of(error);
    match category {
        ErrorCategory::Network => ClassifiedError::new(category, true, MSG_NETWORK),
        ErrorCategory::RateLimited => ClassifiedError::new(category, true, MSG_RATE_LIMITED),
        ErrorCategory::AuthExpired => ClassifiedError::new(category, false, MSG_AUTH_EXPIRED),
        ErrorCategory::PermissionDenied => ClassifiedError::new(category, false, MSG_PERMISSION),
        ErrorCategory::NotFound => ClassifiedError::new(category, false, MSG_NOT_FOUND),
        ErrorCategory::Server => ClassifiedError::new(category, true, MSG_SERVER),
        ErrorCategory::Timeout => ClassifiedError::new(category, true, MSG_TIMEOUT),
        ErrorCategory::CircuitOpen => {
            ClassifiedError::new(category, false, circuit_open_message(error))
        }
        ErrorCategory::Unclassified => ClassifiedError::new(category, false, MSG_FALLBACK),
    }
}

fn circuit_open_message(error: &FriendsError) -> String {
    let remaining = match error {
        FriendsError::CircuitOpen { remaining } => Some(*remaining),
        _ => None,
    };
    match remaining {
        Some(remaining) => {
            // Round up so a sub-second remainder never reads as zero.
            let secs = remaining.as_millis().div_ceil(1000);
            format!("Friend actions are temporarily unavailable. Try again in {secs} seconds.")
        }
        None => "Friend actions are temporarily unavailable. Try again shortly.".to_string(),
    }
}

fn category_of(error: &FriendsError) -> ErrorCategory {
    match error {
        FriendsError::Network(_) => ErrorCategory::Network,
        FriendsError::RateLimited { .. } => ErrorCategory::RateLimited,
        FriendsError::AuthExpired(_) => ErrorCategory::AuthExpired,
        FriendsError::PermissionDenied(_) => ErrorCategory::PermissionDenied,
        FriendsError::NotFound(_) => ErrorCategory::NotFound,
        FriendsError::Server { status, .. } if (500..=599).contains(status) => ErrorCategory::Server,
        FriendsError::Server { .. } => ErrorCategory::Unclassified,
        FriendsError::Timeout(_) => ErrorCategory::Timeout,
        FriendsError::CircuitOpen { .. } => ErrorCategory::CircuitOpen,
        FriendsError::Remote { status, message } => category_of_remote(*status, message),
        FriendsError::Domain(_) => ErrorCategory::Unclassified,
        FriendsError::Common(_) => ErrorCategory::Unclassified,
    }
}

fn category_of_remote(status: Option<u16>, message: &str) -> ErrorCategory {
    let text = message.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| text.contains(needle));

    if mentions(&["network", "connection", "fetch", "offline"]) {
        return ErrorCategory::Network;
    }
    if status == Some(429) || mentions(&["rate limit", "too many requests"]) {
        return ErrorCategory::RateLimited;
    }
    if status == Some(401) || mentions(&["jwt expired", "session expired", "invalid token"]) {
        return ErrorCategory::AuthExpired;
    }
    if status == Some(403) || mentions(&["permission denied", "forbidden"]) {
        return ErrorCategory::PermissionDenied;
    }
    if status == Some(404) || mentions(&["not found"]) {
        return ErrorCategory::NotFound;
    }
    if matches!(status, Some(s) if (500..=599).contains(&s)) {
        return ErrorCategory::Server;
    }
    if status == Some(408) || mentions(&["timed out", "timeout"]) {
        return ErrorCategory::Timeout;
    }
    ErrorCategory::Unclassified
}
