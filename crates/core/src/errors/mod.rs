//! Errors raised while delivering friend mutations
//!
//! [`FriendsError`] is what remote executors, the dispatcher and the queue
//! report. It is never shown to a user directly: [`classify`] turns it into
//! a retry decision and a fixed message.

mod classifier;

use std::time::Duration;

use friendsync_common::{impl_error_conversion, CommonError, ErrorClassification, ErrorSeverity};
use friendsync_domain::DomainError;
use thiserror::Error;

pub use classifier::{classify, ClassifiedError, ErrorCategory};

/// Failure of a friend mutation or of its delivery machinery
#[derive(Debug, Clone, Error)]
pub enum FriendsError {
    /// Connection could not be established or was lost
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The shared breaker rejected the call without contacting the backend
    #[error("Circuit breaker open, retry in {remaining:?}")]
    CircuitOpen { remaining: Duration },

    /// Failure reported by a transport that only exposes a status and text
    #[error("Remote error ({status:?}): {message}")]
    Remote { status: Option<u16>, message: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl_error_conversion!(FriendsError, Common);

impl FriendsError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote { status, message: message.into() }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Classify this error
    pub fn classify(&self) -> ClassifiedError {
        classify(self)
    }
}

impl ErrorClassification for FriendsError {
    fn is_retryable(&self) -> bool {
        classify(self).retryable
    }

    fn severity(&self) -> ErrorSeverity {
        match classify(self).category {
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::RateLimited => {
                ErrorSeverity::Warning
            }
            ErrorCategory::CircuitOpen | ErrorCategory::AuthExpired => ErrorSeverity::Warning,
            ErrorCategory::NotFound => ErrorSeverity::Info,
            ErrorCategory::PermissionDenied
            | ErrorCategory::Server
            | ErrorCategory::Unclassified => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Common(err) if err.is_critical())
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::CircuitOpen { remaining } => Some(*remaining),
            Self::Common(err) => err.retry_after(),
            _ => None,
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, FriendsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_conversions() {
        let err: FriendsError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, FriendsError::Common(CommonError::Serialization { .. })));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retry_after_hints() {
        let limited = FriendsError::RateLimited { retry_after: Some(Duration::from_secs(3)) };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
        assert!(limited.is_retryable());

        let open = FriendsError::CircuitOpen { remaining: Duration::from_secs(12) };
        assert_eq!(open.retry_after(), Some(Duration::from_secs(12)));
        assert!(!open.is_retryable());
    }

    #[test]
    fn test_severity_follows_category() {
        assert_eq!(FriendsError::network("offline").severity(), ErrorSeverity::Warning);
        assert_eq!(FriendsError::NotFound("req-1".into()).severity(), ErrorSeverity::Info);
        assert_eq!(FriendsError::server(503, "down").severity(), ErrorSeverity::Error);
        assert!(FriendsError::Common(CommonError::internal("bug")).is_critical());
    }
}
