//! Common error types and utilities shared by the FriendSync crates
//!
//! # Error Handling Architecture
//!
//! The error handling system is built on three key components:
//!
//! 1. **`CommonError`**: the local failures shared across layers
//!    (configuration, serialization, storage)
//!
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by retryability, severity and criticality
//!
//! 3. **`ErrorSeverity` enum**: a unified severity level used in log fields
//!
//! Layer-specific errors **compose** with `CommonError` rather than
//! duplicating its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum QueueStoreError {
//!     #[error("Corrupt queue document: {0}")]
//!     Corrupt(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```
//!
//! | Pattern | CommonError Variant |
//! |---------|-------------------|
//! | **Serialization** | `Serialization` |
//! | **Configuration** | `Config` |
//! | **Storage** | `Storage` / `Persistence` |
//! | **Internal** | `Internal` |

use std::fmt;
use std::time::Duration;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Common error variants that appear across multiple layers
#[derive(Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// Raw I/O failures surfaced through `std::io::Error`
    Persistence { message: String, operation: Option<String> },

    /// Internal errors that shouldn't normally occur
    Internal { message: String },

    /// Key-value store failures
    Storage { message: String, operation: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => match field {
                Some(field) => write!(f, "Configuration error in field '{}': {}", field, message),
                None => write!(f, "Configuration error: {}", message),
            },
            Self::Serialization { message, format } => match format {
                Some(format) => write!(f, "Serialization error ({}): {}", format, message),
                None => write!(f, "Serialization error: {}", message),
            },
            Self::Persistence { message, operation } => match operation {
                Some(op) => write!(f, "Persistence error during '{}': {}", op, message),
                None => write!(f, "Persistence error: {}", message),
            },
            Self::Internal { message } => write!(f, "Internal error: {}", message),
            Self::Storage { message, operation } => match operation {
                Some(op) => write!(f, "Storage error during '{}': {}", op, message),
                None => write!(f, "Storage error: {}", message),
            },
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Internal { .. } => ErrorSeverity::Critical,
            Self::Config { .. }
            | Self::Serialization { .. }
            | Self::Persistence { .. }
            | Self::Storage { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl CommonError {
    /// Create a simple configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into(), format: None }
    }

    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into(), operation: None }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage { message: message.into(), operation: None }
    }

    pub fn storage_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Storage { message: message.into(), operation: Some(operation.into()) }
    }

    /// Stable snake_case label for log fields
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::Persistence { .. } => "persistence",
            Self::Internal { .. } => "internal",
            Self::Storage { .. } => "storage",
        }
    }
}

/// Trait for classifying errors by their characteristics
///
/// Implemented by every error type that crosses a layer boundary so that
/// retry policies and log statements can treat them uniformly.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again: network failures, rate limiting, timeouts, 5xx responses.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when a specific delay is known (a
    /// `Retry-After` hint or a breaker cooldown), or `None` otherwise.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

/// Utility macro for creating error conversions from std types
///
/// ```rust,ignore
/// #[derive(Debug, thiserror::Error)]
/// pub enum MyError {
///     #[error(transparent)]
///     Common(#[from] CommonError),
/// }
///
/// impl_error_conversion!(MyError, Common);
/// ```
///
/// This generates `From<serde_json::Error>` and `From<std::io::Error>`
/// for `MyError`, both routed through `CommonError`.
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    //! Unit tests for error handling functionality
    //!
    //! Tests cover display formatting, severity levels, retryability and
    //! conversions.

    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum WidgetError {
        #[error(transparent)]
        Common(#[from] CommonError),
    }

    impl_error_conversion!(WidgetError, Common);

    /// Validates that local failures are never retried and carry no hint.
    #[test]
    fn test_local_failures_are_not_retryable() {
        for err in [
            CommonError::config("bad"),
            CommonError::serialization("bad json"),
            CommonError::persistence("disk"),
            CommonError::storage_op("write", "disk full"),
        ] {
            assert!(!err.is_retryable(), "{err}");
            assert_eq!(err.retry_after(), None);
            assert_eq!(err.severity(), ErrorSeverity::Error);
        }
    }

    /// Validates severity ordering and criticality.
    ///
    /// Assertions:
    /// - Internal errors are critical with `Critical` severity.
    /// - `ErrorSeverity` orders Info < Warning < Error < Critical.
    #[test]
    fn test_severity_and_criticality() {
        let internal = CommonError::internal("invariant broken");
        assert!(internal.is_critical());
        assert_eq!(internal.severity(), ErrorSeverity::Critical);
        assert!(!CommonError::storage("disk full").is_critical());

        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    /// Validates display formatting with optional context.
    #[test]
    fn test_display_with_optional_fields() {
        assert_eq!(
            CommonError::storage_op("write", "disk full").to_string(),
            "Storage error during 'write': disk full"
        );
        assert_eq!(CommonError::storage("disk full").to_string(), "Storage error: disk full");
        assert_eq!(
            CommonError::config_field("retry.max_delay_ms", "must be >= base").to_string(),
            "Configuration error in field 'retry.max_delay_ms': must be >= base"
        );
    }

    /// Validates conversions generated by `impl_error_conversion!`.
    ///
    /// Assertions:
    /// - JSON errors become `Serialization` with the JSON format tag.
    /// - IO errors become `Persistence`.
    #[test]
    fn test_error_conversion_macro() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let WidgetError::Common(common) = WidgetError::from(json_err);
        assert!(matches!(
            common,
            CommonError::Serialization { format: Some(ref f), .. } if f == "JSON"
        ));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let WidgetError::Common(common) = WidgetError::from(io_err);
        assert_eq!(common.kind_label(), "persistence");
    }
}
