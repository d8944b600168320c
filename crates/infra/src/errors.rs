//! Infrastructure errors and their conversion into the core error.

use std::path::PathBuf;

use friendsync_common::CommonError;
use friendsync_core::FriendsError;
use friendsync_domain::DomainError;
use thiserror::Error;

/// Errors raised by storage, configuration and runtime plumbing
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Background task start/stop misuse or failure
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),
}

pub type InfraResult<T> = std::result::Result<T, InfraError>;

impl InfraError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl From<DomainError> for InfraError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Config(message) => Self::Config(message),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<InfraError> for FriendsError {
    fn from(value: InfraError) -> Self {
        let common = match value {
            InfraError::Io { path, source } => {
                CommonError::storage_op(path.display().to_string(), source.to_string())
            }
            InfraError::Serialization(e) => CommonError::serialization_format("json", e.to_string()),
            InfraError::Config(message) => CommonError::config(message),
            InfraError::Logging(message) | InfraError::Lifecycle(message) => {
                CommonError::internal(message)
            }
        };
        FriendsError::Common(common)
    }
}
