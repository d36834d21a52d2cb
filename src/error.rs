//! Error definitions shared across subsystems.
//!
//! Only two places can fail in a way worth a type: loading a configuration
//! file, and delivering a record to a sink. Neither is ever allowed to reach
//! the request path; sink errors end their life in a log line.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading a configuration file from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`crate::config::AuditConfig`].
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors that can occur while delivering an audit record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The record could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The binding endpoint could not be reached.
    #[error("Connection failed: {0}")]
    Connect(#[from] tonic::transport::Error),

    /// The call did not finish before its deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-OK gRPC status.
    #[error("Remote error (grpc-status {code}): {message}")]
    Remote { code: i32, message: String },

    /// File open or write failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking writer task panicked or was cancelled.
    #[error("Writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<tonic::Status> for SinkError {
    fn from(status: tonic::Status) -> Self {
        SinkError::Remote {
            code: status.code() as i32,
            message: status.message().to_string(),
        }
    }
}

/// Convenience alias for sink results.
pub type SinkResult<T> = Result<T, SinkError>;
