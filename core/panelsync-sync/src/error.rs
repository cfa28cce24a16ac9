//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A variable set or assignment did not match the control schema.
    #[error("invalid variables: {0}")]
    Types(#[from] panelsync_types::Error),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// The transport has no live connection.
    #[error("not connected")]
    NotConnected,

    /// Protocol error (invalid message format).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid controller configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,
}
