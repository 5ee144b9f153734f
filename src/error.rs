//! Error types
//!
//! `StoreError` covers everything the bookmark store adapter can report.
//! `ApiError` is what the controller and tooling surface to callers.

use crate::types::NodeId;
use thiserror::Error;

/// Failures reported by a bookmark store adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// Host capability is missing. Permanent for the session.
    #[error("Bookmark store unavailable: {0}")]
    Unavailable(String),

    /// Provider-reported failure. Transient, the user may retry.
    #[error("Bookmark store error: {0}")]
    Provider(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the failure is the permanent "store absent" kind
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Errors surfaced by the controller and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to remove {id}: {source}")]
    RemovalFailed {
        id: NodeId,
        #[source]
        source: StoreError,
    },

    #[error("Node {id} cannot be removed: {reason}")]
    NotRemovable { id: NodeId, reason: String },

    #[error("Removal of {0} is already in progress")]
    RemovalInProgress(NodeId),

    #[error("Failed to open URL: {0}")]
    OpenFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
