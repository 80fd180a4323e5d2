//! Error types for map construction and preview navigation.

use thiserror::Error;

/// Errors raised by the preview core.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Position {position} out of range (test has {total} items)")]
    PositionOutOfRange { position: usize, total: usize },

    #[error("Malformed route entry {index}: {reason}")]
    MalformedRoute { index: usize, reason: String },

    #[error("Test has no items to navigate")]
    EmptyTest,

    #[error("Invalid navigation request: {0}")]
    InvalidRequest(String),

    /// A host capability the preview context does not provide.
    #[error("Unsupported session context capability: {0}")]
    Unsupported(String),

    #[error("Preview session is closed")]
    SessionClosed,

    #[error("Resolver error: {0}")]
    Resolver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PreviewError {
    /// True for errors caused by the caller's request rather than the preview itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PreviewError::ItemNotFound(_)
                | PreviewError::PositionOutOfRange { .. }
                | PreviewError::MalformedRoute { .. }
                | PreviewError::InvalidRequest(_)
                | PreviewError::Unsupported(_)
        )
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PreviewError>;
