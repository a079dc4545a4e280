//! Error types for gallery-comments

use crate::comment::ValidationErrors;
use crate::types::{CommentId, ItemId};
use thiserror::Error;

/// Main error type for gallery-comments
#[derive(Debug, Error)]
pub enum GalleryError {
    /// One or more fields failed validation; nothing was written
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Comment not found
    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    /// Update requested for a comment that was never stored
    #[error("Comment has not been saved yet")]
    NotPersisted,

    /// Create requested for a comment that is already stored
    #[error("Comment {0} is already saved")]
    AlreadyPersisted(CommentId),

    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<GalleryError>,
    },
}

impl GalleryError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        GalleryError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Field errors, if this is (or wraps) a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            GalleryError::Validation(errors) => Some(errors),
            GalleryError::WithContext { source, .. } => source.validation_errors(),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for GalleryError {
    fn from(errors: ValidationErrors) -> Self {
        GalleryError::Validation(errors)
    }
}

/// Result type alias for gallery-comments
pub type Result<T> = std::result::Result<T, GalleryError>;
