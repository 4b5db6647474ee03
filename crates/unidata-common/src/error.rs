//! Error types for the ingestion core

use thiserror::Error;

/// Result type alias for unidata operations
pub type Result<T> = std::result::Result<T, UnidataError>;

/// Failure taxonomy shared by the ingestion pipeline and its callers
#[derive(Error, Debug)]
pub enum UnidataError {
    /// An ingestion run was requested for an id missing from the registry
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Both the object-storage transport and the HTTP fallback failed
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Malformed JSON, or a top-level value that is not an array
    #[error("Parse error: {0}")]
    Parse(String),

    /// A raw item whose shape does not fit the source's field mapping
    #[error("Transform failed for source {source_id}: {reason}")]
    Transform { source_id: String, reason: String },

    /// The record store rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UnidataError {
    pub fn transform(source_id: &str, reason: impl Into<String>) -> Self {
        Self::Transform {
            source_id: source_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Whether this error should be reported as a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound(_))
    }
}
