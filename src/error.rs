//! Error taxonomy shared by ingestion, storage and retrieval.
//!
//! External collaborators (git, LLM) speak `anyhow`; their failures are
//! folded into [`CatalogError::Provider`] at the call site so callers can
//! always tell the kinds apart.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A profile (or request field) failed validation.
    #[error("invalid `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// Clone, read, summarize or embed failed.
    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    /// The backing store could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// Rejected before any I/O took place.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Machine-readable error kind, carried in ingestion and upsert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Provider,
    Store,
    InvalidArgument,
    Cancelled,
}

impl CatalogError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator failure, keeping the full `anyhow` context chain.
    pub fn provider(operation: &'static str, err: anyhow::Error) -> Self {
        Self::Provider {
            operation,
            message: format!("{err:#}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Store(_) => ErrorKind::Store,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("Failed to call Ollama embed API");
        let wrapped = CatalogError::provider("embed", err);
        let text = wrapped.to_string();
        assert!(text.starts_with("embed failed:"));
        assert!(text.contains("Failed to call Ollama embed API"));
        assert!(text.contains("connection refused"));
        assert_eq!(wrapped.kind(), ErrorKind::Provider);
    }

    #[test]
    fn test_validation_names_field() {
        let err = CatalogError::validation("tags", "contains a blank entry");
        assert_eq!(err.to_string(), "invalid `tags`: contains a blank entry");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_serializes_to_snake_case() {
        let json = serde_json::to_value(ErrorKind::InvalidArgument).unwrap();
        assert_eq!(json, "invalid_argument");
    }
}
