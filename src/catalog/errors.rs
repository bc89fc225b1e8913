//! Catalog client error types

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from the external backup catalog service adapter
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Malformed WAL segment name: '{0}'")]
    MalformedSegmentName(String),

    #[error("Unparseable catalog response for {context}: {detail}")]
    MalformedResponse { context: String, detail: String },

    #[error("Catalog command '{command}' failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Catalog command failed to run: {0}")]
    Spawn(String),

    #[error("Base backup materialization failed: {0}")]
    MaterializationFailed(String),
}

impl CatalogError {
    /// Build a malformed-response error with context.
    pub fn malformed(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            detail: detail.into(),
        }
    }
}
