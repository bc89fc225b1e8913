//! Validation error types
//!
//! Per ERRORS.md, every validation failure happens before any mutation and
//! aborts the pipeline cleanly with no residual state.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::CatalogError;

/// Result type for target/backup validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors from the recovery target validator
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Backup {id} is not usable for recovery (status {status})")]
    BackupNotUsable { id: String, status: String },

    #[error("Recovery target {target} is not after backup end time {backup_end}")]
    TargetBeforeBackupEnd {
        target: DateTime<Utc>,
        backup_end: DateTime<Utc>,
    },

    #[error("Recovery target {target} lies beyond the archived window (last archived at {last_archived})")]
    TargetBeyondArchivedWindow {
        target: DateTime<Utc>,
        last_archived: DateTime<Utc>,
    },

    #[error("Invalid recovery target '{raw}': {reason}")]
    InvalidTarget { raw: String, reason: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
