//! Transfer channel error types

use thiserror::Error;

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors pushing recovered data onto a node
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Transfer to {node} failed with status {status}: {stderr}")]
    Failed {
        node: String,
        status: i32,
        stderr: String,
    },

    #[error("Transfer command failed to run: {0}")]
    Spawn(String),

    #[error("Remote existence check on {node} failed: {detail}")]
    ProbeFailed { node: String, detail: String },
}
