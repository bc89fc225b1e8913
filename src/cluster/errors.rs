//! Cluster manager adapter error types

use thiserror::Error;

/// Result type for cluster manager operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors from the external cluster manager adapter
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Cluster manager command '{command}' failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Cluster manager command failed to run: {0}")]
    Spawn(String),

    #[error("Unparseable membership listing: {0}")]
    MalformedMembership(String),
}
