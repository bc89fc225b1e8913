//! Cluster reconciler error types

use thiserror::Error;

use crate::cluster::ClusterError;
use crate::node::NodeError;

/// Result type for post-recovery reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors reconciling cluster membership after a completed recovery
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Node {node} did not become leader after {attempts} checks (promotion issued: {promotion_issued})")]
    PromotionFailed {
        node: String,
        attempts: u32,
        promotion_issued: bool,
    },

    #[error("Sibling quiesce failed: {0}")]
    SiblingQuiesce(#[source] NodeError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}
