//! Top-level recovery error taxonomy
//!
//! Per ERRORS.md, every stage failure surfaces here as one typed variant.
//! Anything raised before Snapshot leaves no residual state; anything after
//! carries enough context for the CLI to print the manual restoration path.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::{CatalogError, SegmentId};
use crate::cluster::ClusterError;
use crate::config::ConfigError;
use crate::continuity::ContinuityError;
use crate::monitor::MonitorError;
use crate::node::NodeError;
use crate::plan::PlanError;
use crate::reconcile::ReconcileError;
use crate::validate::ValidationError;

pub type RecoveryResult<T> = Result<T, RecoveryError>;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("WAL gap: {} segment(s) missing, first {}", missing.len(), first_missing(missing))]
    WalGap { missing: Vec<SegmentId> },

    #[error("Archiving stalled: newest archived segment is older than target {target}")]
    ArchivingStalled {
        last_archived: Option<DateTime<Utc>>,
        target: DateTime<Utc>,
    },

    #[error(transparent)]
    Continuity(#[from] ContinuityError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("Recovery did not complete within {timeout_secs}s")]
    RecoveryTimeout { timeout_secs: u64 },

    #[error("Recovery ended before the configured target was reached; a WAL gap stopped replay")]
    RecoveryTargetUnreachable,

    #[error("Database process exited during recovery (code {code})")]
    ProcessExited { code: i32 },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("Aborted at the {gate} gate")]
    Aborted { gate: String },
}

fn first_missing(missing: &[SegmentId]) -> String {
    missing
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?".to_string())
}
