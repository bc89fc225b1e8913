//! Post-recovery cluster reconciliation
//!
//! Per RECONCILE.md: quiesce siblings, restart the recovered node under the
//! cluster manager, verify (or force) its promotion to leader, and either
//! reseed siblings automatically or report the manual steps left.

mod errors;
mod reconciler;

pub use errors::{ReconcileError, ReconcileResult};
pub use reconciler::{ClusterReconciler, ReconcilePolicy, ReconcileReport};
