//! Node controller
//!
//! Per NODE.md, the controller executes the staged mutation sequence against
//! one cluster node. It is the only component that touches persistent state,
//! and it does so only after validation has passed. Every operation is safe
//! against partial retry; destructive steps are never retried automatically.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::cluster::ClusterManager;
use crate::plan::RecoveryPlan;
use crate::transfer::{TransferChannel, TransferStatus};

use super::configure::{render_recovery_config, write_recovery_config, FetchSettings};
use super::errors::{NodeError, NodeResult};
use super::snapshot::{snapshot_path_for, take_snapshot};
use super::state::NodePhase;

/// Bounded membership polling after a service stop.
#[derive(Debug, Clone)]
pub struct QuiescePolicy {
    pub attempts: u32,
    pub poll_delay: Duration,
}

impl Default for QuiescePolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            poll_delay: Duration::from_secs(2),
        }
    }
}

/// Result of a quiesce attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuiesceOutcome {
    /// Node confirmed absent from membership after `polls` checks
    Confirmed { polls: u32 },
    /// Node still listed after all bounded retries; continuing requires an
    /// explicit operator decision
    StillPresent { attempts: u32 },
}

/// Stop `node`'s service under the cluster manager and poll membership with
/// bounded retries until it disappears. Shared by the controller's Quiesce
/// and the reconciler's sibling quiesce.
pub fn quiesce_node<C: ClusterManager>(
    cluster: &C,
    node: &str,
    policy: &QuiescePolicy,
) -> NodeResult<QuiesceOutcome> {
    cluster
        .stop_service(node)
        .map_err(|e| NodeError::quiesce_failed(format!("stop failed: {}", e)))?;

    for poll in 1..=policy.attempts {
        let view = cluster
            .membership()
            .map_err(|e| NodeError::quiesce_failed(format!("membership check failed: {}", e)))?;

        if !view.contains(node) {
            return Ok(QuiesceOutcome::Confirmed { polls: poll });
        }

        if poll < policy.attempts {
            thread::sleep(policy.poll_delay);
        }
    }

    Ok(QuiesceOutcome::StillPresent {
        attempts: policy.attempts,
    })
}

/// What Stage observed.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub transfer: TransferStatus,
    pub markers_verified: usize,
}

/// Executes the staged state machine against one node.
pub struct NodeController<'a, C: ClusterManager, T: TransferChannel> {
    cluster: &'a C,
    transfer: &'a T,
    node: String,
    data_dir: PathBuf,
    /// Marker files (relative to the data directory) that must exist after
    /// Stage for the transfer to count
    markers: Vec<PathBuf>,
    quiesce_policy: QuiescePolicy,
    phase: NodePhase,
    snapshot_path: Option<PathBuf>,
}

impl<'a, C: ClusterManager, T: TransferChannel> NodeController<'a, C, T> {
    pub fn new(
        cluster: &'a C,
        transfer: &'a T,
        node: impl Into<String>,
        data_dir: impl Into<PathBuf>,
        markers: Vec<PathBuf>,
        quiesce_policy: QuiescePolicy,
    ) -> Self {
        Self {
            cluster,
            transfer,
            node: node.into(),
            data_dir: data_dir.into(),
            markers,
            quiesce_policy,
            phase: NodePhase::Running,
            snapshot_path: None,
        }
    }

    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The rollback anchor, once Snapshot has run.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Stop the node's service and poll membership until it disappears.
    ///
    /// On `StillPresent` the phase does not advance; the pipeline must route
    /// the warning through the confirmation policy and call
    /// `confirm_quiesce_override` to continue.
    pub fn quiesce(&mut self) -> NodeResult<QuiesceOutcome> {
        let outcome = quiesce_node(self.cluster, &self.node, &self.quiesce_policy)?;
        if let QuiesceOutcome::Confirmed { .. } = outcome {
            self.phase = self.phase.quiesce()?;
        }
        Ok(outcome)
    }

    /// Advance past an unconfirmed quiesce after an explicit operator
    /// decision.
    pub fn confirm_quiesce_override(&mut self) -> NodeResult<()> {
        self.phase = self.phase.quiesce()?;
        Ok(())
    }

    /// Rename the data directory aside; the returned path is the sole
    /// rollback anchor for everything that follows.
    pub fn take_snapshot(&mut self) -> NodeResult<PathBuf> {
        // Validate the transition before touching the filesystem.
        let next = self.phase.snapshot()?;

        let snapshot = self
            .snapshot_path
            .clone()
            .unwrap_or_else(|| snapshot_path_for(&self.data_dir, Utc::now()));
        let path = take_snapshot(&self.data_dir, &snapshot)?;

        self.snapshot_path = Some(path.clone());
        self.phase = next;
        Ok(path)
    }

    /// Push the recovered base data set and verify the marker files.
    ///
    /// A partial-transfer status is tolerated only when every marker file is
    /// present afterwards; otherwise Stage fails and the snapshot remains.
    pub fn stage(&mut self, scratch: &Path) -> NodeResult<StageReport> {
        let next = self.phase.stage()?;

        let status = self
            .transfer
            .push(scratch, &self.node, &self.data_dir)
            .map_err(|e| NodeError::stage_failed(format!("transfer failed: {}", e)))?;

        let mut missing = Vec::new();
        for marker in &self.markers {
            let path = self.data_dir.join(marker);
            let present = self
                .transfer
                .exists(&self.node, &path)
                .map_err(|e| NodeError::stage_failed(format!("marker check failed: {}", e)))?;
            if !present {
                missing.push(marker.display().to_string());
            }
        }

        if !missing.is_empty() {
            let detail = match status {
                TransferStatus::Partial { status } => {
                    format!("partial transfer (status {})", status)
                }
                TransferStatus::Complete => "transfer reported complete".to_string(),
            };
            return Err(NodeError::stage_failed(format!(
                "{} but marker files missing: {}",
                detail,
                missing.join(", ")
            )));
        }

        self.phase = next;
        Ok(StageReport {
            transfer: status,
            markers_verified: self.markers.len(),
        })
    }

    /// Write the recovery configuration into the staged data directory.
    pub fn configure(&mut self, plan: &RecoveryPlan, fetch: &FetchSettings) -> NodeResult<PathBuf> {
        if self.phase != NodePhase::Staged {
            return Err(NodeError::forbidden_transition(
                self.phase.state_name(),
                "Staged (configure)",
            ));
        }
        let contents = render_recovery_config(plan, fetch);
        write_recovery_config(&self.data_dir, "recovery.conf", &contents)
    }

    pub fn mark_recovering(&mut self) -> NodeResult<()> {
        self.phase = self.phase.begin_recovery()?;
        Ok(())
    }

    pub fn mark_completed(&mut self) -> NodeResult<()> {
        self.phase = self.phase.complete()?;
        Ok(())
    }

    pub fn mark_promoted(&mut self) -> NodeResult<()> {
        self.phase = self.phase.promote()?;
        Ok(())
    }

    /// Terminal failure. The snapshot path stays recorded so the caller can
    /// print the manual restoration path.
    pub fn mark_failed(&mut self) {
        if let Ok(next) = self.phase.fail() {
            self.phase = next;
        }
    }
}
