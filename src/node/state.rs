//! Node phase state machine
//!
//! Per NODE.md:
//! - Phases are explicit and enumerable
//! - Transitions are strictly forward; no phase may be skipped
//! - Promoted and Failed are terminal
//! - A node that reaches Failed after Snapshot retains its pre-mutation
//!   snapshot; nothing in this machine ever discards it

use super::errors::{NodeError, NodeResult};

/// Orchestration phase of the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    /// Node is serving under the cluster manager; nothing touched yet
    Running,
    /// Service stopped and absence from membership confirmed (or explicitly
    /// overridden by the operator)
    Quiesced,
    /// Data directory renamed aside; the rollback anchor exists
    Snapshotted,
    /// Recovered base data present with all marker files, recovery
    /// configuration written
    Staged,
    /// Database process launched and replaying WAL
    Recovering,
    /// Replay reached the target and the process was handed back
    Completed,
    /// Terminal failure; pre-mutation snapshot retained
    Failed,
    /// Cluster manager confirmed the node as leader
    Promoted,
}

impl NodePhase {
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Quiesced => "Quiesced",
            Self::Snapshotted => "Snapshotted",
            Self::Staged => "Staged",
            Self::Recovering => "Recovering",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Promoted => "Promoted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Promoted | Self::Failed)
    }

    /// Running -> Quiesced
    pub fn quiesce(self) -> NodeResult<Self> {
        match self {
            Self::Running => Ok(Self::Quiesced),
            _ => Err(NodeError::forbidden_transition(self.state_name(), "Quiesced")),
        }
    }

    /// Quiesced -> Snapshotted
    pub fn snapshot(self) -> NodeResult<Self> {
        match self {
            Self::Quiesced => Ok(Self::Snapshotted),
            _ => Err(NodeError::forbidden_transition(
                self.state_name(),
                "Snapshotted",
            )),
        }
    }

    /// Snapshotted -> Staged
    pub fn stage(self) -> NodeResult<Self> {
        match self {
            Self::Snapshotted => Ok(Self::Staged),
            _ => Err(NodeError::forbidden_transition(self.state_name(), "Staged")),
        }
    }

    /// Staged -> Recovering
    pub fn begin_recovery(self) -> NodeResult<Self> {
        match self {
            Self::Staged => Ok(Self::Recovering),
            _ => Err(NodeError::forbidden_transition(
                self.state_name(),
                "Recovering",
            )),
        }
    }

    /// Recovering -> Completed
    pub fn complete(self) -> NodeResult<Self> {
        match self {
            Self::Recovering => Ok(Self::Completed),
            _ => Err(NodeError::forbidden_transition(
                self.state_name(),
                "Completed",
            )),
        }
    }

    /// Completed -> Promoted
    pub fn promote(self) -> NodeResult<Self> {
        match self {
            Self::Completed => Ok(Self::Promoted),
            _ => Err(NodeError::forbidden_transition(self.state_name(), "Promoted")),
        }
    }

    /// Any non-terminal phase -> Failed
    pub fn fail(self) -> NodeResult<Self> {
        if self.is_terminal() {
            return Err(NodeError::forbidden_transition(self.state_name(), "Failed"));
        }
        Ok(Self::Failed)
    }
}
