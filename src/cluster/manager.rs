//! Cluster manager client
//!
//! Per CLUSTER.md, the orchestrator consumes the external HA manager through
//! a deliberately narrow interface: list membership, stop/start the managed
//! service on a node, force-promote a candidate, and trigger a full resync
//! (reseed) of a node from the current leader. Leader election and live
//! replication stay entirely on the manager's side.

use crate::runner::CommandRunner;

use super::errors::{ClusterError, ClusterResult};
use super::membership::MembershipView;

/// Narrow interface over the external cluster manager.
pub trait ClusterManager {
    fn membership(&self) -> ClusterResult<MembershipView>;
    fn stop_service(&self, node: &str) -> ClusterResult<()>;
    fn start_service(&self, node: &str) -> ClusterResult<()>;
    /// Force-promote `node` to leader.
    fn promote(&self, node: &str) -> ClusterResult<()>;
    /// Full resync of `node` from the current leader, discarding its data.
    fn reinit(&self, node: &str) -> ClusterResult<()>;
}

/// Manager adapter backed by the cluster control command-line tool.
pub struct CommandCluster<R: CommandRunner> {
    runner: R,
    tool: String,
}

impl<R: CommandRunner> CommandCluster<R> {
    pub fn new(runner: R, tool: impl Into<String>) -> Self {
        Self {
            runner,
            tool: tool.into(),
        }
    }

    fn invoke(&self, args: &[String]) -> ClusterResult<String> {
        let out = self
            .runner
            .run(&self.tool, args)
            .map_err(|e| ClusterError::Spawn(e.to_string()))?;

        if !out.success() {
            return Err(ClusterError::CommandFailed {
                command: format!("{} {}", self.tool, args.join(" ")),
                status: out.status,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out.stdout)
    }

    fn simple(&self, verb: &str, node: &str) -> ClusterResult<()> {
        self.invoke(&[verb.to_string(), node.to_string()])?;
        Ok(())
    }
}

impl<R: CommandRunner> ClusterManager for CommandCluster<R> {
    fn membership(&self) -> ClusterResult<MembershipView> {
        let stdout = self.invoke(&[
            "list".to_string(),
            "--format".to_string(),
            "json".to_string(),
        ])?;
        MembershipView::parse(&stdout)
    }

    fn stop_service(&self, node: &str) -> ClusterResult<()> {
        self.simple("stop", node)
    }

    fn start_service(&self, node: &str) -> ClusterResult<()> {
        self.simple("start", node)
    }

    fn promote(&self, node: &str) -> ClusterResult<()> {
        self.simple("promote", node)
    }

    fn reinit(&self, node: &str) -> ClusterResult<()> {
        self.simple("reinit", node)
    }
}
