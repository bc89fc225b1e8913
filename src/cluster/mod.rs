//! Cluster manager adapter subsystem
//!
//! Per CLUSTER.md, text parsing of the manager's output is isolated here
//! behind typed results; the orchestrator never pattern-matches raw command
//! output elsewhere.

mod errors;
mod manager;
mod membership;

pub use errors::{ClusterError, ClusterResult};
pub use manager::{ClusterManager, CommandCluster};
pub use membership::{ClusterTopology, MemberInfo, MembershipView, NodeRole};
