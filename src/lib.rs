//! pitrctl - point-in-time recovery orchestration for replicated,
//! WAL-archived database clusters
//!
//! One recovery run walks a strict stage sequence: validate the backup and
//! target against the catalog, scan the WAL archive for continuity, plan,
//! then mutate exactly one node (quiesce, snapshot, stage, configure) and
//! optionally monitor the recovery boot and reconcile cluster membership
//! around the promoted node.

pub mod catalog;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod confirm;
pub mod continuity;
pub mod monitor;
pub mod node;
pub mod observability;
pub mod orchestrator;
pub mod plan;
pub mod reconcile;
pub mod runner;
pub mod transfer;
pub mod validate;
