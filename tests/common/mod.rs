//! Shared in-memory fakes for the scenario tests: a catalog with a scripted
//! archive, a cluster manager with behavioral membership, and a transfer
//! channel that copies files locally.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use pitrctl::catalog::{
    parse_catalog_time, BackupCatalog, BackupRecord, BackupStatus, CatalogError, CatalogResult,
    SegmentId, WalStore,
};
use pitrctl::cluster::{
    ClusterManager, ClusterResult, MemberInfo, MembershipView, NodeRole,
};
use pitrctl::config::Config;
use pitrctl::monitor::{MonitorResult, RecoveryProbe};
use pitrctl::transfer::{TransferChannel, TransferResult, TransferStatus};

pub const BACKUP_ID: &str = "20260104T120000";
pub const SERVER: &str = "db1";

pub fn backup_end_time() -> DateTime<Utc> {
    parse_catalog_time("2026-01-04T15:00:00Z").unwrap()
}

pub fn sample_backup() -> BackupRecord {
    BackupRecord {
        id: BACKUP_ID.to_string(),
        server: SERVER.to_string(),
        begin_time: backup_end_time() - Duration::hours(3),
        end_time: backup_end_time(),
        begin_wal: SegmentId::new(1, 0, 0x10),
        end_wal: SegmentId::new(1, 0, 0x15),
        timeline: 1,
        status: BackupStatus::Done,
    }
}

/// Catalog + WAL store fake with a scripted archive.
pub struct FakeCatalog {
    pub backups: Vec<BackupRecord>,
    /// Segment names present in the processed store
    pub present: HashSet<String>,
    pub last_archived: Option<DateTime<Utc>>,
    /// Files materialize() writes into the scratch directory
    pub materialized_files: Vec<String>,
    pub fail_materialize: bool,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            backups: vec![sample_backup()],
            present: HashSet::new(),
            last_archived: Some(backup_end_time() + Duration::hours(1)),
            materialized_files: vec!["PG_VERSION".to_string(), "backup_label".to_string()],
            fail_materialize: false,
        }
    }

    /// Mark every segment from the backup's end segment through `count`
    /// successors as archived.
    pub fn with_continuous_archive(mut self, count: u64) -> Self {
        let mut segment = sample_backup().end_wal;
        for _ in 0..=count {
            self.present.insert(segment.to_string());
            segment = segment.next();
        }
        self
    }
}

impl BackupCatalog for FakeCatalog {
    fn list_servers(&self) -> CatalogResult<Vec<String>> {
        Ok(vec![SERVER.to_string()])
    }

    fn list_backups(&self, server: &str) -> CatalogResult<Vec<BackupRecord>> {
        Ok(self
            .backups
            .iter()
            .filter(|b| b.server == server)
            .cloned()
            .collect())
    }

    fn show_backup(&self, server: &str, backup_id: &str) -> CatalogResult<BackupRecord> {
        self.backups
            .iter()
            .find(|b| b.server == server && b.id == backup_id)
            .cloned()
            .ok_or_else(|| CatalogError::BackupNotFound(backup_id.to_string()))
    }

    fn materialize(
        &self,
        _server: &str,
        _backup_id: &str,
        _target_time: Option<DateTime<Utc>>,
        scratch: &Path,
    ) -> CatalogResult<()> {
        if self.fail_materialize {
            return Err(CatalogError::MaterializationFailed(
                "recover command exited with status 1".to_string(),
            ));
        }
        fs::create_dir_all(scratch)
            .map_err(|e| CatalogError::MaterializationFailed(e.to_string()))?;
        for name in &self.materialized_files {
            fs::write(scratch.join(name), b"x")
                .map_err(|e| CatalogError::MaterializationFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl WalStore for FakeCatalog {
    fn exists_processed(&self, segment: &SegmentId) -> CatalogResult<bool> {
        Ok(self.present.contains(&segment.to_string()))
    }

    fn exists_staged(&self, _segment: &SegmentId) -> CatalogResult<bool> {
        Ok(false)
    }

    fn last_archived_at(&self) -> CatalogResult<Option<DateTime<Utc>>> {
        Ok(self.last_archived)
    }
}

/// Behavioral cluster fake: membership reflects which members are stopped,
/// and leadership follows start/promote calls.
pub struct FakeCluster {
    members: Vec<String>,
    leader: RefCell<Option<String>>,
    stopped: RefCell<HashSet<String>>,
    pub calls: RefCell<Vec<String>>,
    /// When false, stop_service never removes the node from membership
    /// (a node that refuses to go quiet)
    pub stop_takes_effect: bool,
    /// When true, starting a stopped node makes it the leader (the cluster
    /// manager converging on its own)
    pub leader_on_start: bool,
}

impl FakeCluster {
    pub fn new(members: &[&str], leader: &str) -> Self {
        Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            leader: RefCell::new(Some(leader.to_string())),
            stopped: RefCell::new(HashSet::new()),
            calls: RefCell::new(Vec::new()),
            stop_takes_effect: true,
            leader_on_start: false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ClusterManager for FakeCluster {
    fn membership(&self) -> ClusterResult<MembershipView> {
        let stopped = self.stopped.borrow();
        let leader = self.leader.borrow();
        let members = self
            .members
            .iter()
            .filter(|m| !stopped.contains(*m))
            .map(|m| MemberInfo {
                name: m.clone(),
                role: if leader.as_deref() == Some(m.as_str()) {
                    NodeRole::Leader
                } else {
                    NodeRole::Replica
                },
                state: "running".to_string(),
            })
            .collect();
        Ok(MembershipView { members })
    }

    fn stop_service(&self, node: &str) -> ClusterResult<()> {
        self.calls.borrow_mut().push(format!("stop {}", node));
        if self.stop_takes_effect {
            self.stopped.borrow_mut().insert(node.to_string());
            let mut leader = self.leader.borrow_mut();
            if leader.as_deref() == Some(node) {
                *leader = None;
            }
        }
        Ok(())
    }

    fn start_service(&self, node: &str) -> ClusterResult<()> {
        self.calls.borrow_mut().push(format!("start {}", node));
        self.stopped.borrow_mut().remove(node);
        if self.leader_on_start && self.leader.borrow().is_none() {
            *self.leader.borrow_mut() = Some(node.to_string());
        }
        Ok(())
    }

    fn promote(&self, node: &str) -> ClusterResult<()> {
        self.calls.borrow_mut().push(format!("promote {}", node));
        *self.leader.borrow_mut() = Some(node.to_string());
        Ok(())
    }

    fn reinit(&self, node: &str) -> ClusterResult<()> {
        self.calls.borrow_mut().push(format!("reinit {}", node));
        Ok(())
    }
}

/// Transfer fake that copies files locally instead of shelling out.
pub struct FakeTransfer {
    pub partial_status: Option<i32>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self {
            partial_status: None,
        }
    }
}

impl TransferChannel for FakeTransfer {
    fn push(&self, src: &Path, _node: &str, dest: &Path) -> TransferResult<TransferStatus> {
        fs::create_dir_all(dest).expect("create dest dir");
        for entry in fs::read_dir(src).expect("read scratch") {
            let entry = entry.expect("dir entry");
            fs::copy(entry.path(), dest.join(entry.file_name())).expect("copy file");
        }
        Ok(match self.partial_status {
            Some(status) => TransferStatus::Partial { status },
            None => TransferStatus::Complete,
        })
    }

    fn exists(&self, _node: &str, path: &Path) -> TransferResult<bool> {
        Ok(path.exists())
    }
}

/// Probe that reports recovery as already finished.
pub struct FakeProbe;

impl RecoveryProbe for FakeProbe {
    async fn in_recovery(&self) -> MonitorResult<bool> {
        Ok(false)
    }
}

/// Minimal config over temp directories, with all polling delays zeroed.
pub fn test_config(data_dir: &Path, scratch_dir: &Path) -> Config {
    let mut config: Config = serde_json::from_value(serde_json::json!({
        "node": "node2",
        "data_dir": data_dir.display().to_string(),
        "scratch_dir": scratch_dir.display().to_string(),
    }))
    .expect("test config deserializes");
    config.quiesce_poll_secs = 0;
    config.reconcile_poll_secs = 0;
    config.quiesce_attempts = 3;
    config.leader_attempts = 4;
    config
}
