//! Backup catalog client
//!
//! Per CATALOG.md, the orchestrator consumes the external backup/archive
//! service only through these two traits:
//!
//! - `BackupCatalog`: backup metadata queries and base-backup
//!   materialization into a scratch location
//! - `WalStore`: WAL segment presence in the processed store and the staging
//!   area, plus the last-known-archived time
//!
//! `CommandCatalog` is the single place that parses the catalog tool's text
//! output; everything downstream sees typed records.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::runner::CommandRunner;

use super::errors::{CatalogError, CatalogResult};
use super::record::{parse_catalog_time, BackupRecord, BackupStatus};
use super::segment::SegmentId;

/// Backup metadata queries against the external catalog service.
pub trait BackupCatalog {
    /// Servers the catalog knows about, used for `--server` auto-discovery.
    fn list_servers(&self) -> CatalogResult<Vec<String>>;

    /// All backups recorded for one server, newest first.
    fn list_backups(&self, server: &str) -> CatalogResult<Vec<BackupRecord>>;

    /// Detail for one backup id.
    fn show_backup(&self, server: &str, backup_id: &str) -> CatalogResult<BackupRecord>;

    /// Materialize the base backup into `scratch`, replayed by the catalog
    /// tool up to `target_time` when given.
    fn materialize(
        &self,
        server: &str,
        backup_id: &str,
        target_time: Option<DateTime<Utc>>,
        scratch: &Path,
    ) -> CatalogResult<()>;
}

/// WAL segment presence queries.
///
/// Archiving is asynchronous: a segment may legitimately exist only in the
/// staging area before the archiver moves it into the processed store.
pub trait WalStore {
    fn exists_processed(&self, segment: &SegmentId) -> CatalogResult<bool>;
    fn exists_staged(&self, segment: &SegmentId) -> CatalogResult<bool>;

    /// Wall-clock time of the most recently archived segment, if any.
    fn last_archived_at(&self) -> CatalogResult<Option<DateTime<Utc>>>;
}

/// Wire shape of one backup in the catalog tool's `--format json` output.
#[derive(Debug, Deserialize)]
struct RawBackup {
    backup_id: String,
    #[serde(default)]
    server: Option<String>,
    begin_time: String,
    end_time: String,
    begin_wal: String,
    end_wal: String,
    timeline: u32,
    status: String,
}

impl RawBackup {
    fn into_record(self, default_server: &str) -> CatalogResult<BackupRecord> {
        let status = match self.status.as_str() {
            "DONE" => BackupStatus::Done,
            "FAILED" => BackupStatus::Failed,
            "STARTED" | "IN_PROGRESS" => BackupStatus::InProgress,
            other => {
                return Err(CatalogError::malformed(
                    "backup status",
                    format!("unknown status '{}'", other),
                ))
            }
        };

        Ok(BackupRecord {
            id: self.backup_id,
            server: self.server.unwrap_or_else(|| default_server.to_string()),
            begin_time: parse_catalog_time(&self.begin_time)?,
            end_time: parse_catalog_time(&self.end_time)?,
            begin_wal: SegmentId::parse(&self.begin_wal)?,
            end_wal: SegmentId::parse(&self.end_wal)?,
            timeline: self.timeline,
            status,
        })
    }
}

/// Wire shape of the archive status query.
#[derive(Debug, Deserialize)]
struct RawArchiveStatus {
    #[serde(default)]
    last_archived_time: Option<String>,
}

/// Catalog adapter backed by the external catalog command-line tool.
pub struct CommandCatalog<R: CommandRunner> {
    runner: R,
    tool: String,
    server: String,
    // WAL listings are cached per invocation; one plan never needs a fresher
    // view than the listing taken at scan start.
    processed_cache: RefCell<Option<HashSet<String>>>,
    staged_cache: RefCell<Option<HashSet<String>>>,
}

impl<R: CommandRunner> CommandCatalog<R> {
    pub fn new(runner: R, tool: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            runner,
            tool: tool.into(),
            server: server.into(),
            processed_cache: RefCell::new(None),
            staged_cache: RefCell::new(None),
        }
    }

    fn invoke(&self, args: &[String]) -> CatalogResult<String> {
        let out = self
            .runner
            .run(&self.tool, args)
            .map_err(|e| CatalogError::Spawn(e.to_string()))?;

        if !out.success() {
            return Err(CatalogError::CommandFailed {
                command: format!("{} {}", self.tool, args.join(" ")),
                status: out.status,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out.stdout)
    }

    fn wal_listing(&self, store: &str) -> CatalogResult<HashSet<String>> {
        let stdout = self.invoke(&[
            "list-wal".to_string(),
            self.server.clone(),
            "--store".to_string(),
            store.to_string(),
        ])?;
        Ok(stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    fn cached_listing(
        &self,
        cache: &RefCell<Option<HashSet<String>>>,
        store: &str,
        segment: &SegmentId,
    ) -> CatalogResult<bool> {
        if cache.borrow().is_none() {
            *cache.borrow_mut() = Some(self.wal_listing(store)?);
        }
        Ok(cache
            .borrow()
            .as_ref()
            .map(|set| set.contains(&segment.to_string()))
            .unwrap_or(false))
    }
}

impl<R: CommandRunner> BackupCatalog for CommandCatalog<R> {
    fn list_servers(&self) -> CatalogResult<Vec<String>> {
        let stdout = self.invoke(&["list-servers".to_string(), "--format".to_string(), "json".to_string()])?;
        let servers: Vec<String> = serde_json::from_str(&stdout)
            .map_err(|e| CatalogError::malformed("list-servers", e.to_string()))?;
        Ok(servers)
    }

    fn list_backups(&self, server: &str) -> CatalogResult<Vec<BackupRecord>> {
        let stdout = self.invoke(&[
            "list-backup".to_string(),
            server.to_string(),
            "--format".to_string(),
            "json".to_string(),
        ])?;
        let raw: Vec<RawBackup> = serde_json::from_str(&stdout)
            .map_err(|e| CatalogError::malformed("list-backup", e.to_string()))?;
        raw.into_iter().map(|b| b.into_record(server)).collect()
    }

    fn show_backup(&self, server: &str, backup_id: &str) -> CatalogResult<BackupRecord> {
        let stdout = self.invoke(&[
            "show-backup".to_string(),
            server.to_string(),
            backup_id.to_string(),
            "--format".to_string(),
            "json".to_string(),
        ])?;
        let raw: RawBackup = serde_json::from_str(&stdout)
            .map_err(|e| CatalogError::malformed("show-backup", e.to_string()))?;
        raw.into_record(server)
    }

    fn materialize(
        &self,
        server: &str,
        backup_id: &str,
        target_time: Option<DateTime<Utc>>,
        scratch: &Path,
    ) -> CatalogResult<()> {
        let mut args = vec![
            "recover".to_string(),
            server.to_string(),
            backup_id.to_string(),
            scratch.display().to_string(),
        ];
        if let Some(t) = target_time {
            args.push("--target-time".to_string());
            args.push(t.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string());
        }

        self.invoke(&args)
            .map_err(|e| CatalogError::MaterializationFailed(e.to_string()))?;
        Ok(())
    }
}

impl<R: CommandRunner> WalStore for CommandCatalog<R> {
    fn exists_processed(&self, segment: &SegmentId) -> CatalogResult<bool> {
        self.cached_listing(&self.processed_cache, "processed", segment)
    }

    fn exists_staged(&self, segment: &SegmentId) -> CatalogResult<bool> {
        self.cached_listing(&self.staged_cache, "staging", segment)
    }

    fn last_archived_at(&self) -> CatalogResult<Option<DateTime<Utc>>> {
        let stdout = self.invoke(&[
            "show-archive".to_string(),
            self.server.clone(),
            "--format".to_string(),
            "json".to_string(),
        ])?;
        let raw: RawArchiveStatus = serde_json::from_str(&stdout)
            .map_err(|e| CatalogError::malformed("show-archive", e.to_string()))?;

        match raw.last_archived_time {
            Some(ref t) => Ok(Some(parse_catalog_time(t)?)),
            None => Ok(None),
        }
    }
}
