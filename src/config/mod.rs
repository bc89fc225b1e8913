//! Configuration file handling
//!
//! Per CONFIG.md, configuration is a single JSON file. Required fields are
//! the cluster shape and local paths; everything else carries a default so
//! a minimal file stays minimal. Validation runs once at load.

mod errors;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::continuity::ScanLimits;
use crate::monitor::{MonitorSettings, ProcessSpec};
use crate::node::{FetchSettings, QuiescePolicy};
use crate::reconcile::ReconcilePolicy;

pub use errors::{ConfigError, ConfigResult};

/// Configuration file structure per CONFIG.md
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Node this invocation recovers (overridable with --target-node)
    pub node: String,

    /// Database data directory on the target node (required). pitrctl
    /// must run on that node: snapshot and configure act on this path
    /// through the local filesystem.
    pub data_dir: String,

    /// Scratch directory for materializing the base backup (required)
    pub scratch_dir: String,

    /// Backup catalog command (default "barman")
    #[serde(default = "default_catalog_tool")]
    pub catalog_tool: String,

    /// Catalog server name; discovered from the catalog when omitted
    #[serde(default)]
    pub catalog_server: Option<String>,

    /// Cluster manager command (default "patronictl")
    #[serde(default = "default_cluster_tool")]
    pub cluster_tool: String,

    /// Transfer programs
    #[serde(default = "default_rsync_program")]
    pub rsync_program: String,
    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,

    /// Files that must exist in the data dir after staging for the
    /// transfer to count as complete
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,

    /// WAL fetch for the direct method: helper program given to the
    /// database's restore command
    #[serde(default = "default_fetch_helper")]
    pub fetch_helper: String,

    /// WAL fetch for the atomic-ssh method: archive host and directory
    #[serde(default = "default_archive_host")]
    pub archive_host: String,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Archive scan bounds
    #[serde(default)]
    pub scan: ScanLimits,

    /// Quiesce bounds
    #[serde(default = "default_quiesce_attempts")]
    pub quiesce_attempts: u32,
    #[serde(default = "default_quiesce_poll_secs")]
    pub quiesce_poll_secs: u64,

    /// Commands for the directly-launched recovery boot. Required when
    /// invoked with --restore; unused otherwise.
    #[serde(default)]
    pub db_start_command: Vec<String>,
    #[serde(default)]
    pub db_stop_command: Vec<String>,
    /// Command whose stdout reports whether the instance is still in
    /// recovery mode (t/f)
    #[serde(default)]
    pub db_probe_command: Vec<String>,

    /// Monitor timing
    #[serde(default = "default_monitor_poll_secs")]
    pub monitor_poll_secs: u64,
    #[serde(default = "default_monitor_timeout_secs")]
    pub monitor_timeout_secs: u64,
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,

    /// Reconciler leadership verification bounds
    #[serde(default = "default_leader_attempts")]
    pub leader_attempts: u32,
    #[serde(default = "default_reconcile_poll_secs")]
    pub reconcile_poll_secs: u64,
}

fn default_catalog_tool() -> String {
    "barman".to_string()
}
fn default_cluster_tool() -> String {
    "patronictl".to_string()
}
fn default_rsync_program() -> String {
    "rsync".to_string()
}
fn default_ssh_program() -> String {
    "ssh".to_string()
}
fn default_markers() -> Vec<String> {
    vec!["PG_VERSION".to_string(), "backup_label".to_string()]
}
fn default_fetch_helper() -> String {
    "wal-fetch".to_string()
}
fn default_archive_host() -> String {
    "backup".to_string()
}
fn default_archive_dir() -> String {
    "/var/lib/walarchive".to_string()
}
fn default_quiesce_attempts() -> u32 {
    5
}
fn default_quiesce_poll_secs() -> u64 {
    2
}
fn default_monitor_poll_secs() -> u64 {
    2
}
fn default_monitor_timeout_secs() -> u64 {
    600
}
fn default_stop_grace_secs() -> u64 {
    30
}
fn default_leader_attempts() -> u32 {
    10
}
fn default_reconcile_poll_secs() -> u64 {
    3
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration per CONFIG.md
    fn validate(&self) -> ConfigResult<()> {
        if self.node.is_empty() {
            return Err(ConfigError::Invalid("node must not be empty".to_string()));
        }
        if self.data_dir.is_empty() {
            return Err(ConfigError::Invalid(
                "data_dir must not be empty".to_string(),
            ));
        }
        if self.scratch_dir.is_empty() {
            return Err(ConfigError::Invalid(
                "scratch_dir must not be empty".to_string(),
            ));
        }
        if self.markers.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one marker file is required".to_string(),
            ));
        }
        if self.scan.scan_window == 0 {
            return Err(ConfigError::Invalid("scan_window must be > 0".to_string()));
        }
        if self.scan.estimated_segment_duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "estimated_segment_duration_secs must be > 0".to_string(),
            ));
        }
        if self.monitor_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate the fields only the --restore path needs.
    pub fn validate_restore(&self) -> ConfigResult<()> {
        for (name, command) in [
            ("db_start_command", &self.db_start_command),
            ("db_stop_command", &self.db_stop_command),
            ("db_probe_command", &self.db_probe_command),
        ] {
            if command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{} is required with --restore",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn scratch_path(&self) -> &Path {
        Path::new(&self.scratch_dir)
    }

    pub fn marker_paths(&self) -> Vec<PathBuf> {
        self.markers.iter().map(PathBuf::from).collect()
    }

    pub fn quiesce_policy(&self) -> QuiescePolicy {
        QuiescePolicy {
            attempts: self.quiesce_attempts,
            poll_delay: Duration::from_secs(self.quiesce_poll_secs),
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_secs(self.monitor_poll_secs),
            timeout: Duration::from_secs(self.monitor_timeout_secs),
            stop_grace: Duration::from_secs(self.stop_grace_secs),
        }
    }

    pub fn reconcile_policy(&self, auto_complete: bool) -> ReconcilePolicy {
        ReconcilePolicy {
            leader_attempts: self.leader_attempts,
            poll_delay: Duration::from_secs(self.reconcile_poll_secs),
            quiesce: self.quiesce_policy(),
            auto_complete,
        }
    }

    pub fn fetch_settings(&self, server: &str) -> FetchSettings {
        FetchSettings {
            fetch_helper: self.fetch_helper.clone(),
            archive_host: self.archive_host.clone(),
            archive_dir: PathBuf::from(&self.archive_dir),
            server: server.to_string(),
        }
    }

    pub fn start_spec(&self) -> Option<ProcessSpec> {
        Self::spec_from(&self.db_start_command)
    }

    pub fn stop_spec(&self) -> Option<ProcessSpec> {
        Self::spec_from(&self.db_stop_command)
    }

    pub fn probe_command(&self) -> Option<(String, Vec<String>)> {
        let (program, args) = self.db_probe_command.split_first()?;
        Some((program.clone(), args.to_vec()))
    }

    fn spec_from(command: &[String]) -> Option<ProcessSpec> {
        let (program, args) = command.split_first()?;
        Some(ProcessSpec::new(program.clone(), args.to_vec()))
    }
}
