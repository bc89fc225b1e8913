//! Recovery configuration writer
//!
//! Per NODE.md §Configure, the recovery configuration file written into the
//! staged data directory carries:
//! - the restore command for the selected WAL fetch method
//! - the recovery target (time for Timestamp mode; nothing for Latest)
//! - timeline-following = latest, so replay follows any timeline fork
//! - target action = promote
//!
//! The file is written atomically (temp file, fsync, rename): a crash never
//! leaves a half-written configuration at the final path.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::plan::{RecoveryPlan, WalFetchMethod};
use crate::validate::RecoveryTarget;

use super::errors::{NodeError, NodeResult};

/// Settings for the WAL restore command.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Direct-fetch helper binary (Direct method)
    pub fetch_helper: String,
    /// Host holding the archive, reachable over ssh (AtomicSsh method)
    pub archive_host: String,
    /// Archive directory on that host
    pub archive_dir: PathBuf,
    /// Catalog server name passed to the helper
    pub server: String,
}

/// Restore command line for the chosen fetch method.
///
/// `%f` is the segment name, `%p` the destination path, both substituted by
/// the recovering database process.
pub fn restore_command(method: WalFetchMethod, settings: &FetchSettings) -> String {
    match method {
        WalFetchMethod::Direct => {
            format!("{} {} %f %p", settings.fetch_helper, settings.server)
        }
        // Fetch to a temp path, then rename: a partially written segment is
        // never visible at its final path.
        WalFetchMethod::AtomicSsh => format!(
            "ssh {} cat {}/%f > %p.tmp && mv %p.tmp %p",
            settings.archive_host,
            settings.archive_dir.display()
        ),
    }
}

/// Render the recovery configuration for `plan`.
pub fn render_recovery_config(plan: &RecoveryPlan, settings: &FetchSettings) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "restore_command = '{}'\n",
        restore_command(plan.wal_fetch, settings)
    ));
    if let RecoveryTarget::Timestamp(t) = plan.target {
        out.push_str(&format!(
            "recovery_target_time = '{}'\n",
            t.format("%Y-%m-%d %H:%M:%S%.6f%:z")
        ));
    }
    out.push_str("recovery_target_timeline = 'latest'\n");
    out.push_str("recovery_target_action = 'promote'\n");
    out
}

/// Atomically write `contents` as `file_name` inside `data_dir`.
pub fn write_recovery_config(
    data_dir: &Path,
    file_name: &str,
    contents: &str,
) -> NodeResult<PathBuf> {
    let final_path = data_dir.join(file_name);
    let tmp_path = data_dir.join(format!("{}.tmp", file_name));

    let write = || -> std::io::Result<()> {
        let mut f = File::create(&tmp_path)?;
        f.write_all(contents.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp_path, &final_path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        NodeError::config_write(
            format!("failed to write {}", final_path.display()),
            e,
        )
    })?;

    Ok(final_path)
}
