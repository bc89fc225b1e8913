//! Pre-mutation data directory snapshot
//!
//! Per NODE.md §Snapshot:
//! - The current data store is renamed aside with a timestamp suffix
//! - If rename fails (e.g. cross-device), fall back to copy-then-delete
//! - If both fail, abort before any further mutation: the snapshot is the
//!   sole rollback anchor for the whole operation
//! - Idempotent under crash-and-retry: a retry that finds the snapshot in
//!   place and the data directory gone treats the step as already done

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::errors::{NodeError, NodeResult};

/// Snapshot path for `data_dir` at instant `taken_at`.
pub fn snapshot_path_for(data_dir: &Path, taken_at: DateTime<Utc>) -> PathBuf {
    let name = data_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    let suffix = taken_at.format("%Y%m%dT%H%M%SZ");
    data_dir.with_file_name(format!("{}.{}", name, suffix))
}

/// Move the data directory aside to `snapshot`.
///
/// Returns the snapshot path. The original directory no longer exists at its
/// old location afterwards; it is never deleted, only renamed or copied.
pub fn take_snapshot(data_dir: &Path, snapshot: &Path) -> NodeResult<PathBuf> {
    // Crash-retry: a previous attempt already moved the data aside.
    if snapshot.exists() && !data_dir.exists() {
        return Ok(snapshot.to_path_buf());
    }

    if !data_dir.exists() {
        return Err(NodeError::snapshot_failed(format!(
            "data directory {} does not exist and no snapshot found at {}",
            data_dir.display(),
            snapshot.display()
        )));
    }

    if snapshot.exists() {
        return Err(NodeError::snapshot_failed(format!(
            "snapshot destination {} already exists alongside the data directory",
            snapshot.display()
        )));
    }

    match fs::rename(data_dir, snapshot) {
        Ok(()) => Ok(snapshot.to_path_buf()),
        Err(rename_err) => copy_then_delete(data_dir, snapshot, rename_err),
    }
}

/// Cross-device fallback: copy the tree, fsync it, then delete the source.
/// The source is removed only after the copy fully succeeded.
fn copy_then_delete(
    data_dir: &Path,
    snapshot: &Path,
    rename_err: std::io::Error,
) -> NodeResult<PathBuf> {
    if let Err(copy_err) = copy_dir_recursive(data_dir, snapshot) {
        // Remove the partial copy so a retry starts clean.
        let _ = fs::remove_dir_all(snapshot);
        return Err(NodeError::snapshot_failed(format!(
            "rename failed ({}) and copy fallback failed ({}); aborting before mutation",
            rename_err, copy_err
        )));
    }

    fs::remove_dir_all(data_dir).map_err(|e| {
        NodeError::snapshot_io(
            format!(
                "copied {} to {} but could not remove the source",
                data_dir.display(),
                snapshot.display()
            ),
            e,
        )
    })?;

    Ok(snapshot.to_path_buf())
}

fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    OpenOptions::new().read(true).open(dir)?.sync_all()
}

fn copy_file_with_fsync(src: &Path, dst: &Path) -> std::io::Result<()> {
    let mut contents = Vec::new();
    File::open(src)?.read_to_end(&mut contents)?;

    let mut out = File::create(dst)?;
    out.write_all(&contents)?;
    out.sync_all()
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            copy_file_with_fsync(&src_path, &dst_path)?;
        }
    }
    fsync_dir(dst)
}
