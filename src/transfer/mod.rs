//! Remote transfer channel
//!
//! Per NODE.md §Stage, the recovered base data set is pushed onto the target
//! node through this seam. The rsync-backed channel reports a
//! partial-transfer exit distinctly instead of failing outright: the Stage
//! operation tolerates it only when every marker file verifies afterwards.

mod errors;

pub use errors::{TransferError, TransferResult};

use std::path::Path;

use crate::runner::CommandRunner;

/// Outcome of one directory-tree push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Every file transferred
    Complete,
    /// The transfer mechanism reported a partial result (vanished or
    /// unreadable source files); acceptability is decided by marker checks
    Partial { status: i32 },
}

/// Pushes a directory tree to a node and probes remote paths.
pub trait TransferChannel {
    fn push(&self, src: &Path, node: &str, dest: &Path) -> TransferResult<TransferStatus>;
    fn exists(&self, node: &str, path: &Path) -> TransferResult<bool>;
}

/// rsync exit codes for partial transfers: 23 = partial due to error,
/// 24 = source files vanished mid-transfer.
const PARTIAL_CODES: &[i32] = &[23, 24];

/// rsync-over-ssh channel.
pub struct RsyncChannel<R: CommandRunner> {
    runner: R,
    rsync: String,
    ssh: String,
}

impl<R: CommandRunner> RsyncChannel<R> {
    pub fn new(runner: R, rsync: impl Into<String>, ssh: impl Into<String>) -> Self {
        Self {
            runner,
            rsync: rsync.into(),
            ssh: ssh.into(),
        }
    }
}

impl<R: CommandRunner> TransferChannel for RsyncChannel<R> {
    fn push(&self, src: &Path, node: &str, dest: &Path) -> TransferResult<TransferStatus> {
        // Trailing slash on the source: copy contents, not the directory.
        let args = vec![
            "-a".to_string(),
            "--delete".to_string(),
            format!("{}/", src.display()),
            format!("{}:{}/", node, dest.display()),
        ];

        let out = self
            .runner
            .run(&self.rsync, &args)
            .map_err(|e| TransferError::Spawn(e.to_string()))?;

        if out.success() {
            Ok(TransferStatus::Complete)
        } else if PARTIAL_CODES.contains(&out.status) {
            Ok(TransferStatus::Partial { status: out.status })
        } else {
            Err(TransferError::Failed {
                node: node.to_string(),
                status: out.status,
                stderr: out.stderr.trim().to_string(),
            })
        }
    }

    fn exists(&self, node: &str, path: &Path) -> TransferResult<bool> {
        let args = vec![
            node.to_string(),
            "test".to_string(),
            "-e".to_string(),
            path.display().to_string(),
        ];

        let out = self
            .runner
            .run(&self.ssh, &args)
            .map_err(|e| TransferError::Spawn(e.to_string()))?;

        match out.status {
            0 => Ok(true),
            1 => Ok(false),
            other => Err(TransferError::ProbeFailed {
                node: node.to_string(),
                detail: format!("ssh exited with status {}: {}", other, out.stderr.trim()),
            }),
        }
    }
}
