//! CLI argument definitions using clap
//!
//! Commands:
//! - pitrctl recover <backup-id> <target> [flags]
//! - pitrctl validate <backup-id> <target>
//! - pitrctl check-wal <backup-id> <target>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pitrctl - point-in-time recovery orchestrator for replicated clusters
#[derive(Parser, Debug)]
#[command(name = "pitrctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recover a node to a point in time from an archived backup.
    ///
    /// Must run on the node being recovered: the snapshot and the recovery
    /// configuration are applied to the data directory through the local
    /// filesystem, while staging addresses the node over ssh.
    ///
    /// No cross-invocation lock is taken: run at most one recovery
    /// against a node at a time.
    Recover {
        /// Backup id in the catalog
        backup_id: String,

        /// Recovery target: a timestamp, or "latest"
        target: String,

        /// Catalog server holding the backup (discovered when omitted)
        #[arg(long)]
        server: Option<String>,

        /// Node to recover (defaults to the configured node)
        #[arg(long)]
        target_node: Option<String>,

        /// Launch the database and monitor recovery to completion
        #[arg(long)]
        restore: bool,

        /// WAL fetch method: direct or atomic-ssh
        #[arg(long, default_value = "direct")]
        wal_method: String,

        /// After promotion, start and reseed sibling nodes automatically
        #[arg(long)]
        auto_start: bool,

        /// Confirmation gates: interactive, auto-approve or auto-abort
        #[arg(long, default_value = "interactive")]
        confirm: String,

        /// Path to configuration file
        #[arg(long, default_value = "./pitrctl.json")]
        config: PathBuf,
    },

    /// Validate a backup/target pair without touching anything
    Validate {
        backup_id: String,
        target: String,

        #[arg(long)]
        server: Option<String>,

        #[arg(long, default_value = "./pitrctl.json")]
        config: PathBuf,
    },

    /// Check WAL continuity between a backup and a target (read-only)
    CheckWal {
        backup_id: String,
        target: String,

        #[arg(long)]
        server: Option<String>,

        #[arg(long, default_value = "./pitrctl.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
