//! Command-line interface
//!
//! Subcommands:
//! - recover: run one recovery against a node
//! - validate: backup/target validation only
//! - check-wal: validation plus the WAL continuity scan

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::run_command;
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and dispatch. The binary's whole logic lives behind this.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}
