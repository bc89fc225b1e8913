//! External command invocation seam
//!
//! Every adapter that shells out to a collaborator tool (backup catalog,
//! cluster manager, transfer channel) goes through `CommandRunner`, so the
//! text-parsing adapters stay testable with a scripted fake and the rest of
//! the orchestrator never touches `std::process` directly.

mod errors;

pub use errors::{RunnerError, RunnerResult};

use std::process::Command;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit status (or -1 when terminated by signal)
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs an external command to completion and captures its output.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> RunnerResult<CommandOutput>;
}

/// Production runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> RunnerResult<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| RunnerError::spawn(program, e))?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
