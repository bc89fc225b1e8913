//! Runner error types

use std::io;

use thiserror::Error;

/// Result type for command invocation
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors spawning or waiting on an external command
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
