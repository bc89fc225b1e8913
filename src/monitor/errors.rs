//! Recovery monitor error types

use std::io;

use thiserror::Error;

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors observing the recovery boot.
///
/// Terminal classifications (timeout, target unreachable, process exit) are
/// not errors; they are `MonitorOutcome` values. Only failures of the
/// monitoring machinery itself surface here.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Failed to launch database process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to poll database process: {0}")]
    Wait(#[from] io::Error),

    #[error("Recovery-mode probe failed: {0}")]
    Probe(String),
}
