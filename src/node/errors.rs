//! Node controller error types
//!
//! Per ERRORS.md, node errors follow the structured error model:
//! - Error codes in PITR_NODE_NAME format
//! - Explicit severity
//! - Errors after Snapshot must carry enough context to print the manual
//!   restoration path; the pre-mutation snapshot is never deleted on failure
//!
//! Snapshot and stage failures are FATAL: the node is mid-mutation and an
//! operator has to decide how to proceed.

use std::fmt;
use std::io;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but no persistent state was touched
    Error,
    /// Node data may be mid-mutation; operator intervention required
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Node error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeErrorCode {
    /// A phase transition not allowed by the forward-only state machine
    PitrNodeForbiddenTransition,
    /// Quiesce could not stop or confirm removal of the node
    PitrNodeQuiesceFailed,
    /// Both rename and copy-then-delete snapshot paths failed
    PitrNodeSnapshotFailed,
    /// Transfer failed, or partial transfer without all marker files
    PitrNodeStageFailed,
    /// Recovery configuration could not be written
    PitrNodeConfigWrite,
}

impl NodeErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeErrorCode::PitrNodeForbiddenTransition => "PITR_NODE_FORBIDDEN_TRANSITION",
            NodeErrorCode::PitrNodeQuiesceFailed => "PITR_NODE_QUIESCE_FAILED",
            NodeErrorCode::PitrNodeSnapshotFailed => "PITR_NODE_SNAPSHOT_FAILED",
            NodeErrorCode::PitrNodeStageFailed => "PITR_NODE_STAGE_FAILED",
            NodeErrorCode::PitrNodeConfigWrite => "PITR_NODE_CONFIG_WRITE",
        }
    }

    /// Severity: pre-mutation failures are ERROR, mid-mutation are FATAL.
    pub fn severity(&self) -> Severity {
        match self {
            NodeErrorCode::PitrNodeForbiddenTransition => Severity::Error,
            NodeErrorCode::PitrNodeQuiesceFailed => Severity::Error,
            NodeErrorCode::PitrNodeSnapshotFailed => Severity::Fatal,
            NodeErrorCode::PitrNodeStageFailed => Severity::Fatal,
            NodeErrorCode::PitrNodeConfigWrite => Severity::Fatal,
        }
    }
}

impl fmt::Display for NodeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Node controller error with full context
#[derive(Debug)]
pub struct NodeError {
    code: NodeErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl NodeError {
    fn new(code: NodeErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    pub fn forbidden_transition(from: &str, to: &str) -> Self {
        Self::new(
            NodeErrorCode::PitrNodeForbiddenTransition,
            format!("transition {} -> {} is not allowed", from, to),
            None,
        )
    }

    pub fn quiesce_failed(message: impl Into<String>) -> Self {
        Self::new(NodeErrorCode::PitrNodeQuiesceFailed, message, None)
    }

    pub fn snapshot_failed(message: impl Into<String>) -> Self {
        Self::new(NodeErrorCode::PitrNodeSnapshotFailed, message, None)
    }

    pub fn snapshot_io(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(NodeErrorCode::PitrNodeSnapshotFailed, message, Some(source))
    }

    pub fn stage_failed(message: impl Into<String>) -> Self {
        Self::new(NodeErrorCode::PitrNodeStageFailed, message, None)
    }

    pub fn config_write(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(NodeErrorCode::PitrNodeConfigWrite, message, Some(source))
    }

    pub fn code(&self) -> NodeErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code,
            self.message
        )?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;
