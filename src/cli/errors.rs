//! CLI-specific error types
//!
//! Everything surfacing here ends the process with exit code 1.

use std::fmt;

use crate::config::ConfigError;
use crate::orchestrator::RecoveryError;

pub type CliResult<T> = Result<T, CliError>;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Malformed command-line argument
    InvalidArgument,
    /// The recovery run itself failed
    RecoveryFailed,
    /// A read-only check found a problem
    CheckFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "PITR_CLI_CONFIG_ERROR",
            Self::InvalidArgument => "PITR_CLI_INVALID_ARGUMENT",
            Self::RecoveryFailed => "PITR_CLI_RECOVERY_FAILED",
            Self::CheckFailed => "PITR_CLI_CHECK_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    pub fn check_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::CheckFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::ConfigError, e.to_string())
    }
}

impl From<RecoveryError> for CliError {
    fn from(e: RecoveryError) -> Self {
        Self::new(CliErrorCode::RecoveryFailed, e.to_string())
    }
}
