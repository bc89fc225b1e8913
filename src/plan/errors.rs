//! Plan builder error types

use thiserror::Error;

/// Result type for plan construction
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors constructing an executable recovery plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("WAL continuity is not satisfied and no override was granted")]
    ContinuityNotSatisfied,

    #[error("Unknown WAL fetch method '{0}' (expected 'direct' or 'atomic-ssh')")]
    UnknownWalFetchMethod(String),
}
