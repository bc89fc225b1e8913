//! Recovery orchestration
//!
//! Per PIPELINE.md: the sequential stage driver, the per-run context value
//! threaded through every stage, and the top-level error taxonomy.

mod context;
mod errors;
mod pipeline;

pub use context::RecoveryContext;
pub use errors::{RecoveryError, RecoveryResult};
pub use pipeline::{Pipeline, RecoveryReport, RunRequest};
