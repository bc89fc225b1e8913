//! Recovery target validation subsystem
//!
//! Per RECOVERY.md §4.1, the validator is read-only and runs before any
//! other stage; nothing downstream executes until it passes.

mod errors;
mod target;
mod validator;

pub use errors::{ValidationError, ValidationResult};
pub use target::RecoveryTarget;
pub use validator::{TargetValidator, ValidatedRequest};
