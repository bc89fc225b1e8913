//! WAL continuity analysis subsystem
//!
//! Per CONTINUITY.md, the checker decides whether the WAL segment range
//! needed to replay from the chosen backup to the target is actually in the
//! archive, tolerating timeline forks and asynchronous archiving. Gap and
//! stall findings pause the pipeline for a confirmation decision; they never
//! silently continue.

mod checker;
mod errors;

pub use checker::{Classification, ContinuityChecker, ContinuityOutcome, ScanLimits};
pub use errors::{ContinuityError, ContinuityResult};
