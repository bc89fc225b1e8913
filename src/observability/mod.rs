//! Observability subsystem
//!
//! Per OBSERVABILITY.md, this module provides structured JSON logging and
//! typed lifecycle events for recovery runs.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on the pipeline
//! 3. Deterministic output (stable key ordering)
//! 4. Every line carries the run id

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
