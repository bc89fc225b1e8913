//! Recovery monitor subsystem
//!
//! Per MONITOR.md, this watches the directly-launched database process
//! through its recovery boot: a reader task streams output lines onto a
//! channel while the select loop polls the completion predicate under an
//! overall deadline. Both halves terminate together on the first terminal
//! classification.

mod errors;
#[allow(clippy::module_inception)]
mod monitor;
mod outcome;
mod probe;

pub use errors::{MonitorError, MonitorResult};
pub use monitor::{MonitorSettings, ProcessSpec, RecoveryMonitor};
pub use outcome::{LineEvent, MonitorOutcome, OutputClassifier};
pub use probe::{CommandProbe, RecoveryProbe};
