//! Node controller subsystem
//!
//! Per NODE.md, this is the only subsystem that mutates persistent state:
//! quiesce -> snapshot -> stage -> configure, driven by a strictly forward
//! phase machine. The pre-mutation snapshot taken here is the sole rollback
//! anchor for the whole recovery operation.

mod configure;
mod controller;
mod errors;
mod snapshot;
mod state;

pub use configure::{render_recovery_config, restore_command, write_recovery_config, FetchSettings};
pub use controller::{quiesce_node, NodeController, QuiesceOutcome, QuiescePolicy, StageReport};
pub use errors::{NodeError, NodeErrorCode, NodeResult, Severity};
pub use snapshot::{snapshot_path_for, take_snapshot};
pub use state::NodePhase;
