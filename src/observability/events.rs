//! Observable pipeline events
//!
//! Per OBSERVABILITY.md, every stage of a recovery run emits an explicit,
//! typed event at entry and exit. Event names are stable strings so log
//! consumers can grep for them across versions.

use std::fmt;

/// Observable events over the life of one recovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Run lifecycle
    RecoveryStart,
    RecoveryComplete,
    RecoveryAborted,

    // Validation
    ValidateStart,
    ValidateComplete,
    ServerDiscovered,

    // WAL continuity
    ContinuityStart,
    ContinuityComplete,
    ContinuityGap,
    ContinuityStalled,
    ContinuityOverridden,

    // Planning and confirmation
    PlanBuilt,
    ConfirmationRequested,
    ConfirmationDenied,

    // Node mutation sequence
    QuiesceStart,
    QuiesceConfirmed,
    QuiesceUnconfirmed,
    SnapshotStart,
    SnapshotComplete,
    MaterializeStart,
    MaterializeComplete,
    StageStart,
    StageComplete,
    StagePartial,
    ConfigWritten,

    // Recovery monitoring
    MonitorStart,
    MonitorComplete,
    MonitorTimeout,
    MonitorTargetUnreachable,
    MonitorProcessExited,

    // Reconciliation
    ReconcileStart,
    ReconcileComplete,
    PromotionForced,
    SiblingReseeded,
}

impl Event {
    /// Returns the stable string name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RecoveryStart => "RECOVERY_START",
            Event::RecoveryComplete => "RECOVERY_COMPLETE",
            Event::RecoveryAborted => "RECOVERY_ABORTED",

            Event::ValidateStart => "VALIDATE_START",
            Event::ValidateComplete => "VALIDATE_COMPLETE",
            Event::ServerDiscovered => "SERVER_DISCOVERED",

            Event::ContinuityStart => "CONTINUITY_START",
            Event::ContinuityComplete => "CONTINUITY_COMPLETE",
            Event::ContinuityGap => "CONTINUITY_GAP",
            Event::ContinuityStalled => "CONTINUITY_STALLED",
            Event::ContinuityOverridden => "CONTINUITY_OVERRIDDEN",

            Event::PlanBuilt => "PLAN_BUILT",
            Event::ConfirmationRequested => "CONFIRMATION_REQUESTED",
            Event::ConfirmationDenied => "CONFIRMATION_DENIED",

            Event::QuiesceStart => "QUIESCE_START",
            Event::QuiesceConfirmed => "QUIESCE_CONFIRMED",
            Event::QuiesceUnconfirmed => "QUIESCE_UNCONFIRMED",
            Event::SnapshotStart => "SNAPSHOT_START",
            Event::SnapshotComplete => "SNAPSHOT_COMPLETE",
            Event::MaterializeStart => "MATERIALIZE_START",
            Event::MaterializeComplete => "MATERIALIZE_COMPLETE",
            Event::StageStart => "STAGE_START",
            Event::StageComplete => "STAGE_COMPLETE",
            Event::StagePartial => "STAGE_PARTIAL",
            Event::ConfigWritten => "CONFIG_WRITTEN",

            Event::MonitorStart => "MONITOR_START",
            Event::MonitorComplete => "MONITOR_COMPLETE",
            Event::MonitorTimeout => "MONITOR_TIMEOUT",
            Event::MonitorTargetUnreachable => "MONITOR_TARGET_UNREACHABLE",
            Event::MonitorProcessExited => "MONITOR_PROCESS_EXITED",

            Event::ReconcileStart => "RECONCILE_START",
            Event::ReconcileComplete => "RECONCILE_COMPLETE",
            Event::PromotionForced => "PROMOTION_FORCED",
            Event::SiblingReseeded => "SIBLING_RESEEDED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
