//! Recovery plan construction
//!
//! Per RECOVERY.md §4.3, a `RecoveryPlan` exists only after validation and
//! continuity analysis pass (or the continuity finding was explicitly
//! overridden through the confirmation policy). The plan is created per
//! invocation and discarded after execution.

mod errors;

pub use errors::{PlanError, PlanResult};

use std::fmt;

use crate::catalog::BackupRecord;
use crate::continuity::ContinuityOutcome;
use crate::validate::{RecoveryTarget, ValidatedRequest};

/// How the recovering node fetches WAL segments during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalFetchMethod {
    /// Direct invocation of the archive fetch helper
    Direct,
    /// Fetch to a temp file over ssh, then rename: a partially written
    /// segment is never visible at its final path
    AtomicSsh,
}

impl WalFetchMethod {
    pub fn parse(raw: &str) -> PlanResult<Self> {
        match raw {
            "direct" => Ok(Self::Direct),
            "atomic-ssh" => Ok(Self::AtomicSsh),
            other => Err(PlanError::UnknownWalFetchMethod(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::AtomicSsh => "atomic-ssh",
        }
    }
}

impl fmt::Display for WalFetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executable recovery plan for one destination node.
#[derive(Debug, Clone)]
pub struct RecoveryPlan {
    pub backup: BackupRecord,
    pub target: RecoveryTarget,
    pub wal_fetch: WalFetchMethod,
    /// Destination node id
    pub node: String,
    /// True when a gap or stall finding was overridden by the operator
    pub continuity_overridden: bool,
}

impl RecoveryPlan {
    /// Build a plan from the validated pair and the continuity outcome.
    ///
    /// `override_granted` reflects the confirmation-policy decision for a
    /// gap or stall finding; without it, an incomplete scan refuses to
    /// produce a plan.
    pub fn build(
        validated: ValidatedRequest,
        continuity: &ContinuityOutcome,
        override_granted: bool,
        wal_fetch: WalFetchMethod,
        node: impl Into<String>,
    ) -> PlanResult<Self> {
        if !continuity.is_complete() && !override_granted {
            return Err(PlanError::ContinuityNotSatisfied);
        }

        Ok(Self {
            backup: validated.backup,
            target: validated.target,
            wal_fetch,
            node: node.into(),
            continuity_overridden: !continuity.is_complete(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{parse_catalog_time, BackupStatus, SegmentId};
    use crate::continuity::{Classification, ContinuityOutcome};

    fn validated() -> ValidatedRequest {
        ValidatedRequest {
            backup: BackupRecord {
                id: "20260104T120000".to_string(),
                server: "db1".to_string(),
                begin_time: parse_catalog_time("2026-01-04T12:00:00Z").unwrap(),
                end_time: parse_catalog_time("2026-01-04T15:00:00Z").unwrap(),
                begin_wal: SegmentId::new(1, 0, 0x10),
                end_wal: SegmentId::new(1, 0, 0x15),
                timeline: 1,
                status: BackupStatus::Done,
            },
            target: RecoveryTarget::Latest,
        }
    }

    fn outcome(classification: Classification) -> ContinuityOutcome {
        ContinuityOutcome {
            classification,
            checked: 5,
            truncated: false,
            stopped_early: false,
        }
    }

    #[test]
    fn test_complete_continuity_builds_plan() {
        let plan = RecoveryPlan::build(
            validated(),
            &outcome(Classification::Complete),
            false,
            WalFetchMethod::Direct,
            "node2",
        )
        .unwrap();
        assert_eq!(plan.node, "node2");
        assert!(!plan.continuity_overridden);
    }

    #[test]
    fn test_gap_without_override_refused() {
        let gap = outcome(Classification::GapDetected {
            missing: vec![SegmentId::new(1, 0, 0x17)],
        });
        let err = RecoveryPlan::build(validated(), &gap, false, WalFetchMethod::Direct, "node2")
            .unwrap_err();
        assert!(matches!(err, PlanError::ContinuityNotSatisfied));
    }

    #[test]
    fn test_gap_with_override_builds_marked_plan() {
        let gap = outcome(Classification::GapDetected {
            missing: vec![SegmentId::new(1, 0, 0x17)],
        });
        let plan =
            RecoveryPlan::build(validated(), &gap, true, WalFetchMethod::AtomicSsh, "node2")
                .unwrap();
        assert!(plan.continuity_overridden);
        assert_eq!(plan.wal_fetch, WalFetchMethod::AtomicSsh);
    }

    #[test]
    fn test_wal_fetch_method_parse() {
        assert_eq!(WalFetchMethod::parse("direct").unwrap(), WalFetchMethod::Direct);
        assert_eq!(
            WalFetchMethod::parse("atomic-ssh").unwrap(),
            WalFetchMethod::AtomicSsh
        );
        assert!(WalFetchMethod::parse("scp").is_err());
    }
}
