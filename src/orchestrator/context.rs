//! Per-run recovery context
//!
//! Per PIPELINE.md, run state is an explicit value threaded through every
//! stage rather than ambient globals: the run id for log correlation, the
//! plan once built, the snapshot path once taken, and accumulated
//! diagnostics for the final report.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::node::NodePhase;
use crate::plan::RecoveryPlan;

/// Mutable state of one recovery run.
#[derive(Debug)]
pub struct RecoveryContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub plan: Option<RecoveryPlan>,
    pub phase: NodePhase,
    pub snapshot_path: Option<PathBuf>,
    /// Operator-facing notes accumulated along the way (truncated scans,
    /// overridden gates, partial transfers)
    pub diagnostics: Vec<String>,
}

impl RecoveryContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            plan: None,
            phase: NodePhase::Running,
            snapshot_path: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn note(&mut self, diagnostic: impl Into<String>) {
        self.diagnostics.push(diagnostic.into());
    }

    pub fn set_plan(&mut self, plan: RecoveryPlan) {
        self.plan = Some(plan);
    }

    pub fn set_snapshot(&mut self, path: &Path) {
        self.snapshot_path = Some(path.to_path_buf());
    }

    /// True once persistent state has been mutated: from here on, a failure
    /// needs the manual restoration path in the output.
    pub fn mutation_started(&self) -> bool {
        self.snapshot_path.is_some()
    }

    /// Manual restoration guidance after a post-snapshot failure.
    pub fn restore_guidance(&self) -> Option<String> {
        self.snapshot_path.as_ref().map(|snapshot| {
            format!(
                "original data preserved at {}; move it back into place before retrying",
                snapshot.display()
            )
        })
    }
}

impl Default for RecoveryContext {
    fn default() -> Self {
        Self::new()
    }
}
