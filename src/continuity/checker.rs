//! WAL continuity analysis
//!
//! Per CONTINUITY.md:
//!
//! - The number of segments needed to reach the target is estimated as
//!   `ceil(time_delta / estimated_segment_duration)`, capped at a bounded
//!   scan window so a distant target cannot trigger unbounded work
//! - Each expected segment is searched in the processed store and in the
//!   staging area (archiving is asynchronous), across a bounded number of
//!   forward timelines from the backup's timeline, so rapid promotions that
//!   fork the WAL sequence do not produce false gaps
//! - The scan stops early after a short run of consecutive gaps; beyond
//!   that, further probing tells the operator nothing new
//! - A gap where the archive itself has fallen behind the target is
//!   classified as ArchivingStalled, distinct from a mid-stream gap: it
//!   means the source stopped producing WAL, not that a segment was lost

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::catalog::{BackupRecord, SegmentId, WalStore};
use crate::validate::RecoveryTarget;

use super::errors::ContinuityResult;

/// Bounds for the archive scan. All three are configurable; the defaults
/// match the archive's 16MB segments under a moderate write load.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanLimits {
    /// Assumed wall-clock seconds covered by one segment
    #[serde(default = "default_segment_duration_secs")]
    pub estimated_segment_duration_secs: u64,
    /// Hard cap on segments examined in one scan
    #[serde(default = "default_scan_window")]
    pub scan_window: u64,
    /// Forward timelines probed beyond the backup's own
    #[serde(default = "default_timeline_probes")]
    pub timeline_probes: u32,
    /// Consecutive missing segments before the scan stops early
    #[serde(default = "default_gap_run_limit")]
    pub gap_run_limit: u32,
}

fn default_segment_duration_secs() -> u64 {
    60
}
fn default_scan_window() -> u64 {
    256
}
fn default_timeline_probes() -> u32 {
    4
}
fn default_gap_run_limit() -> u32 {
    3
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            estimated_segment_duration_secs: default_segment_duration_secs(),
            scan_window: default_scan_window(),
            timeline_probes: default_timeline_probes(),
            gap_run_limit: default_gap_run_limit(),
        }
    }
}

/// Classification of WAL coverage between backup end and target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Every expected segment is present in at least one searched store
    /// on at least one searched timeline
    Complete,
    /// At least one expected segment is absent everywhere
    GapDetected { missing: Vec<SegmentId> },
    /// Segments are absent and the archive's newest segment is older than
    /// the target: the source stopped shipping WAL
    ArchivingStalled {
        last_archived: Option<DateTime<Utc>>,
        target: DateTime<Utc>,
    },
}

/// Full scan outcome, including what the scan actually covered.
#[derive(Debug, Clone)]
pub struct ContinuityOutcome {
    pub classification: Classification,
    /// Segments the scan examined
    pub checked: u64,
    /// True when the estimate exceeded the scan window; a real gap beyond
    /// the window is undetectable in that case
    pub truncated: bool,
    /// True when the consecutive-gap heuristic ended the scan early
    pub stopped_early: bool,
}

impl ContinuityOutcome {
    pub fn is_complete(&self) -> bool {
        self.classification == Classification::Complete
    }
}

/// Bounded, fork-tolerant archive scanner.
pub struct ContinuityChecker {
    limits: ScanLimits,
}

impl ContinuityChecker {
    pub fn new(limits: ScanLimits) -> Self {
        Self { limits }
    }

    /// Scan the archive for the segment range needed to replay `backup` up
    /// to `target`.
    pub fn check<W: WalStore>(
        &self,
        store: &W,
        backup: &BackupRecord,
        target: &RecoveryTarget,
    ) -> ContinuityResult<ContinuityOutcome> {
        let last_archived = store.last_archived_at()?;

        // Latest has no target instant; its horizon is whatever the archive
        // has seen. With nothing archived past the backup, only the backup's
        // own end segment is expected.
        let horizon = match target {
            RecoveryTarget::Timestamp(t) => *t,
            RecoveryTarget::Latest => last_archived.unwrap_or(backup.end_time),
        };

        let estimated = self.estimate_segments(backup.end_time, horizon);
        let truncated = estimated > self.limits.scan_window;
        let expected = estimated.min(self.limits.scan_window);

        let mut missing = Vec::new();
        let mut consecutive = 0u32;
        let mut stopped_early = false;
        let mut checked = 0u64;
        let mut segment = backup.end_wal;

        for _ in 0..expected {
            checked += 1;
            if self.segment_present(store, &segment, backup.timeline)? {
                consecutive = 0;
            } else {
                missing.push(segment);
                consecutive += 1;
                if consecutive >= self.limits.gap_run_limit {
                    stopped_early = true;
                    break;
                }
            }
            segment = segment.next();
        }

        let classification = if missing.is_empty() {
            Classification::Complete
        } else if self.archive_behind_target(target, last_archived) {
            Classification::ArchivingStalled {
                last_archived,
                target: horizon,
            }
        } else {
            Classification::GapDetected { missing }
        };

        Ok(ContinuityOutcome {
            classification,
            checked,
            truncated,
            stopped_early,
        })
    }

    /// `ceil(delta / segment_duration)`, never below 1: the backup's end
    /// segment itself is always required.
    fn estimate_segments(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        let delta_secs = (to - from).num_seconds().max(0) as u64;
        let duration = self.limits.estimated_segment_duration_secs.max(1);
        delta_secs.div_ceil(duration).max(1)
    }

    /// Probe the same (log, segment) position on the backup timeline and a
    /// bounded number of forward timelines, in both stores.
    fn segment_present<W: WalStore>(
        &self,
        store: &W,
        segment: &SegmentId,
        base_timeline: u32,
    ) -> ContinuityResult<bool> {
        for timeline in base_timeline..=base_timeline.saturating_add(self.limits.timeline_probes) {
            let candidate = segment.on_timeline(timeline);
            if store.exists_processed(&candidate)? || store.exists_staged(&candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Stall test: the newest archived segment is older than the target.
    /// Only meaningful for a Timestamp target; Latest's horizon is the
    /// archive itself.
    fn archive_behind_target(
        &self,
        target: &RecoveryTarget,
        last_archived: Option<DateTime<Utc>>,
    ) -> bool {
        match (target, last_archived) {
            (RecoveryTarget::Timestamp(t), Some(last)) => last < *t,
            (RecoveryTarget::Timestamp(_), None) => true,
            (RecoveryTarget::Latest, _) => false,
        }
    }
}
