//! Backup metadata records
//!
//! Per CATALOG.md:
//! - BackupRecord is produced by the external backup service and is
//!   read-only input here
//! - A record with Done status is immutable
//! - Begin/end timestamps carry microsecond precision; all target
//!   comparisons happen at that resolution

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{CatalogError, CatalogResult};
use super::segment::SegmentId;

/// Status of a base backup in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackupStatus {
    Done,
    Failed,
    InProgress,
}

impl BackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStatus::Done => "DONE",
            BackupStatus::Failed => "FAILED",
            BackupStatus::InProgress => "IN_PROGRESS",
        }
    }
}

/// One base backup as described by the external catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Catalog-assigned backup id
    pub id: String,
    /// Server the backup was taken from
    pub server: String,
    /// Wall-clock time the base backup began
    pub begin_time: DateTime<Utc>,
    /// Wall-clock time the base backup finished
    pub end_time: DateTime<Utc>,
    /// First WAL segment required by the backup
    pub begin_wal: SegmentId,
    /// Last WAL segment written during the backup
    pub end_wal: SegmentId,
    /// Timeline the backup was taken on
    pub timeline: u32,
    /// Catalog status
    pub status: BackupStatus,
}

impl BackupRecord {
    /// Whether this backup can seed a recovery. Only Done backups qualify.
    pub fn is_usable(&self) -> bool {
        self.status == BackupStatus::Done
    }
}

/// Timestamp formats the external catalog emits. Microsecond fields are
/// preserved; a missing fractional part parses as .000000.
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a catalog timestamp string at microsecond resolution.
pub fn parse_catalog_time(raw: &str) -> CatalogResult<DateTime<Utc>> {
    let raw = raw.trim();
    for format in TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    Err(CatalogError::malformed(
        "timestamp",
        format!("unrecognized time '{}'", raw),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_time_with_microseconds() {
        let dt = parse_catalog_time("2026-01-04T15:25:21.747093Z").unwrap();
        assert_eq!(dt.nanosecond(), 747_093_000);
    }

    #[test]
    fn test_parse_time_without_fraction() {
        let dt = parse_catalog_time("2026-01-04 15:25:00").unwrap();
        assert_eq!(dt.nanosecond(), 0);
    }

    #[test]
    fn test_parse_time_with_offset() {
        let dt = parse_catalog_time("2026-01-04 15:25:21.747093+0100").unwrap();
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_catalog_time("not a time").is_err());
    }

    #[test]
    fn test_only_done_backups_usable() {
        let mut record = BackupRecord {
            id: "20260104T120000".to_string(),
            server: "db1".to_string(),
            begin_time: parse_catalog_time("2026-01-04T12:00:00.000000Z").unwrap(),
            end_time: parse_catalog_time("2026-01-04T12:05:00.000000Z").unwrap(),
            begin_wal: SegmentId::new(1, 0, 1),
            end_wal: SegmentId::new(1, 0, 4),
            timeline: 1,
            status: BackupStatus::Done,
        };
        assert!(record.is_usable());

        record.status = BackupStatus::InProgress;
        assert!(!record.is_usable());

        record.status = BackupStatus::Failed;
        assert!(!record.is_usable());
    }
}
