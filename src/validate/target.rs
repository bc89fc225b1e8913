//! Recovery target specification
//!
//! Per RECOVERY.md §3:
//! - Timestamp mode stops replay at a wall-clock instant, compared at
//!   microsecond resolution
//! - Latest mode replays all available WAL and has no upper bound; no time
//!   comparison of any kind is performed for it

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::errors::{ValidationError, ValidationResult};

/// The point at which WAL replay should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTarget {
    /// Replay until the given wall-clock instant
    Timestamp(DateTime<Utc>),
    /// Replay all available WAL
    Latest,
}

/// Accepted CLI timestamp spellings. Fractional seconds are optional and
/// preserved to microsecond precision when present.
const TARGET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M",
];

impl RecoveryTarget {
    /// Parse the CLI target argument: `latest` or a timestamp string.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }

        for format in TARGET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
                return Ok(Self::Timestamp(dt.with_timezone(&Utc)));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::Timestamp(DateTime::from_naive_utc_and_offset(
                    naive, Utc,
                )));
            }
        }

        Err(ValidationError::InvalidTarget {
            raw: raw.to_string(),
            reason: "expected 'latest' or a timestamp like '2026-01-04 15:25:00'".to_string(),
        })
    }

    /// The target instant, when in Timestamp mode.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            Self::Latest => None,
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }
}

impl fmt::Display for RecoveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.6f%:z")),
            Self::Latest => write!(f, "latest"),
        }
    }
}
