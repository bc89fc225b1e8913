//! WAL segment identifiers and timeline arithmetic
//!
//! Per CONTINUITY.md §2:
//! - A segment is addressed by (timeline, log, segment) and rendered as the
//!   canonical 24-hex-digit archive name
//! - Segments are strictly ordered within a timeline
//! - Timelines form a fork tree; a promotion or point-in-time recovery starts
//!   a new timeline at the fork segment
//!
//! Segment numbers wrap into the next log file every `SEGMENTS_PER_LOG`
//! segments, matching the archive layout produced by continuous archiving.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{CatalogError, CatalogResult};

/// Number of segments per log file in the archive naming scheme.
pub const SEGMENTS_PER_LOG: u32 = 0x100;

/// Identifier of one WAL segment in the archive.
///
/// The canonical rendering is `TTTTTTTTLLLLLLLLSSSSSSSS` (three 8-hex-digit
/// fields: timeline, log, segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    /// Timeline this segment belongs to
    pub timeline: u32,
    /// Log file number
    pub log: u32,
    /// Segment number within the log file (< SEGMENTS_PER_LOG)
    pub seg: u32,
}

impl SegmentId {
    /// Create a segment id. The segment number must be below
    /// `SEGMENTS_PER_LOG`; callers advancing segments should use `next()`.
    pub fn new(timeline: u32, log: u32, seg: u32) -> Self {
        Self { timeline, log, seg }
    }

    /// Parse a canonical 24-hex-digit segment name.
    pub fn parse(name: &str) -> CatalogResult<Self> {
        let name = name.trim();
        if name.len() != 24 || !name.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CatalogError::MalformedSegmentName(name.to_string()));
        }

        let timeline = u32::from_str_radix(&name[0..8], 16)
            .map_err(|_| CatalogError::MalformedSegmentName(name.to_string()))?;
        let log = u32::from_str_radix(&name[8..16], 16)
            .map_err(|_| CatalogError::MalformedSegmentName(name.to_string()))?;
        let seg = u32::from_str_radix(&name[16..24], 16)
            .map_err(|_| CatalogError::MalformedSegmentName(name.to_string()))?;

        Ok(Self { timeline, log, seg })
    }

    /// The next segment on the same timeline, wrapping into the next log
    /// file at the segment-per-log boundary.
    pub fn next(self) -> Self {
        if self.seg + 1 >= SEGMENTS_PER_LOG {
            Self {
                timeline: self.timeline,
                log: self.log + 1,
                seg: 0,
            }
        } else {
            Self {
                timeline: self.timeline,
                log: self.log,
                seg: self.seg + 1,
            }
        }
    }

    /// Advance by `n` segments on the same timeline.
    pub fn advance(self, n: u64) -> Self {
        let flat = (self.log as u64) * (SEGMENTS_PER_LOG as u64) + (self.seg as u64) + n;
        Self {
            timeline: self.timeline,
            log: (flat / SEGMENTS_PER_LOG as u64) as u32,
            seg: (flat % SEGMENTS_PER_LOG as u64) as u32,
        }
    }

    /// The same (log, segment) position re-based onto another timeline.
    ///
    /// Per CONTINUITY.md §4, the fork-tolerant scan probes the same position
    /// on a bounded number of forward timelines.
    pub fn on_timeline(self, timeline: u32) -> Self {
        Self { timeline, ..self }
    }

    /// Flat position within the timeline, for distance arithmetic.
    pub fn position(&self) -> u64 {
        (self.log as u64) * (SEGMENTS_PER_LOG as u64) + (self.seg as u64)
    }

    /// Number of segments between `self` and `other` on the same timeline.
    /// Returns zero when `other` is not ahead.
    pub fn distance_to(&self, other: &SegmentId) -> u64 {
        other.position().saturating_sub(self.position())
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}{:08X}{:08X}", self.timeline, self.log, self.seg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rendering() {
        let seg = SegmentId::new(2, 0x1A, 0xFF);
        assert_eq!(seg.to_string(), "000000020000001A000000FF");
    }

    #[test]
    fn test_parse_round_trip() {
        let seg = SegmentId::parse("000000030000002100000004").unwrap();
        assert_eq!(seg, SegmentId::new(3, 0x21, 4));
        assert_eq!(SegmentId::parse(&seg.to_string()).unwrap(), seg);
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        assert!(SegmentId::parse("0000001").is_err());
        assert!(SegmentId::parse("zz000003000000210000000g").is_err());
        assert!(SegmentId::parse("").is_err());
    }

    #[test]
    fn test_next_wraps_into_next_log() {
        let seg = SegmentId::new(1, 5, SEGMENTS_PER_LOG - 1);
        let next = seg.next();
        assert_eq!(next, SegmentId::new(1, 6, 0));
    }

    #[test]
    fn test_next_stays_on_timeline() {
        let seg = SegmentId::new(7, 0, 0);
        assert_eq!(seg.next().timeline, 7);
    }

    #[test]
    fn test_advance_matches_repeated_next() {
        let seg = SegmentId::new(1, 0, 0xF0);
        let mut walked = seg;
        for _ in 0..40 {
            walked = walked.next();
        }
        assert_eq!(seg.advance(40), walked);
    }

    #[test]
    fn test_on_timeline_keeps_position() {
        let seg = SegmentId::new(1, 9, 3);
        let forked = seg.on_timeline(4);
        assert_eq!(forked.timeline, 4);
        assert_eq!(forked.log, 9);
        assert_eq!(forked.seg, 3);
    }

    #[test]
    fn test_distance() {
        let a = SegmentId::new(1, 0, 10);
        let b = a.advance(300);
        assert_eq!(a.distance_to(&b), 300);
        assert_eq!(b.distance_to(&a), 0);
    }

    #[test]
    fn test_ordering_within_timeline() {
        let a = SegmentId::new(1, 0, 5);
        let b = SegmentId::new(1, 0, 6);
        let c = SegmentId::new(1, 1, 0);
        assert!(a < b);
        assert!(b < c);
    }
}
