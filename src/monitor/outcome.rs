//! Recovery boot outcome classification
//!
//! Per MONITOR.md, all text-pattern matching over the database process's
//! output lives here. The two markers that matter:
//!
//! - the "ready" marker, a necessary condition for Completed
//! - the "recovery ended before target reached" marker, which means WAL
//!   coverage ran out before the target. That is reported as FailedGap,
//!   distinct from a timeout or a crash, so the operator is told that WAL
//!   coverage, not configuration, is the cause.

use regex::Regex;

/// Terminal classification of one monitored recovery boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Ready marker seen and the recovery-mode probe flipped false
    Completed,
    /// Replay ended before the target was reached: WAL coverage gap
    FailedGap,
    /// Overall monitor timeout expired first
    TimedOut,
    /// The database process exited on its own
    ProcessExited { code: i32 },
}

/// Event extracted from one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    Ready,
    TargetUnreachable,
}

/// Compiled output markers.
#[derive(Debug)]
pub struct OutputClassifier {
    ready: Regex,
    target_unreachable: Regex,
}

impl OutputClassifier {
    pub fn new() -> Self {
        Self {
            ready: Regex::new(r"ready to accept connections").unwrap(),
            target_unreachable: Regex::new(
                r"recovery ended before configured recovery target was reached",
            )
            .unwrap(),
        }
    }

    /// Classify one line of process output.
    pub fn classify_line(&self, line: &str) -> Option<LineEvent> {
        if self.target_unreachable.is_match(line) {
            Some(LineEvent::TargetUnreachable)
        } else if self.ready.is_match(line) {
            Some(LineEvent::Ready)
        } else {
            None
        }
    }
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_marker_in_log_noise() {
        let classifier = OutputClassifier::new();
        let line = "2026-01-04 16:02:11 UTC [88] LOG:  database system is ready to accept connections";
        assert_eq!(classifier.classify_line(line), Some(LineEvent::Ready));
    }

    #[test]
    fn test_target_unreachable_marker() {
        let classifier = OutputClassifier::new();
        let line =
            "FATAL:  recovery ended before configured recovery target was reached";
        assert_eq!(
            classifier.classify_line(line),
            Some(LineEvent::TargetUnreachable)
        );
    }

    #[test]
    fn test_ordinary_lines_unclassified() {
        let classifier = OutputClassifier::new();
        assert_eq!(classifier.classify_line("LOG:  redo starts at 0/15000028"), None);
        assert_eq!(classifier.classify_line(""), None);
    }
}
