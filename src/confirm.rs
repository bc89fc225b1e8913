//! Operator confirmation gates
//!
//! Per PIPELINE.md, the pipeline pauses at two points for an explicit
//! decision: proceeding past an unsatisfied WAL continuity check, and
//! proceeding past an unconfirmed quiesce. Both gates route through the
//! same policy so unattended runs behave predictably.

use std::io::{self, BufRead, Write};

/// How confirmation gates are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPolicy {
    /// Prompt the operator on the terminal (default)
    Interactive,
    /// Answer yes to every gate without prompting
    AutoApprove,
    /// Answer no to every gate without prompting
    AutoAbort,
}

impl ConfirmationPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "interactive" => Some(Self::Interactive),
            "auto-approve" => Some(Self::AutoApprove),
            "auto-abort" => Some(Self::AutoAbort),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::AutoApprove => "auto-approve",
            Self::AutoAbort => "auto-abort",
        }
    }

    /// Answer a gate. Interactive prompts on stderr and reads one line from
    /// stdin; anything other than `y`/`yes` is a refusal.
    pub fn decide(&self, prompt: &str) -> bool {
        match self {
            Self::AutoApprove => true,
            Self::AutoAbort => false,
            Self::Interactive => {
                let mut stderr = io::stderr();
                let _ = write!(stderr, "{} [y/N]: ", prompt);
                let _ = stderr.flush();

                let mut answer = String::new();
                if io::stdin().lock().read_line(&mut answer).is_err() {
                    return false;
                }
                matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
            }
        }
    }
}
