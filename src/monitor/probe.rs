//! Recovery-mode probe
//!
//! Per MONITOR.md, "ready" output alone does not mean the target was
//! reached; the running instance must also report that it left recovery
//! mode. The probe is the second half of the completion predicate. It runs
//! inside the monitor's select loop, so it is async: a slow query must not
//! stall line draining or the overall deadline.

use std::future::Future;

use tokio::process::Command;

use super::errors::{MonitorError, MonitorResult};

/// Asks the running instance whether it is still in recovery mode.
pub trait RecoveryProbe {
    fn in_recovery(&self) -> impl Future<Output = MonitorResult<bool>>;
}

/// Probe backed by a query command against the running instance. The
/// command's stdout is expected to be a boolean-ish token (`t`/`f`,
/// `true`/`false`, `on`/`off`).
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl RecoveryProbe for CommandProbe {
    async fn in_recovery(&self) -> MonitorResult<bool> {
        let out = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                MonitorError::Probe(format!("failed to run '{}': {}", self.program, e))
            })?;

        if !out.status.success() {
            // Instance not yet answering queries counts as still recovering.
            return Ok(true);
        }

        let answer = String::from_utf8_lossy(&out.stdout);
        match answer.trim() {
            "t" | "true" | "on" | "1" => Ok(true),
            "f" | "false" | "off" | "0" => Ok(false),
            other => Err(MonitorError::Probe(format!(
                "unexpected probe answer '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(script: &str) -> CommandProbe {
        CommandProbe::new("/bin/sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_boolean_tokens() {
        assert!(probe("echo t").in_recovery().await.unwrap());
        assert!(probe("echo true").in_recovery().await.unwrap());
        assert!(!probe("echo f").in_recovery().await.unwrap());
        assert!(!probe("echo false").in_recovery().await.unwrap());
    }

    #[tokio::test]
    async fn test_unanswering_instance_counts_as_recovering() {
        assert!(probe("exit 2").in_recovery().await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_answer_is_probe_error() {
        assert!(probe("echo maybe").in_recovery().await.is_err());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_probe_error() {
        let missing = CommandProbe::new("definitely-not-a-real-binary-xyz", vec![]);
        assert!(matches!(
            missing.in_recovery().await,
            Err(MonitorError::Probe(_))
        ));
    }
}
