//! Recovery boot monitor
//!
//! Per MONITOR.md, the monitor is the one concurrent element of the
//! pipeline:
//!
//! - the database process is launched directly (not through the cluster
//!   manager) so its boot can be observed in isolation
//! - a reader task drains stdout/stderr lines onto a channel
//! - the select loop alternates between consumed lines, a poll tick and the
//!   overall deadline, exiting on the first terminal classification
//! - completion requires all three: process alive, ready marker seen, and
//!   the recovery-mode probe flipped false
//! - on Completed the directly-launched process is stopped gracefully (kill
//!   fallback) so the cluster manager can take ownership cleanly

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::errors::{MonitorError, MonitorResult};
use super::outcome::{LineEvent, MonitorOutcome, OutputClassifier};
use super::probe::RecoveryProbe;

/// One external command to launch or stop the database process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Monitor timing bounds. Every wait in the loop is bounded.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Completion-predicate poll interval
    pub poll_interval: Duration,
    /// Overall deadline for the whole recovery boot
    pub timeout: Duration,
    /// Grace period for the stop command before the kill fallback
    pub stop_grace: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
            stop_grace: Duration::from_secs(30),
        }
    }
}

/// Watches one recovery boot to a terminal classification.
pub struct RecoveryMonitor {
    settings: MonitorSettings,
    classifier: OutputClassifier,
}

impl RecoveryMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            settings,
            classifier: OutputClassifier::new(),
        }
    }

    /// Launch the database process and watch it until a terminal
    /// classification is reached.
    pub async fn run<P: RecoveryProbe>(
        &self,
        start: &ProcessSpec,
        stop: &ProcessSpec,
        probe: &P,
    ) -> MonitorResult<MonitorOutcome> {
        let mut child = Command::new(&start.program)
            .args(&start.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MonitorError::Spawn {
                program: start.program.clone(),
                source: e,
            })?;

        let (tx, mut rx) = mpsc::channel::<String>(256);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, tx.clone());
        }
        drop(tx);

        let deadline = tokio::time::sleep(self.settings.timeout);
        tokio::pin!(deadline);

        let mut tick = tokio::time::interval(self.settings.poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ready_seen = false;
        let mut output_open = true;

        loop {
            tokio::select! {
                maybe_line = rx.recv(), if output_open => {
                    match maybe_line {
                        Some(line) => match self.classifier.classify_line(&line) {
                            Some(LineEvent::Ready) => ready_seen = true,
                            Some(LineEvent::TargetUnreachable) => {
                                let _ = child.kill().await;
                                return Ok(MonitorOutcome::FailedGap);
                            }
                            None => {}
                        },
                        // Output streams closed; the tick branch will pick
                        // up the exit status.
                        None => output_open = false,
                    }
                }
                _ = tick.tick() => {
                    if let Some(status) = child.try_wait()? {
                        // The exit status can land before queued output is
                        // consumed; a target-unreachable marker followed by
                        // a prompt exit must still classify as a gap, not a
                        // plain exit.
                        if self.drain_remaining_output(&mut rx).await {
                            return Ok(MonitorOutcome::FailedGap);
                        }
                        return Ok(MonitorOutcome::ProcessExited {
                            code: status.code().unwrap_or(-1),
                        });
                    }
                    if ready_seen && !probe.in_recovery().await? {
                        self.stop_gracefully(&mut child, stop).await;
                        return Ok(MonitorOutcome::Completed);
                    }
                }
                _ = &mut deadline => {
                    let _ = child.kill().await;
                    return Ok(MonitorOutcome::TimedOut);
                }
            }
        }
    }

    /// Consume output still queued after the process exited, looking for
    /// the target-unreachable marker. The reader tasks close the channel at
    /// EOF; a grandchild holding the pipes open is bounded by one poll
    /// interval.
    async fn drain_remaining_output(&self, rx: &mut mpsc::Receiver<String>) -> bool {
        loop {
            match tokio::time::timeout(self.settings.poll_interval, rx.recv()).await {
                Ok(Some(line)) => {
                    if self.classifier.classify_line(&line) == Some(LineEvent::TargetUnreachable) {
                        return true;
                    }
                }
                Ok(None) | Err(_) => return false,
            }
        }
    }

    /// Graceful stop with kill fallback.
    async fn stop_gracefully(&self, child: &mut Child, stop: &ProcessSpec) {
        let graceful = async {
            let status = Command::new(&stop.program)
                .args(&stop.args)
                .status()
                .await
                .ok()?;
            if !status.success() {
                return None;
            }
            child.wait().await.ok()
        };

        match tokio::time::timeout(self.settings.stop_grace, graceful).await {
            Ok(Some(_)) => {}
            _ => {
                let _ = child.kill().await;
            }
        }
    }
}

fn spawn_line_reader<S: AsyncRead + Unpin + Send + 'static>(stream: S, tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}
