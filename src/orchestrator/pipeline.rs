//! Sequential recovery pipeline
//!
//! Per PIPELINE.md, one recovery run is a strict stage sequence:
//!
//!   validate -> continuity -> plan -> quiesce -> snapshot -> materialize
//!   -> stage -> configure -> [monitor -> reconcile]
//!
//! Confirmation gates sit after continuity (gap or stall finding) and after
//! quiesce (node still in membership). Every stage before Snapshot is
//! read-only; the first mutation is the data-directory rename, and from
//! there a failure keeps the snapshot in place and reports the manual
//! restoration path.

use std::path::PathBuf;

use crate::catalog::{BackupCatalog, WalStore};
use crate::cluster::{ClusterManager, ClusterTopology};
use crate::config::Config;
use crate::confirm::ConfirmationPolicy;
use crate::continuity::{Classification, ContinuityChecker, ContinuityOutcome};
use crate::monitor::{MonitorOutcome, RecoveryMonitor, RecoveryProbe};
use crate::node::{NodeController, QuiesceOutcome};
use crate::observability::{Event, Logger};
use crate::plan::{RecoveryPlan, WalFetchMethod};
use crate::reconcile::{ClusterReconciler, ReconcileReport};
use crate::transfer::TransferChannel;
use crate::validate::{RecoveryTarget, TargetValidator, ValidatedRequest};

use super::context::RecoveryContext;
use super::errors::{RecoveryError, RecoveryResult};

/// One recovery invocation, as requested on the command line.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub server: Option<String>,
    pub backup_id: String,
    pub target: RecoveryTarget,
    pub node: String,
    pub wal_fetch: WalFetchMethod,
    /// Launch the database and monitor recovery to completion
    pub restore: bool,
    /// Reseed siblings automatically after promotion
    pub auto_start: bool,
    pub confirm: ConfirmationPolicy,
}

/// What one run accomplished.
#[derive(Debug)]
pub struct RecoveryReport {
    pub run_id: String,
    pub backup_id: String,
    pub target: String,
    pub node: String,
    pub snapshot_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub monitored: Option<MonitorOutcome>,
    pub reconcile: Option<ReconcileReport>,
    pub diagnostics: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Drives one recovery run across the collaborator seams.
pub struct Pipeline<'a, C, M, T, P>
where
    C: BackupCatalog + WalStore,
    M: ClusterManager,
    T: TransferChannel,
    P: RecoveryProbe,
{
    catalog: &'a C,
    cluster: &'a M,
    transfer: &'a T,
    probe: &'a P,
    config: &'a Config,
}

impl<'a, C, M, T, P> Pipeline<'a, C, M, T, P>
where
    C: BackupCatalog + WalStore,
    M: ClusterManager,
    T: TransferChannel,
    P: RecoveryProbe,
{
    pub fn new(
        catalog: &'a C,
        cluster: &'a M,
        transfer: &'a T,
        probe: &'a P,
        config: &'a Config,
    ) -> Self {
        Self {
            catalog,
            cluster,
            transfer,
            probe,
            config,
        }
    }

    /// Execute one recovery run. `ctx` survives an error so the caller can
    /// print the snapshot path and diagnostics after a mid-run failure.
    pub async fn run(
        &self,
        request: &RunRequest,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<RecoveryReport> {
        Logger::info(
            Event::RecoveryStart.as_str(),
            &ctx.run_id,
            &[
                ("backup_id", &request.backup_id),
                ("target", &request.target.to_string()),
                ("node", &request.node),
            ],
        );

        // Read-only stages.
        let validated = self.validate(request, ctx)?;
        let continuity = self.check_continuity(&validated, ctx)?;
        let override_granted = self.continuity_gate(request, &continuity, ctx)?;

        let plan = RecoveryPlan::build(
            validated,
            &continuity,
            override_granted,
            request.wal_fetch,
            request.node.clone(),
        )?;
        Logger::info(
            Event::PlanBuilt.as_str(),
            &ctx.run_id,
            &[
                ("server", &plan.backup.server),
                ("wal_fetch", plan.wal_fetch.as_str()),
            ],
        );
        ctx.set_plan(plan.clone());

        // Topology is captured before any node is stopped; reconciliation
        // needs the pre-recovery shape.
        let topology = ClusterTopology::from_view(&self.cluster.membership()?);

        let mut controller = NodeController::new(
            self.cluster,
            self.transfer,
            request.node.clone(),
            self.config.data_path(),
            self.config.marker_paths(),
            self.config.quiesce_policy(),
        );

        self.quiesce(request, &mut controller, ctx)?;

        // First mutation: everything below here reports the snapshot path
        // on failure.
        Logger::info(Event::SnapshotStart.as_str(), &ctx.run_id, &[]);
        let snapshot = controller.take_snapshot()?;
        ctx.set_snapshot(&snapshot);
        ctx.phase = controller.phase();
        Logger::info(
            Event::SnapshotComplete.as_str(),
            &ctx.run_id,
            &[("path", &snapshot.display().to_string())],
        );

        let outcome = self
            .mutate_and_monitor(request, &plan, &mut controller, &topology, ctx)
            .await;
        ctx.phase = controller.phase();
        let (config_path, monitored, reconcile) = match outcome {
            Ok(parts) => parts,
            Err(e) => {
                controller.mark_failed();
                ctx.phase = controller.phase();
                Logger::fatal(
                    Event::RecoveryAborted.as_str(),
                    &ctx.run_id,
                    &[("error", &e.to_string())],
                );
                return Err(e);
            }
        };

        Logger::info(Event::RecoveryComplete.as_str(), &ctx.run_id, &[]);

        let mut next_steps = Vec::new();
        if !request.restore {
            next_steps.push(format!(
                "start the database on {} to begin WAL replay",
                request.node
            ));
        }
        if let Some(report) = &reconcile {
            next_steps.extend(report.manual_steps.iter().cloned());
        }

        Ok(RecoveryReport {
            run_id: ctx.run_id.clone(),
            backup_id: request.backup_id.clone(),
            target: request.target.to_string(),
            node: request.node.clone(),
            snapshot_path: ctx.snapshot_path.clone(),
            config_path: Some(config_path),
            monitored,
            reconcile,
            diagnostics: ctx.diagnostics.clone(),
            next_steps,
        })
    }

    fn validate(
        &self,
        request: &RunRequest,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<ValidatedRequest> {
        Logger::info(Event::ValidateStart.as_str(), &ctx.run_id, &[]);
        let validator = TargetValidator::new(self.catalog);
        let validated = validator.validate(
            request.server.as_deref(),
            &request.backup_id,
            request.target.clone(),
        )?;
        if request.server.is_none() {
            Logger::info(
                Event::ServerDiscovered.as_str(),
                &ctx.run_id,
                &[("server", &validated.backup.server)],
            );
        }
        Logger::info(Event::ValidateComplete.as_str(), &ctx.run_id, &[]);
        Ok(validated)
    }

    fn check_continuity(
        &self,
        validated: &ValidatedRequest,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<ContinuityOutcome> {
        Logger::info(Event::ContinuityStart.as_str(), &ctx.run_id, &[]);
        let checker = ContinuityChecker::new(self.config.scan.clone());
        let outcome = checker.check(self.catalog, &validated.backup, &validated.target)?;

        if outcome.truncated {
            ctx.note(format!(
                "continuity scan truncated at {} segments; gaps beyond the window are undetectable",
                outcome.checked
            ));
        }
        Logger::info(
            Event::ContinuityComplete.as_str(),
            &ctx.run_id,
            &[("checked", &outcome.checked.to_string())],
        );
        Ok(outcome)
    }

    /// Gap/stall gate. Returns whether an override was granted; a refusal
    /// becomes the matching typed error.
    fn continuity_gate(
        &self,
        request: &RunRequest,
        continuity: &ContinuityOutcome,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<bool> {
        match &continuity.classification {
            Classification::Complete => Ok(false),
            Classification::GapDetected { missing } => {
                Logger::warn(
                    Event::ContinuityGap.as_str(),
                    &ctx.run_id,
                    &[("missing", &missing.len().to_string())],
                );
                let prompt = format!(
                    "WAL gap: {} segment(s) missing starting at {}. Recovery past the gap is impossible. Proceed anyway?",
                    missing.len(),
                    missing[0]
                );
                if self.gate(request, &prompt, ctx) {
                    ctx.note(format!(
                        "continuity override granted over a gap of {} segment(s)",
                        missing.len()
                    ));
                    Logger::warn(Event::ContinuityOverridden.as_str(), &ctx.run_id, &[]);
                    Ok(true)
                } else {
                    Logger::error(
                        Event::RecoveryAborted.as_str(),
                        &ctx.run_id,
                        &[("gate", "continuity")],
                    );
                    Err(RecoveryError::WalGap {
                        missing: missing.clone(),
                    })
                }
            }
            Classification::ArchivingStalled {
                last_archived,
                target,
            } => {
                Logger::warn(Event::ContinuityStalled.as_str(), &ctx.run_id, &[]);
                let prompt = format!(
                    "Archiving has stalled before target {}; the source stopped shipping WAL. Proceed anyway?",
                    target
                );
                if self.gate(request, &prompt, ctx) {
                    ctx.note("continuity override granted over a stalled archive".to_string());
                    Logger::warn(Event::ContinuityOverridden.as_str(), &ctx.run_id, &[]);
                    Ok(true)
                } else {
                    Logger::error(
                        Event::RecoveryAborted.as_str(),
                        &ctx.run_id,
                        &[("gate", "continuity")],
                    );
                    Err(RecoveryError::ArchivingStalled {
                        last_archived: *last_archived,
                        target: *target,
                    })
                }
            }
        }
    }

    fn quiesce(
        &self,
        request: &RunRequest,
        controller: &mut NodeController<'a, M, T>,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<()> {
        Logger::info(
            Event::QuiesceStart.as_str(),
            &ctx.run_id,
            &[("node", &request.node)],
        );
        match controller.quiesce()? {
            QuiesceOutcome::Confirmed { polls } => {
                Logger::info(
                    Event::QuiesceConfirmed.as_str(),
                    &ctx.run_id,
                    &[("polls", &polls.to_string())],
                );
            }
            QuiesceOutcome::StillPresent { attempts } => {
                Logger::warn(
                    Event::QuiesceUnconfirmed.as_str(),
                    &ctx.run_id,
                    &[("attempts", &attempts.to_string())],
                );
                let prompt = format!(
                    "{} still appears in cluster membership after {} checks; it may not be fully stopped. Proceed to snapshot anyway?",
                    request.node, attempts
                );
                if !self.gate(request, &prompt, ctx) {
                    Logger::error(
                        Event::RecoveryAborted.as_str(),
                        &ctx.run_id,
                        &[("gate", "quiesce")],
                    );
                    return Err(RecoveryError::Aborted {
                        gate: "quiesce".to_string(),
                    });
                }
                ctx.note(format!(
                    "quiesce of {} unconfirmed after {} checks; operator chose to continue",
                    request.node, attempts
                ));
                controller.confirm_quiesce_override()?;
            }
        }
        ctx.phase = controller.phase();
        Ok(())
    }

    /// Stages after Snapshot, grouped so the caller can attach the manual
    /// restoration path to any error from here.
    async fn mutate_and_monitor(
        &self,
        request: &RunRequest,
        plan: &RecoveryPlan,
        controller: &mut NodeController<'a, M, T>,
        topology: &ClusterTopology,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<(PathBuf, Option<MonitorOutcome>, Option<ReconcileReport>)> {
        Logger::info(Event::MaterializeStart.as_str(), &ctx.run_id, &[]);
        self.catalog.materialize(
            &plan.backup.server,
            &plan.backup.id,
            plan.target.timestamp(),
            self.config.scratch_path(),
        )?;
        Logger::info(Event::MaterializeComplete.as_str(), &ctx.run_id, &[]);

        Logger::info(Event::StageStart.as_str(), &ctx.run_id, &[]);
        let stage = controller.stage(self.config.scratch_path())?;
        ctx.phase = controller.phase();
        if let crate::transfer::TransferStatus::Partial { status } = stage.transfer {
            ctx.note(format!(
                "transfer reported partial status {}; all {} marker file(s) verified",
                status, stage.markers_verified
            ));
            Logger::warn(
                Event::StagePartial.as_str(),
                &ctx.run_id,
                &[("status", &status.to_string())],
            );
        }
        Logger::info(
            Event::StageComplete.as_str(),
            &ctx.run_id,
            &[("markers", &stage.markers_verified.to_string())],
        );

        let fetch = self.config.fetch_settings(&plan.backup.server);
        let config_path = controller.configure(plan, &fetch)?;
        Logger::info(
            Event::ConfigWritten.as_str(),
            &ctx.run_id,
            &[("path", &config_path.display().to_string())],
        );

        if !request.restore {
            return Ok((config_path, None, None));
        }

        let outcome = self.monitor_recovery(controller, ctx).await?;
        let reconcile = match outcome {
            MonitorOutcome::Completed => Some(self.reconcile(request, topology, ctx)?),
            _ => None,
        };
        if reconcile.is_some() {
            controller.mark_promoted()?;
            ctx.phase = controller.phase();
        }

        Ok((config_path, Some(outcome), reconcile))
    }

    async fn monitor_recovery(
        &self,
        controller: &mut NodeController<'a, M, T>,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<MonitorOutcome> {
        self.config.validate_restore()?;
        let start = self
            .config
            .start_spec()
            .ok_or_else(|| crate::config::ConfigError::Invalid(
                "db_start_command is required with --restore".to_string(),
            ))?;
        let stop = self
            .config
            .stop_spec()
            .ok_or_else(|| crate::config::ConfigError::Invalid(
                "db_stop_command is required with --restore".to_string(),
            ))?;

        controller.mark_recovering()?;
        ctx.phase = controller.phase();
        Logger::info(Event::MonitorStart.as_str(), &ctx.run_id, &[]);

        let settings = self.config.monitor_settings();
        let monitor = RecoveryMonitor::new(settings.clone());
        let outcome = monitor.run(&start, &stop, self.probe).await?;

        match outcome {
            MonitorOutcome::Completed => {
                Logger::info(Event::MonitorComplete.as_str(), &ctx.run_id, &[]);
                controller.mark_completed()?;
                ctx.phase = controller.phase();
                Ok(MonitorOutcome::Completed)
            }
            MonitorOutcome::FailedGap => {
                Logger::error(Event::MonitorTargetUnreachable.as_str(), &ctx.run_id, &[]);
                Err(RecoveryError::RecoveryTargetUnreachable)
            }
            MonitorOutcome::TimedOut => {
                Logger::error(Event::MonitorTimeout.as_str(), &ctx.run_id, &[]);
                Err(RecoveryError::RecoveryTimeout {
                    timeout_secs: settings.timeout.as_secs(),
                })
            }
            MonitorOutcome::ProcessExited { code } => {
                Logger::error(
                    Event::MonitorProcessExited.as_str(),
                    &ctx.run_id,
                    &[("code", &code.to_string())],
                );
                Err(RecoveryError::ProcessExited { code })
            }
        }
    }

    fn reconcile(
        &self,
        request: &RunRequest,
        topology: &ClusterTopology,
        ctx: &mut RecoveryContext,
    ) -> RecoveryResult<ReconcileReport> {
        Logger::info(Event::ReconcileStart.as_str(), &ctx.run_id, &[]);
        let reconciler = ClusterReconciler::new(
            self.cluster,
            self.config.reconcile_policy(request.auto_start),
        );
        let report = reconciler.reconcile(&request.node, topology)?;

        if report.forced_promotion {
            Logger::warn(Event::PromotionForced.as_str(), &ctx.run_id, &[]);
        }
        for sibling in &report.reseeded {
            Logger::info(
                Event::SiblingReseeded.as_str(),
                &ctx.run_id,
                &[("sibling", sibling)],
            );
        }
        for warning in &report.warnings {
            ctx.note(warning.clone());
        }
        Logger::info(Event::ReconcileComplete.as_str(), &ctx.run_id, &[]);
        Ok(report)
    }

    /// Route one question through the confirmation policy.
    fn gate(&self, request: &RunRequest, prompt: &str, ctx: &RecoveryContext) -> bool {
        Logger::warn(
            Event::ConfirmationRequested.as_str(),
            &ctx.run_id,
            &[("policy", request.confirm.as_str())],
        );
        let granted = request.confirm.decide(prompt);
        if !granted {
            Logger::warn(Event::ConfirmationDenied.as_str(), &ctx.run_id, &[]);
        }
        granted
    }
}
