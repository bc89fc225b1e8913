//! End-to-end pipeline scenarios over in-memory fakes and temp directories:
//! the read-only gates, the mutation sequence, and the restore path.

mod common;

use std::fs;

use chrono::Duration;
use tempfile::TempDir;

use pitrctl::catalog::SegmentId;
use pitrctl::confirm::ConfirmationPolicy;
use pitrctl::monitor::MonitorOutcome;
use pitrctl::orchestrator::{Pipeline, RecoveryContext, RecoveryError, RunRequest};
use pitrctl::plan::WalFetchMethod;
use pitrctl::validate::RecoveryTarget;

use common::{
    backup_end_time, sample_backup, test_config, FakeCatalog, FakeCluster, FakeProbe,
    FakeTransfer, BACKUP_ID, SERVER,
};

struct Harness {
    temp: TempDir,
    catalog: FakeCatalog,
    cluster: FakeCluster,
    transfer: FakeTransfer,
}

impl Harness {
    fn new(catalog: FakeCatalog) -> Self {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        fs::create_dir(&data_dir).unwrap();
        fs::write(data_dir.join("base.db"), b"original").unwrap();

        Self {
            temp,
            catalog,
            cluster: FakeCluster::new(&["node1", "node2", "node3"], "node1"),
            transfer: FakeTransfer::new(),
        }
    }

    fn config(&self) -> pitrctl::config::Config {
        test_config(&self.temp.path().join("data"), &self.temp.path().join("scratch"))
    }

    fn request(&self, target: RecoveryTarget, confirm: ConfirmationPolicy) -> RunRequest {
        RunRequest {
            server: Some(SERVER.to_string()),
            backup_id: BACKUP_ID.to_string(),
            target,
            node: "node2".to_string(),
            wal_fetch: WalFetchMethod::Direct,
            restore: false,
            auto_start: false,
            confirm,
        }
    }
}

fn near_target() -> RecoveryTarget {
    RecoveryTarget::Timestamp(backup_end_time() + Duration::minutes(2))
}

fn far_target() -> RecoveryTarget {
    RecoveryTarget::Timestamp(backup_end_time() + Duration::minutes(10))
}

// =========================================================================
// Happy path: stage and configure without launching the database
// =========================================================================

#[tokio::test]
async fn test_recover_stages_data_and_writes_recovery_config() {
    let harness = Harness::new(FakeCatalog::new().with_continuous_archive(2));
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let report = pipeline
        .run(
            &harness.request(near_target(), ConfirmationPolicy::AutoAbort),
            &mut ctx,
        )
        .await
        .unwrap();

    let data_dir = harness.temp.path().join("data");
    assert!(data_dir.join("PG_VERSION").exists());
    assert!(data_dir.join("backup_label").exists());

    let conf = fs::read_to_string(data_dir.join("recovery.conf")).unwrap();
    assert!(conf.contains("restore_command = 'wal-fetch db1 %f %p'"));
    assert!(conf.contains("recovery_target_time"));

    // Original data preserved under the snapshot path.
    let snapshot = report.snapshot_path.clone().unwrap();
    assert!(snapshot.join("base.db").exists());

    assert!(report.monitored.is_none());
    assert!(report
        .next_steps
        .iter()
        .any(|s| s.contains("start the database")));
}

// =========================================================================
// Continuity gate: gap refused, gap overridden, stall refused
// =========================================================================

#[tokio::test]
async fn test_wal_gap_refused_before_any_mutation() {
    let harness = Harness::new(FakeCatalog::new());
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let err = pipeline
        .run(
            &harness.request(far_target(), ConfirmationPolicy::AutoAbort),
            &mut ctx,
        )
        .await
        .unwrap_err();

    match err {
        RecoveryError::WalGap { missing } => {
            assert_eq!(missing[0], sample_backup().end_wal);
        }
        other => panic!("expected WalGap, got {:?}", other),
    }

    // Nothing was touched: no cluster calls, data dir intact.
    assert!(harness.cluster.calls().is_empty());
    assert!(harness.temp.path().join("data").join("base.db").exists());
    assert!(!ctx.mutation_started());
}

#[tokio::test]
async fn test_wal_gap_override_proceeds_with_diagnostic() {
    let harness = Harness::new(FakeCatalog::new());
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let report = pipeline
        .run(
            &harness.request(far_target(), ConfirmationPolicy::AutoApprove),
            &mut ctx,
        )
        .await
        .unwrap();

    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.contains("override granted")));
    assert!(ctx.plan.as_ref().unwrap().continuity_overridden);
}

#[tokio::test]
async fn test_stalled_archive_refused_as_stall_not_gap() {
    let mut catalog = FakeCatalog::new();
    catalog.last_archived = None;
    let harness = Harness::new(catalog);
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let err = pipeline
        .run(
            &harness.request(far_target(), ConfirmationPolicy::AutoAbort),
            &mut ctx,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RecoveryError::ArchivingStalled { .. }));
}

// =========================================================================
// Quiesce gate: node that refuses to leave membership
// =========================================================================

#[tokio::test]
async fn test_unconfirmed_quiesce_refused_leaves_data_intact() {
    let mut harness = Harness::new(FakeCatalog::new().with_continuous_archive(2));
    harness.cluster.stop_takes_effect = false;
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let err = pipeline
        .run(
            &harness.request(near_target(), ConfirmationPolicy::AutoAbort),
            &mut ctx,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RecoveryError::Aborted { ref gate } if gate == "quiesce"));
    assert!(harness.temp.path().join("data").join("base.db").exists());
    assert!(!ctx.mutation_started());
}

#[tokio::test]
async fn test_unconfirmed_quiesce_override_continues() {
    let mut harness = Harness::new(FakeCatalog::new().with_continuous_archive(2));
    harness.cluster.stop_takes_effect = false;
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let report = pipeline
        .run(
            &harness.request(near_target(), ConfirmationPolicy::AutoApprove),
            &mut ctx,
        )
        .await
        .unwrap();

    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.contains("unconfirmed")));
    assert!(report.config_path.unwrap().exists());
}

// =========================================================================
// Post-snapshot failure reports the manual restoration path
// =========================================================================

#[tokio::test]
async fn test_materialize_failure_after_snapshot_keeps_rollback_anchor() {
    let mut catalog = FakeCatalog::new().with_continuous_archive(2);
    catalog.fail_materialize = true;
    let harness = Harness::new(catalog);
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let err = pipeline
        .run(
            &harness.request(near_target(), ConfirmationPolicy::AutoAbort),
            &mut ctx,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RecoveryError::Catalog(_)));
    assert!(ctx.mutation_started());

    // The snapshot still holds the original data, and the guidance names it.
    let snapshot = ctx.snapshot_path.clone().unwrap();
    assert!(snapshot.join("base.db").exists());
    assert!(ctx.restore_guidance().unwrap().contains(
        snapshot.file_name().unwrap().to_str().unwrap()
    ));
}

// =========================================================================
// Full restore: monitor the recovery boot, then reconcile membership
// =========================================================================

#[tokio::test]
async fn test_restore_monitors_boot_and_reconciles_cluster() {
    let mut harness = Harness::new(FakeCatalog::new().with_continuous_archive(2));
    harness.cluster.leader_on_start = true;

    let mut config = harness.config();
    config.db_start_command = vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        "echo 'database system is ready to accept connections'; sleep 5".to_string(),
    ];
    config.db_stop_command = vec!["true".to_string()];
    config.db_probe_command = vec!["true".to_string()];
    config.monitor_poll_secs = 1;
    config.monitor_timeout_secs = 10;
    config.stop_grace_secs = 1;

    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let mut request = harness.request(near_target(), ConfirmationPolicy::AutoAbort);
    request.restore = true;
    request.auto_start = true;

    let report = pipeline.run(&request, &mut ctx).await.unwrap();

    assert_eq!(report.monitored, Some(MonitorOutcome::Completed));

    let reconcile = report.reconcile.unwrap();
    assert!(reconcile.leader_confirmed);
    assert!(!reconcile.forced_promotion);
    assert_eq!(reconcile.reseeded, vec!["node1", "node3"]);

    let calls = harness.cluster.calls();
    assert!(calls.contains(&"start node2".to_string()));
    assert!(calls.contains(&"reinit node1".to_string()));
    assert!(calls.contains(&"reinit node3".to_string()));
}

// Gap scan names consecutive missing segments up to the early-stop run.
#[tokio::test]
async fn test_gap_names_consecutive_missing_segments() {
    let harness = Harness::new(FakeCatalog::new());
    let config = harness.config();
    let pipeline = Pipeline::new(
        &harness.catalog,
        &harness.cluster,
        &harness.transfer,
        &FakeProbe,
        &config,
    );
    let mut ctx = RecoveryContext::new();

    let err = pipeline
        .run(
            &harness.request(far_target(), ConfirmationPolicy::AutoAbort),
            &mut ctx,
        )
        .await
        .unwrap_err();

    let missing = match err {
        RecoveryError::WalGap { missing } => missing,
        other => panic!("expected WalGap, got {:?}", other),
    };
    let base = sample_backup().end_wal;
    let expected: Vec<SegmentId> = (0..3).map(|n| base.advance(n)).collect();
    assert_eq!(missing, expected);
}
