//! CLI command dispatch
//!
//! Each subcommand loads configuration, wires the command-backed adapters
//! over `SystemRunner`, and drives the matching entry point. Only `recover`
//! mutates anything; `validate` and `check-wal` are read-only previews of
//! its first two stages.

use std::path::Path;

use crate::catalog::CommandCatalog;
use crate::cluster::CommandCluster;
use crate::config::Config;
use crate::confirm::ConfirmationPolicy;
use crate::continuity::{Classification, ContinuityChecker};
use crate::monitor::CommandProbe;
use crate::orchestrator::{Pipeline, RecoveryContext, RecoveryReport, RunRequest};
use crate::plan::WalFetchMethod;
use crate::runner::SystemRunner;
use crate::transfer::RsyncChannel;
use crate::validate::{RecoveryTarget, TargetValidator, ValidatedRequest};

use super::args::{Cli, Command};
use super::errors::{CliError, CliErrorCode, CliResult};

/// Dispatch a parsed command line.
pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Recover {
            backup_id,
            target,
            server,
            target_node,
            restore,
            wal_method,
            auto_start,
            confirm,
            config,
        } => recover(
            backup_id,
            target,
            server,
            target_node,
            restore,
            wal_method,
            auto_start,
            confirm,
            &config,
        ),
        Command::Validate {
            backup_id,
            target,
            server,
            config,
        } => validate(backup_id, target, server, &config),
        Command::CheckWal {
            backup_id,
            target,
            server,
            config,
        } => check_wal(backup_id, target, server, &config),
    }
}

#[allow(clippy::too_many_arguments)]
fn recover(
    backup_id: String,
    target: String,
    server: Option<String>,
    target_node: Option<String>,
    restore: bool,
    wal_method: String,
    auto_start: bool,
    confirm: String,
    config_path: &Path,
) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let target = parse_target(&target)?;
    let wal_fetch = WalFetchMethod::parse(&wal_method)
        .map_err(|e| CliError::invalid_argument(e.to_string()))?;
    let confirm = ConfirmationPolicy::parse(&confirm)
        .ok_or_else(|| CliError::invalid_argument(format!("unknown confirm policy '{}'", confirm)))?;
    if restore {
        config.validate_restore()?;
    }

    let node = target_node.unwrap_or_else(|| config.node.clone());
    let server = resolve_server(&config, &backup_id, server)?;

    let catalog = CommandCatalog::new(SystemRunner::new(), config.catalog_tool.as_str(), server.as_str());
    let cluster = CommandCluster::new(SystemRunner::new(), config.cluster_tool.as_str());
    let transfer = RsyncChannel::new(
        SystemRunner::new(),
        config.rsync_program.as_str(),
        config.ssh_program.as_str(),
    );
    // Placeholder when --restore is absent; the monitor stage never runs.
    let (probe_program, probe_args) = config
        .probe_command()
        .unwrap_or_else(|| ("false".to_string(), Vec::new()));
    let probe = CommandProbe::new(probe_program, probe_args);

    let pipeline = Pipeline::new(&catalog, &cluster, &transfer, &probe, &config);
    let request = RunRequest {
        server: Some(server),
        backup_id,
        target,
        node,
        wal_fetch,
        restore,
        auto_start,
        confirm,
    };
    let mut ctx = RecoveryContext::new();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            CliError::new(
                CliErrorCode::RecoveryFailed,
                format!("failed to start runtime: {}", e),
            )
        })?;

    match runtime.block_on(pipeline.run(&request, &mut ctx)) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            for diagnostic in &ctx.diagnostics {
                eprintln!("note: {}", diagnostic);
            }
            if let Some(guidance) = ctx.restore_guidance() {
                eprintln!("{}", guidance);
            }
            Err(e.into())
        }
    }
}

fn validate(
    backup_id: String,
    target: String,
    server: Option<String>,
    config_path: &Path,
) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let target = parse_target(&target)?;
    let server = resolve_server(&config, &backup_id, server)?;
    let catalog = CommandCatalog::new(SystemRunner::new(), config.catalog_tool.as_str(), server.as_str());

    let validated = run_validation(&catalog, &server, &backup_id, target)?;
    println!(
        "backup {} on {} is usable; ends at {}",
        validated.backup.id, validated.backup.server, validated.backup.end_time
    );
    println!("target {} accepted", validated.target);
    Ok(())
}

fn check_wal(
    backup_id: String,
    target: String,
    server: Option<String>,
    config_path: &Path,
) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let target = parse_target(&target)?;
    let server = resolve_server(&config, &backup_id, server)?;
    let catalog = CommandCatalog::new(SystemRunner::new(), config.catalog_tool.as_str(), server.as_str());

    let validated = run_validation(&catalog, &server, &backup_id, target)?;
    let checker = ContinuityChecker::new(config.scan.clone());
    let outcome = checker
        .check(&catalog, &validated.backup, &validated.target)
        .map_err(|e| CliError::check_failed(e.to_string()))?;

    if outcome.truncated {
        println!(
            "note: scan truncated at {} segments; gaps beyond the window are undetectable",
            outcome.checked
        );
    }

    match outcome.classification {
        Classification::Complete => {
            println!(
                "WAL continuity satisfied ({} segment(s) checked)",
                outcome.checked
            );
            Ok(())
        }
        Classification::GapDetected { missing } => Err(CliError::check_failed(format!(
            "WAL gap: {} segment(s) missing, first {}",
            missing.len(),
            missing[0]
        ))),
        Classification::ArchivingStalled { target, .. } => Err(CliError::check_failed(format!(
            "archiving stalled before target {}",
            target
        ))),
    }
}

fn parse_target(raw: &str) -> CliResult<RecoveryTarget> {
    RecoveryTarget::parse(raw).map_err(|e| CliError::invalid_argument(e.to_string()))
}

fn run_validation(
    catalog: &CommandCatalog<SystemRunner>,
    server: &str,
    backup_id: &str,
    target: RecoveryTarget,
) -> CliResult<ValidatedRequest> {
    TargetValidator::new(catalog)
        .validate(Some(server), backup_id, target)
        .map_err(|e| CliError::check_failed(e.to_string()))
}

/// Server precedence: --server flag, then the config file, then catalog
/// discovery by probing each server's backup list.
fn resolve_server(
    config: &Config,
    backup_id: &str,
    flag: Option<String>,
) -> CliResult<String> {
    if let Some(server) = flag {
        return Ok(server);
    }
    if let Some(server) = &config.catalog_server {
        return Ok(server.clone());
    }

    let discovery = CommandCatalog::new(SystemRunner::new(), config.catalog_tool.as_str(), "");
    TargetValidator::new(&discovery)
        .discover_server(backup_id)
        .map_err(|e| CliError::check_failed(e.to_string()))
}

fn print_report(report: &RecoveryReport) {
    println!("recovery run {} finished", report.run_id);
    println!("  backup:  {}", report.backup_id);
    println!("  target:  {}", report.target);
    println!("  node:    {}", report.node);
    if let Some(snapshot) = &report.snapshot_path {
        println!("  original data preserved at {}", snapshot.display());
    }
    if let Some(path) = &report.config_path {
        println!("  recovery config written to {}", path.display());
    }
    if let Some(outcome) = &report.monitored {
        println!("  recovery boot: {:?}", outcome);
    }
    if let Some(reconcile) = &report.reconcile {
        let promotion = if reconcile.forced_promotion {
            "forced"
        } else {
            "converged"
        };
        println!(
            "  promotion {} ; {} sibling(s) quiesced, {} reseeded",
            promotion,
            reconcile.quiesced_siblings.len(),
            reconcile.reseeded.len()
        );
    }
    for diagnostic in &report.diagnostics {
        println!("  note: {}", diagnostic);
    }
    for step in &report.next_steps {
        println!("  next: {}", step);
    }
}
