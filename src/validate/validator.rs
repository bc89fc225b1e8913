//! Backup and target validation
//!
//! Per RECOVERY.md §4.1, validation is the read-only gate in front of every
//! mutation:
//!
//! - The backup must exist in the catalog (server auto-discovered by probing
//!   when not given) and have Done status
//! - A Timestamp target must lie strictly after the backup's end time,
//!   compared at microsecond resolution
//! - A Timestamp target beyond the last-known-archived time is rejected as
//!   outside the archived window
//! - Latest bypasses both time checks entirely

use crate::catalog::{BackupCatalog, BackupRecord, WalStore};

use super::errors::{ValidationError, ValidationResult};
use super::target::RecoveryTarget;

/// A (backup, target) pair that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub backup: BackupRecord,
    pub target: RecoveryTarget,
}

/// Read-only validator over the catalog.
pub struct TargetValidator<'a, C: BackupCatalog + WalStore> {
    catalog: &'a C,
}

impl<'a, C: BackupCatalog + WalStore> TargetValidator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Find the server holding `backup_id` by probing the catalog.
    pub fn discover_server(&self, backup_id: &str) -> ValidationResult<String> {
        for server in self.catalog.list_servers()? {
            let backups = self.catalog.list_backups(&server)?;
            if backups.iter().any(|b| b.id == backup_id) {
                return Ok(server);
            }
        }
        Err(ValidationError::BackupNotFound(backup_id.to_string()))
    }

    /// Validate `backup_id` + `target`, resolving the server when omitted.
    pub fn validate(
        &self,
        server: Option<&str>,
        backup_id: &str,
        target: RecoveryTarget,
    ) -> ValidationResult<ValidatedRequest> {
        let server = match server {
            Some(s) => s.to_string(),
            None => self.discover_server(backup_id)?,
        };

        let backup = self
            .catalog
            .show_backup(&server, backup_id)
            .map_err(|_| ValidationError::BackupNotFound(backup_id.to_string()))?;

        if !backup.is_usable() {
            return Err(ValidationError::BackupNotUsable {
                id: backup.id.clone(),
                status: backup.status.as_str().to_string(),
            });
        }

        self.check_target_bounds(&backup, &target)?;

        Ok(ValidatedRequest { backup, target })
    }

    /// Timestamp-mode bound checks. Latest performs no comparison at all.
    fn check_target_bounds(
        &self,
        backup: &BackupRecord,
        target: &RecoveryTarget,
    ) -> ValidationResult<()> {
        let target_time = match target {
            RecoveryTarget::Latest => return Ok(()),
            RecoveryTarget::Timestamp(t) => *t,
        };

        if target_time <= backup.end_time {
            return Err(ValidationError::TargetBeforeBackupEnd {
                target: target_time,
                backup_end: backup.end_time,
            });
        }

        // With a known archived time this bound already excludes targets
        // the archive cannot cover; the continuity checker's stall
        // classification then fires only when the catalog reports no
        // archived time at all and the scan finds the tail missing.
        if let Some(last_archived) = self.catalog.last_archived_at()? {
            if target_time > last_archived {
                return Err(ValidationError::TargetBeyondArchivedWindow {
                    target: target_time,
                    last_archived,
                });
            }
        }

        Ok(())
    }
}
