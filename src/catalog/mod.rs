//! Backup catalog subsystem
//!
//! Per CATALOG.md, this is the leaf adapter over the external backup/archive
//! service. It answers metadata queries (backups, WAL segment presence,
//! archive status) and materializes base backups into a scratch location.
//! All text parsing of the catalog tool's output lives here; the rest of the
//! orchestrator consumes typed records only.

mod client;
mod errors;
mod record;
mod segment;

pub use client::{BackupCatalog, CommandCatalog, WalStore};
pub use errors::{CatalogError, CatalogResult};
pub use record::{parse_catalog_time, BackupRecord, BackupStatus};
pub use segment::{SegmentId, SEGMENTS_PER_LOG};
