//! Continuity checker error types

use thiserror::Error;

use crate::catalog::CatalogError;

/// Result type for continuity analysis
pub type ContinuityResult<T> = Result<T, ContinuityError>;

/// Errors while scanning the archive for WAL coverage.
///
/// Gap and stall classifications are not errors here; they are ordinary
/// checker outcomes that the pipeline routes through the confirmation
/// policy. Only collaborator failures surface as errors.
#[derive(Debug, Error)]
pub enum ContinuityError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
