//! Errors surfaced by the grid engine.

use std::fmt;

use staffgrid_client::BackendError;
use staffgrid_core::SelectionError;

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Range is not bulk-editable (cross-row or gapped).
    Selection(SelectionError),
    /// Row entity missing locally.
    NotFound(String),
    /// A create/update/delete call failed. Local state was rolled back.
    RemoteWrite(BackendError),
    /// A read outside the snapshot path failed (person detail).
    Fetch(BackendError),
    /// Snapshot could not be obtained by any path.
    SnapshotAcquisition(String),
    /// Client-side aggregation or filter failed.
    Derived(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Selection(e) => write!(f, "{}", e),
            GridError::NotFound(what) => write!(f, "Not found: {}", what),
            GridError::RemoteWrite(e) => write!(f, "Save failed: {}", e),
            GridError::Fetch(e) => write!(f, "Load failed: {}", e),
            GridError::SnapshotAcquisition(msg) => write!(f, "Could not load assignments: {}", msg),
            GridError::Derived(msg) => write!(f, "Computation failed: {}", msg),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::Selection(e) => Some(e),
            GridError::RemoteWrite(e) | GridError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SelectionError> for GridError {
    fn from(e: SelectionError) -> Self {
        GridError::Selection(e)
    }
}
