//! CLI Exit Code Registry
//!
//! Single source of truth for `sgrid` exit codes. Scripts rely on them.
//!
//! | Range | Domain    | Description                                 |
//! |-------|-----------|---------------------------------------------|
//! | 0     | Universal | Success                                     |
//! | 1     | Universal | General error (unspecified)                 |
//! | 2     | Universal | Usage error (bad args, week not on axis)    |
//! | 40-49 | backend   | Auth, network, rejected or partial writes   |

use staffgrid_client::BackendError;
use staffgrid_engine::GridError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown cell, selection not editable.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Backend (40-49)
// =============================================================================

/// No saved credentials, or the token was refused.
pub const EXIT_NOT_AUTH: u8 = 40;

/// Backend unreachable.
pub const EXIT_NETWORK: u8 = 41;

/// Backend rejected the request (validation or other HTTP error).
pub const EXIT_REJECTED: u8 = 42;

/// Person, assignment or job not found.
pub const EXIT_NOT_FOUND: u8 = 43;

/// Snapshot could not be loaded by any path.
pub const EXIT_LOAD_FAILED: u8 = 44;

/// Some rows of a write failed and were rolled back.
pub const EXIT_PARTIAL_WRITE: u8 = 45;

pub fn backend_exit_code(err: &BackendError) -> u8 {
    match err {
        BackendError::NotAuthenticated | BackendError::Http(401, _) | BackendError::Http(403, _) => {
            EXIT_NOT_AUTH
        }
        BackendError::Network(_) | BackendError::Timeout(_) => EXIT_NETWORK,
        BackendError::Validation(_) | BackendError::Http(_, _) => EXIT_REJECTED,
        BackendError::NotFound(_) => EXIT_NOT_FOUND,
        BackendError::Parse(_) | BackendError::Io(_) => EXIT_ERROR,
    }
}

pub fn grid_exit_code(err: &GridError) -> u8 {
    match err {
        GridError::Selection(_) => EXIT_USAGE,
        GridError::NotFound(_) => EXIT_NOT_FOUND,
        GridError::RemoteWrite(e) | GridError::Fetch(e) => backend_exit_code(e),
        GridError::SnapshotAcquisition(_) => EXIT_LOAD_FAILED,
        GridError::Derived(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgrid_core::SelectionError;

    #[test]
    fn test_backend_codes() {
        assert_eq!(backend_exit_code(&BackendError::Http(401, "x".into())), EXIT_NOT_AUTH);
        assert_eq!(backend_exit_code(&BackendError::Http(500, "x".into())), EXIT_REJECTED);
        assert_eq!(backend_exit_code(&BackendError::Timeout("x".into())), EXIT_NETWORK);
    }

    #[test]
    fn test_grid_codes() {
        assert_eq!(grid_exit_code(&GridError::Selection(SelectionError::NotContiguous)), EXIT_USAGE);
        assert_eq!(
            grid_exit_code(&GridError::RemoteWrite(BackendError::NotFound("a".into()))),
            EXIT_NOT_FOUND
        );
        assert_eq!(grid_exit_code(&GridError::SnapshotAcquisition("x".into())), EXIT_LOAD_FAILED);
    }
}
