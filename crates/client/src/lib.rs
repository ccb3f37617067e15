//! Assignment backend client, shared by the grid engine and CLI.
//!
//! This crate is the single source of truth for the backend wire contract:
//! snapshot fetch, async snapshot jobs, row detail, row create/delete, and
//! single/batched hour writes.
//!
//! No grid state. No retries. No progress reporting; callers poll.

mod auth;
mod backend;
mod client;

pub use auth::{
    AuthCredentials, auth_file_path, load_auth, load_auth_from, save_auth, save_auth_to, delete_auth,
};
pub use backend::{
    BackendError, GridBackend, ScopeFilters, Snapshot, PersonSummary, ProjectInfo,
    JobState, JobStatus, HoursUpdate, BulkUpdateResult,
};
pub use client::{HttpBackend, UserInfo};
