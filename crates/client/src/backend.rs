//! The backend contract the grid engine is written against.
//!
//! One trait method per remote operation, plus the wire types they carry.
//! `HttpBackend` is the production implementation; tests plug in fakes.

use std::fmt;

use serde::{Deserialize, Serialize};
use staffgrid_core::{
    AggregateTotals, Assignment, AssignmentId, PersonId, ProjectId, WeekKey, WeeklyHours,
};

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// No auth credentials configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Server rejected the request (400/422 with message)
    Validation(String),
    /// Entity does not exist on the server (404)
    NotFound(String),
    /// JSON parsing error, or a response missing required fields
    Parse(String),
    /// Timeout waiting for a job
    Timeout(String),
    /// File I/O error
    Io(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotAuthenticated => write!(f, "Not authenticated — run `sgrid login` first"),
            BackendError::Network(msg) => write!(f, "Network error: {}", msg),
            BackendError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            BackendError::Validation(msg) => write!(f, "{}", msg),
            BackendError::NotFound(msg) => write!(f, "Not found: {}", msg),
            BackendError::Parse(msg) => write!(f, "Parse error: {}", msg),
            BackendError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Department scoping applied to snapshots and size probes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<i64>,
    #[serde(default)]
    pub include_children: bool,
}

impl ScopeFilters {
    pub fn department(id: i64) -> Self {
        Self { department: Some(id), include_children: false }
    }

    /// Query-string pairs for GET endpoints.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(dept) = self.department {
            pairs.push(("department", dept.to_string()));
            if self.include_children {
                pairs.push(("include_children", "1".to_string()));
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: PersonId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Everything one grid render needs: week axis, rows, per-person totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(alias = "weekKeys")]
    pub week_keys: Vec<WeekKey>,
    /// People in scope, including those whose rows are not in `rows`.
    #[serde(default)]
    pub people: Vec<PersonSummary>,
    #[serde(default)]
    pub rows: Vec<Assignment>,
    #[serde(default)]
    pub projects: Vec<ProjectInfo>,
    #[serde(default, alias = "hoursByPerson")]
    pub totals: AggregateTotals,
}

impl Snapshot {
    /// A usable snapshot has at least one week column.
    pub fn is_populated(&self) -> bool {
        !self.week_keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    #[serde(alias = "STARTED", alias = "PROGRESS", alias = "RUNNING", alias = "QUEUED")]
    Pending,
    Success,
    Failure,
}

/// One poll of an asynchronous snapshot job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn pending(progress: f64) -> Self {
        Self { state: JobState::Pending, progress, message: None, result: None, error: None }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, JobState::Pending)
    }

    /// Decode the result payload of a successful job. A missing, null,
    /// undecodable or empty payload is an error.
    pub fn snapshot(&self) -> Result<Snapshot, BackendError> {
        let payload = match &self.result {
            Some(v) if !v.is_null() => v,
            _ => return Err(BackendError::Parse("job succeeded without a result".into())),
        };
        let snapshot: Snapshot = serde_json::from_value(payload.clone())
            .map_err(|e| BackendError::Parse(format!("malformed job result: {}", e)))?;
        if !snapshot.is_populated() {
            return Err(BackendError::Parse("job result has no week keys".into()));
        }
        Ok(snapshot)
    }
}

/// One row's replacement hours in a batched write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursUpdate {
    pub assignment_id: AssignmentId,
    pub weekly_hours: WeeklyHours,
}

/// Per-row outcome of a batched write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateResult {
    pub assignment_id: AssignmentId,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl BulkUpdateResult {
    pub fn ok(assignment_id: AssignmentId) -> Self {
        Self { assignment_id, status: "ok".into(), error: None }
    }

    pub fn failed(assignment_id: AssignmentId, error: impl Into<String>) -> Self {
        Self { assignment_id, status: "error".into(), error: Some(error.into()) }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status.to_ascii_lowercase().as_str(), "ok" | "success" | "updated")
    }
}

/// Remote operations the grid engine depends on.
///
/// Every call is blocking; each is a point where a host event loop may
/// interleave other user input.
pub trait GridBackend {
    /// Full snapshot in one request.
    fn fetch_snapshot(&self, weeks: u32, scope: &ScopeFilters) -> Result<Snapshot, BackendError>;

    /// Start an asynchronous snapshot job. Returns the job id.
    fn submit_snapshot_job(&self, weeks: u32, scope: &ScopeFilters) -> Result<String, BackendError>;

    fn poll_job(&self, job_id: &str) -> Result<JobStatus, BackendError>;

    /// All assignments of one person, with hours.
    fn fetch_row_detail(&self, person_id: PersonId) -> Result<Vec<Assignment>, BackendError>;

    fn create_row(&self, person_id: PersonId, project_id: ProjectId) -> Result<Assignment, BackendError>;

    fn delete_row(&self, assignment_id: AssignmentId) -> Result<(), BackendError>;

    /// Replace one row's hours. Returns the row as stored.
    fn update_row_hours(
        &self,
        assignment_id: AssignmentId,
        weekly_hours: &WeeklyHours,
    ) -> Result<Assignment, BackendError>;

    fn bulk_update_hours(&self, updates: &[HoursUpdate]) -> Result<Vec<BulkUpdateResult>, BackendError>;

    /// Cheap row-count probe for the async/sync decision.
    fn estimate_row_count(&self, scope: &ScopeFilters) -> Result<u64, BackendError>;

    fn supports_async_jobs(&self) -> bool;
}
