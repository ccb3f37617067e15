//! HTTP implementation of [`GridBackend`].
//!
//! Blocking reqwest client (no Tokio runtime required). Bearer auth, JSON
//! bodies, and one `X-Request-Id` per write so server logs can correlate
//! a bulk edit with its rows.

use std::sync::OnceLock;
use std::time::Duration;

use staffgrid_core::{Assignment, AssignmentId, PersonId, ProjectId, WeeklyHours};

use crate::auth::{load_auth, AuthCredentials};
use crate::backend::{
    BackendError, BulkUpdateResult, GridBackend, HoursUpdate, JobStatus, ScopeFilters, Snapshot,
};

const USER_AGENT: &str = concat!("sgrid/", env!("CARGO_PKG_VERSION"));

/// Assignment API client (blocking).
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
    async_jobs: OnceLock<bool>,
}

/// User info from /api/auth/me/
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct UserInfo {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl HttpBackend {
    /// Create a new client using saved auth credentials.
    pub fn from_saved_auth() -> Result<Self, BackendError> {
        let creds = load_auth().ok_or(BackendError::NotAuthenticated)?;
        Self::new(creds, Duration::from_secs(60))
    }

    /// Create a new client with explicit credentials.
    pub fn new(creds: AuthCredentials, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: creds.api_base.trim_end_matches('/').to_string(),
            token: creds.token,
            async_jobs: OnceLock::new(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Verify the current token and get user info.
    pub fn verify_token(&self) -> Result<UserInfo, BackendError> {
        let url = format!("{}/api/auth/me/", self.api_base);
        let resp = self.send(self.http.get(&url))?;
        resp.json::<UserInfo>().map_err(|e| BackendError::Parse(e.to_string()))
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn send(&self, req: reqwest::blocking::RequestBuilder) -> Result<reqwest::blocking::Response, BackendError> {
        let response = req
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match status {
                400 | 422 => BackendError::Validation(body),
                404 => BackendError::NotFound(body),
                _ => BackendError::Http(status, body),
            });
        }

        Ok(response)
    }

    fn write(&self, req: reqwest::blocking::RequestBuilder) -> Result<reqwest::blocking::Response, BackendError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        log::debug!("write request {}", request_id);
        self.send(req.header("X-Request-Id", request_id))
    }

    fn json<T: serde::de::DeserializeOwned>(resp: reqwest::blocking::Response) -> Result<T, BackendError> {
        resp.json::<T>().map_err(|e| BackendError::Parse(e.to_string()))
    }

    fn fetch_capability(&self) -> bool {
        let url = format!("{}/api/capabilities/", self.api_base);
        let json: serde_json::Value = match self.send(self.http.get(&url)).and_then(Self::json) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("capability probe failed, assuming no async jobs: {}", e);
                return false;
            }
        };
        json["async_jobs"].as_bool()
            .or_else(|| json["asyncJobs"].as_bool())
            .unwrap_or(false)
    }
}

impl GridBackend for HttpBackend {
    fn fetch_snapshot(&self, weeks: u32, scope: &ScopeFilters) -> Result<Snapshot, BackendError> {
        let url = format!("{}/api/assignments/grid_snapshot/", self.api_base);
        let req = self.http.get(&url)
            .query(&[("weeks", weeks.to_string())])
            .query(&scope.query_pairs());
        Self::json(self.send(req)?)
    }

    fn submit_snapshot_job(&self, weeks: u32, scope: &ScopeFilters) -> Result<String, BackendError> {
        let url = format!("{}/api/assignments/grid_snapshot_async/", self.api_base);
        let body = serde_json::json!({
            "weeks": weeks,
            "department": scope.department,
            "include_children": scope.include_children,
        });
        let json: serde_json::Value = Self::json(self.write(self.http.post(&url).json(&body))?)?;
        json_str(&json, "job_id")
    }

    fn poll_job(&self, job_id: &str) -> Result<JobStatus, BackendError> {
        let url = format!("{}/api/jobs/{}/", self.api_base, job_id);
        Self::json(self.send(self.http.get(&url))?)
    }

    fn fetch_row_detail(&self, person_id: PersonId) -> Result<Vec<Assignment>, BackendError> {
        let url = format!("{}/api/assignments/by_person/{}/", self.api_base, person_id);
        let json: serde_json::Value = Self::json(self.send(self.http.get(&url))?)?;
        // Plain list, or a paginated envelope
        let items = if json.is_array() { json } else { json["results"].clone() };
        serde_json::from_value(items).map_err(|e| BackendError::Parse(e.to_string()))
    }

    fn create_row(&self, person_id: PersonId, project_id: ProjectId) -> Result<Assignment, BackendError> {
        let url = format!("{}/api/assignments/", self.api_base);
        let body = serde_json::json!({
            "person": person_id,
            "project": project_id,
            "weekly_hours": {},
        });
        Self::json(self.write(self.http.post(&url).json(&body))?)
    }

    fn delete_row(&self, assignment_id: AssignmentId) -> Result<(), BackendError> {
        let url = format!("{}/api/assignments/{}/", self.api_base, assignment_id);
        self.write(self.http.delete(&url))?;
        Ok(())
    }

    fn update_row_hours(
        &self,
        assignment_id: AssignmentId,
        weekly_hours: &WeeklyHours,
    ) -> Result<Assignment, BackendError> {
        let url = format!("{}/api/assignments/{}/", self.api_base, assignment_id);
        let body = serde_json::json!({ "weekly_hours": weekly_hours });
        Self::json(self.write(self.http.patch(&url).json(&body))?)
    }

    fn bulk_update_hours(&self, updates: &[HoursUpdate]) -> Result<Vec<BulkUpdateResult>, BackendError> {
        let url = format!("{}/api/assignments/bulk_update_hours/", self.api_base);
        let body = serde_json::json!({ "updates": updates });
        let json: serde_json::Value = Self::json(self.write(self.http.patch(&url).json(&body))?)?;
        let results = json.get("results")
            .cloned()
            .ok_or_else(|| BackendError::Parse("Missing results in response".into()))?;
        serde_json::from_value(results).map_err(|e| BackendError::Parse(e.to_string()))
    }

    fn estimate_row_count(&self, scope: &ScopeFilters) -> Result<u64, BackendError> {
        let url = format!("{}/api/people/", self.api_base);
        let req = self.http.get(&url)
            .query(&[("page_size", "1")])
            .query(&scope.query_pairs());
        let json: serde_json::Value = Self::json(self.send(req)?)?;
        if let Some(items) = json.as_array() {
            return Ok(items.len() as u64);
        }
        json["count"].as_u64()
            .ok_or_else(|| BackendError::Parse("Missing count in response".into()))
    }

    fn supports_async_jobs(&self) -> bool {
        *self.async_jobs.get_or_init(|| self.fetch_capability())
    }
}

// ── Free functions ──────────────────────────────────────────────────

fn json_str(json: &serde_json::Value, key: &str) -> Result<String, BackendError> {
    json[key].as_i64()
        .map(|n| n.to_string())
        .or_else(|| json[key].as_str().map(String::from))
        .ok_or_else(|| BackendError::Parse(format!("Missing {} in response", key)))
}
