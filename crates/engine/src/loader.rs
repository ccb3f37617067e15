//! Snapshot acquisition: one synchronous fetch, or a background job polled
//! to completion for large scopes.
//!
//! Any failure on the job path falls back to a single synchronous fetch.
//! Only when that also fails does the load fail.

use std::thread;
use std::time::{Duration, Instant};

use staffgrid_client::{BackendError, GridBackend, JobState, ScopeFilters, Snapshot};

use crate::error::GridError;

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Horizons longer than this go through a job.
    pub async_week_threshold: u32,
    /// Scopes with more people than this go through a job.
    pub async_people_threshold: u64,
    pub poll_interval: Duration,
    /// Polling past this is treated like a failed job.
    pub poll_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            async_week_threshold: 20,
            async_people_threshold: 400,
            poll_interval: Duration::from_millis(1500),
            poll_timeout: Duration::from_secs(300),
        }
    }
}

/// What to load: horizon in weeks plus department scope.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub weeks: u32,
    pub scope: ScopeFilters,
}

impl LoadRequest {
    pub fn new(weeks: u32) -> Self {
        Self { weeks, scope: ScopeFilters::default() }
    }

    pub fn with_scope(mut self, scope: ScopeFilters) -> Self {
        self.scope = scope;
        self
    }
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self::new(12)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionPath {
    Sync,
    Async,
    /// Job path failed; the data came from a direct fetch.
    AsyncFallback,
}

/// An in-flight snapshot job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub job_id: String,
    pub progress: u8,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    /// Waiting on a background job.
    Polling(JobHandle),
    Ready,
    /// Load failed on every path. The grid shows this instead of data.
    Error(String),
}

impl LoadState {
    pub fn job(&self) -> Option<&JobHandle> {
        match self {
            LoadState::Polling(job) => Some(job),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading | LoadState::Polling(_))
    }
}

/// Identifies one load. Only the most recently issued ticket may finish.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub request: LoadRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub snapshot: Snapshot,
    pub path: AcquisitionPath,
    /// Non-fatal problem to show the user (job fell back).
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotLoader {
    config: LoaderConfig,
}

impl SnapshotLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Job path iff the scope is large (long horizon or many people) and the
    /// backend runs jobs. A failed size probe counts as small.
    pub fn choose_path(&self, request: &LoadRequest, backend: &dyn GridBackend) -> AcquisitionPath {
        let long_horizon = request.weeks > self.config.async_week_threshold;
        let many_people = !long_horizon
            && match backend.estimate_row_count(&request.scope) {
                Ok(n) => n > self.config.async_people_threshold,
                Err(e) => {
                    log::warn!("Size probe failed, loading directly: {}", e);
                    false
                }
            };
        if (long_horizon || many_people) && backend.supports_async_jobs() {
            AcquisitionPath::Async
        } else {
            AcquisitionPath::Sync
        }
    }

    /// Obtain a snapshot. `on_progress` sees every job poll; it is never
    /// called on the direct path.
    pub fn acquire(
        &self,
        request: &LoadRequest,
        backend: &dyn GridBackend,
        on_progress: &mut dyn FnMut(&JobHandle),
    ) -> Result<LoadOutcome, GridError> {
        let path = self.choose_path(request, backend);
        log::info!("Loading {} weeks via {:?} path", request.weeks, path);

        if path == AcquisitionPath::Sync {
            let snapshot = self.fetch_direct(request, backend)?;
            return Ok(LoadOutcome { snapshot, path, warning: None });
        }

        match self.run_job(request, backend, on_progress) {
            Ok(snapshot) => Ok(LoadOutcome { snapshot, path, warning: None }),
            Err(reason) => {
                log::warn!("Snapshot job failed, falling back to direct fetch: {}", reason);
                let snapshot = self.fetch_direct(request, backend)?;
                Ok(LoadOutcome {
                    snapshot,
                    path: AcquisitionPath::AsyncFallback,
                    warning: Some(format!("Background load failed ({}); loaded directly instead", reason)),
                })
            }
        }
    }

    fn fetch_direct(&self, request: &LoadRequest, backend: &dyn GridBackend) -> Result<Snapshot, GridError> {
        backend
            .fetch_snapshot(request.weeks, &request.scope)
            .map_err(|e| GridError::SnapshotAcquisition(e.to_string()))
    }

    fn run_job(
        &self,
        request: &LoadRequest,
        backend: &dyn GridBackend,
        on_progress: &mut dyn FnMut(&JobHandle),
    ) -> Result<Snapshot, BackendError> {
        let job_id = backend.submit_snapshot_job(request.weeks, &request.scope)?;
        let mut handle = JobHandle { job_id, progress: 0, message: None };
        on_progress(&handle);

        let started = Instant::now();
        loop {
            let status = backend.poll_job(&handle.job_id)?;
            handle.progress = status.progress.clamp(0.0, 100.0) as u8;
            if status.message.is_some() {
                handle.message = status.message.clone();
            }
            log::debug!("Job {} {:?} {}%", handle.job_id, status.state, handle.progress);
            on_progress(&handle);

            match status.state {
                JobState::Success => return status.snapshot(),
                JobState::Failure => {
                    let error = status.error.unwrap_or_else(|| "job failed".to_string());
                    return Err(BackendError::Validation(error));
                }
                JobState::Pending => {}
            }

            if started.elapsed() >= self.config.poll_timeout {
                return Err(BackendError::Timeout(format!(
                    "job {} did not finish within {}s",
                    handle.job_id,
                    self.config.poll_timeout.as_secs()
                )));
            }
            thread::sleep(self.config.poll_interval);
        }
    }
}
