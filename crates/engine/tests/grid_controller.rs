//! GridController driven end to end against an in-memory backend.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use staffgrid_client::{
    BackendError, BulkUpdateResult, GridBackend, HoursUpdate, JobState, JobStatus, PersonSummary,
    ProjectInfo, ScopeFilters, Snapshot,
};
use staffgrid_core::{
    AggregateTotals, Assignment, AssignmentId, CellRef, PersonId, ProjectId, WeekKey, WeeklyHours,
};
use staffgrid_engine::events::notices;
use staffgrid_engine::{
    AcquisitionPath, Direction, GridController, GridError, GridEvent, GridInput, Key, LoadOutcome,
    LoadRequest, LoadState, LoaderConfig, NoticeLevel, StatusFilter,
};

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

struct FakeBackend {
    snapshot: RefCell<Snapshot>,
    stored: RefCell<BTreeMap<AssignmentId, Assignment>>,
    people_count: u64,
    async_jobs: bool,
    polls: RefCell<VecDeque<JobStatus>>,
    fail_writes: Vec<AssignmentId>,
    snapshot_down: bool,
    next_id: Cell<AssignmentId>,
    calls: RefCell<Vec<String>>,
}

impl FakeBackend {
    fn new(snapshot: Snapshot) -> Self {
        let stored = snapshot.rows.iter().map(|a| (a.id, a.clone())).collect();
        Self {
            snapshot: RefCell::new(snapshot),
            stored: RefCell::new(stored),
            people_count: 10,
            async_jobs: false,
            polls: RefCell::new(VecDeque::new()),
            fail_writes: Vec::new(),
            snapshot_down: false,
            next_id: Cell::new(1000),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Rows the server knows about but the snapshot leaves out.
    fn with_detail(self, rows: Vec<Assignment>) -> Self {
        for row in rows {
            self.stored.borrow_mut().insert(row.id, row);
        }
        self
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn calls(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl GridBackend for FakeBackend {
    fn fetch_snapshot(&self, weeks: u32, _: &ScopeFilters) -> Result<Snapshot, BackendError> {
        self.log(format!("fetch_snapshot {}", weeks));
        if self.snapshot_down {
            return Err(BackendError::Http(502, "bad gateway".into()));
        }
        Ok(self.snapshot.borrow().clone())
    }

    fn submit_snapshot_job(&self, _: u32, _: &ScopeFilters) -> Result<String, BackendError> {
        self.log("submit_snapshot_job");
        Ok("job-7".into())
    }

    fn poll_job(&self, job_id: &str) -> Result<JobStatus, BackendError> {
        self.log(format!("poll_job {}", job_id));
        self.polls
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| BackendError::Network("no more polls scripted".into()))
    }

    fn fetch_row_detail(&self, person_id: PersonId) -> Result<Vec<Assignment>, BackendError> {
        self.log(format!("fetch_row_detail {}", person_id));
        Ok(self.stored.borrow().values().filter(|a| a.person_id == person_id).cloned().collect())
    }

    fn create_row(&self, person_id: PersonId, project_id: ProjectId) -> Result<Assignment, BackendError> {
        self.log(format!("create_row {} {}", person_id, project_id));
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let row = Assignment::new(id, person_id, project_id);
        self.stored.borrow_mut().insert(id, row.clone());
        Ok(row)
    }

    fn delete_row(&self, assignment_id: AssignmentId) -> Result<(), BackendError> {
        self.log(format!("delete_row {}", assignment_id));
        if self.fail_writes.contains(&assignment_id) {
            return Err(BackendError::Http(500, "delete failed".into()));
        }
        self.stored
            .borrow_mut()
            .remove(&assignment_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("assignment {}", assignment_id)))
    }

    fn update_row_hours(
        &self,
        assignment_id: AssignmentId,
        weekly_hours: &WeeklyHours,
    ) -> Result<Assignment, BackendError> {
        self.log(format!("update_row_hours {}", assignment_id));
        if self.fail_writes.contains(&assignment_id) {
            return Err(BackendError::Validation("assignment is locked".into()));
        }
        let mut stored = self.stored.borrow_mut();
        let row = stored
            .get_mut(&assignment_id)
            .ok_or_else(|| BackendError::NotFound(format!("assignment {}", assignment_id)))?;
        row.weekly_hours = weekly_hours.clone();
        Ok(row.clone())
    }

    fn bulk_update_hours(&self, updates: &[HoursUpdate]) -> Result<Vec<BulkUpdateResult>, BackendError> {
        self.log(format!("bulk_update_hours {}", updates.len()));
        let mut stored = self.stored.borrow_mut();
        Ok(updates
            .iter()
            .map(|u| {
                if self.fail_writes.contains(&u.assignment_id) {
                    return BulkUpdateResult::failed(u.assignment_id, "assignment is locked");
                }
                match stored.get_mut(&u.assignment_id) {
                    Some(row) => {
                        row.weekly_hours = u.weekly_hours.clone();
                        BulkUpdateResult::ok(u.assignment_id)
                    }
                    None => BulkUpdateResult::failed(u.assignment_id, "not found"),
                }
            })
            .collect())
    }

    fn estimate_row_count(&self, _: &ScopeFilters) -> Result<u64, BackendError> {
        self.log("estimate_row_count");
        Ok(self.people_count)
    }

    fn supports_async_jobs(&self) -> bool {
        self.async_jobs
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn w(s: &str) -> WeekKey {
    WeekKey::from(s)
}

fn weeks(keys: &[&str]) -> Vec<WeekKey> {
    keys.iter().map(|k| w(k)).collect()
}

fn person(id: PersonId, name: &str) -> PersonSummary {
    PersonSummary { id, name: name.into() }
}

/// Three weeks; person 7 with rows 42 and 43, person 9 with row 50,
/// person 11 collapsed with backend totals only.
fn team_snapshot() -> Snapshot {
    let mut totals = AggregateTotals::new();
    totals.set(11, w("2024-01-01"), 40.0);
    Snapshot {
        week_keys: weeks(&["2024-01-01", "2024-01-08", "2024-01-15"]),
        people: vec![person(7, "Ada Park"), person(9, "Sam Ortiz"), person(11, "Lee Chen")],
        rows: vec![
            Assignment::new(42, 7, 1).with_hours([("2024-01-01", 10.0), ("2024-01-08", 5.0)]),
            Assignment::new(43, 7, 2).with_hours([("2024-01-01", 4.0)]),
            Assignment::new(50, 9, 1).with_hours([("2024-01-08", 20.0)]),
        ],
        projects: vec![
            ProjectInfo { id: 1, name: "Harbor Retrofit".into(), status: Some("active".into()) },
            ProjectInfo { id: 2, name: "Depot Study".into(), status: Some("planning".into()) },
        ],
        totals,
    }
}

fn fast_config() -> LoaderConfig {
    LoaderConfig { poll_interval: Duration::ZERO, ..LoaderConfig::default() }
}

fn loaded(backend: &FakeBackend) -> GridController {
    let mut grid = GridController::new(fast_config(), 168.0);
    grid.load(LoadRequest::new(3), backend).unwrap();
    grid.drain_events();
    grid
}

fn key(ch: char) -> GridInput {
    GridInput::Key(Key::Char(ch))
}

fn enter() -> GridInput {
    GridInput::Key(Key::Enter)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_derives_missing_totals() {
    let snapshot = Snapshot {
        week_keys: weeks(&["2024-01-01", "2024-01-08"]),
        rows: vec![Assignment::new(42, 7, 1).with_hours([("2024-01-01", 10.0)])],
        ..Snapshot::default()
    };
    let backend = FakeBackend::new(snapshot);
    let grid = loaded(&backend);

    assert_eq!(grid.total(7, &w("2024-01-01")), 10.0);
    assert_eq!(grid.total(7, &w("2024-01-08")), 0.0);
    assert_eq!(grid.load_state(), &LoadState::Ready);
}

#[test]
fn test_backend_totals_take_precedence() {
    let mut snapshot = team_snapshot();
    snapshot.totals.set(7, w("2024-01-01"), 99.0);
    let backend = FakeBackend::new(snapshot);
    let grid = loaded(&backend);

    assert_eq!(grid.total(7, &w("2024-01-01")), 99.0);
    // Not supplied, derived from rows 42 + 43
    assert_eq!(grid.total(7, &w("2024-01-08")), 5.0);
    // Collapsed person keeps backend totals only
    assert_eq!(grid.total(11, &w("2024-01-01")), 40.0);
    assert_eq!(grid.total(11, &w("2024-01-08")), 0.0);
}

#[test]
fn test_large_scope_job_failure_falls_back() {
    let mut backend = FakeBackend::new(team_snapshot());
    backend.people_count = 500;
    backend.async_jobs = true;
    *backend.polls.borrow_mut() = VecDeque::from(vec![
        JobStatus::pending(25.0),
        JobStatus {
            state: JobState::Failure,
            progress: 60.0,
            message: None,
            result: None,
            error: Some("worker lost".into()),
        },
    ]);

    let mut grid = GridController::new(fast_config(), 168.0);
    grid.load(LoadRequest::new(12), &backend).unwrap();

    assert_eq!(backend.calls("submit_snapshot_job"), 1);
    assert_eq!(backend.calls("poll_job"), 2);
    assert_eq!(backend.calls("fetch_snapshot"), 1);
    assert_eq!(grid.load_state(), &LoadState::Ready);
    assert_eq!(grid.axis().len(), 3);

    let events = grid.drain_events();
    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            GridEvent::LoadProgress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![0, 25, 60]);
    let ns = notices(&events);
    assert_eq!(ns.len(), 1);
    assert_eq!(ns[0].level, NoticeLevel::Warning);
    assert!(events.contains(&GridEvent::Loaded { generation: 1, path: AcquisitionPath::AsyncFallback }));
}

#[test]
fn test_large_scope_job_success() {
    let mut backend = FakeBackend::new(Snapshot::default());
    backend.people_count = 500;
    backend.async_jobs = true;
    let payload = serde_json::to_value(team_snapshot()).unwrap();
    *backend.polls.borrow_mut() = VecDeque::from(vec![JobStatus {
        state: JobState::Success,
        progress: 100.0,
        message: Some("ready".into()),
        result: Some(payload),
        error: None,
    }]);

    let mut grid = GridController::new(fast_config(), 168.0);
    grid.load(LoadRequest::new(12), &backend).unwrap();

    assert_eq!(backend.calls("fetch_snapshot"), 0);
    assert_eq!(grid.rows().len(), 3);
    assert!(grid.load_state().job().is_none());
    assert!(notices(grid.events()).is_empty());
}

#[test]
fn test_load_failure_sets_error_state() {
    let mut backend = FakeBackend::new(team_snapshot());
    backend.snapshot_down = true;
    let mut grid = GridController::new(fast_config(), 168.0);

    let err = grid.load(LoadRequest::new(4), &backend).unwrap_err();
    assert!(matches!(err, GridError::SnapshotAcquisition(_)));
    assert!(matches!(grid.load_state(), LoadState::Error(msg) if msg.contains("502")));
}

#[test]
fn test_stale_load_is_ignored() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = GridController::new(fast_config(), 168.0);

    let first = grid.begin_load(LoadRequest::new(12));
    let second = grid.begin_load(LoadRequest::new(2));

    let newer = Snapshot { week_keys: weeks(&["2024-03-04", "2024-03-11"]), ..Snapshot::default() };
    let applied = grid
        .finish_load(second, Ok(LoadOutcome { snapshot: newer, path: AcquisitionPath::Sync, warning: None }))
        .unwrap();
    assert!(applied);

    let older = backend.fetch_snapshot(12, &ScopeFilters::default()).unwrap();
    let applied = grid
        .finish_load(first, Ok(LoadOutcome { snapshot: older, path: AcquisitionPath::Sync, warning: None }))
        .unwrap();
    assert!(!applied);
    assert_eq!(grid.axis().keys(), weeks(&["2024-03-04", "2024-03-11"]).as_slice());
    assert_eq!(grid.request().weeks, 2);
}

#[test]
fn test_stale_failure_does_not_clobber_ready_state() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let stale = grid.begin_load(LoadRequest::new(3));
    grid.reload(&backend).unwrap();

    let applied = grid.finish_load(stale, Err(GridError::SnapshotAcquisition("late".into()))).unwrap();
    assert!(!applied);
    assert_eq!(grid.load_state(), &LoadState::Ready);
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn test_type_then_enter_writes_and_advances() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);

    grid.handle_input(GridInput::Click(CellRef::new(7, 42, "2024-01-08")), &backend).unwrap();
    grid.handle_input(key('3'), &backend).unwrap();
    assert!(grid.edit().is_editing());
    grid.handle_input(enter(), &backend).unwrap();

    assert!(!grid.edit().is_editing());
    assert_eq!(grid.hours(&CellRef::new(7, 42, "2024-01-08")), 3.0);
    assert_eq!(grid.selection().selected_cell(), Some(&CellRef::new(7, 42, "2024-01-15")));
    assert_eq!(backend.calls("update_row_hours 42"), 1);
    assert_eq!(backend.stored.borrow()[&42].hours(&w("2024-01-08")), 3.0);
    assert_eq!(grid.total(7, &w("2024-01-08")), 3.0);
    assert_eq!(grid.drain_events(), vec![GridEvent::AnalyticsInvalidated]);
}

#[test]
fn test_commit_on_last_week_keeps_cell() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let last = CellRef::new(9, 50, "2024-01-15");

    grid.handle_input(GridInput::DoubleClick(last.clone()), &backend).unwrap();
    assert_eq!(grid.edit().current().unwrap().raw, "0");
    grid.update_edit("12.5");
    grid.handle_input(GridInput::Blur, &backend).unwrap();

    assert_eq!(grid.hours(&last), 12.5);
    assert_eq!(grid.selection().selected_cell(), Some(&last));
}

#[test]
fn test_input_is_sanitized() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let cell = CellRef::new(7, 43, "2024-01-01");

    grid.handle_input(GridInput::Click(cell.clone()), &backend).unwrap();
    for ch in "200".chars() {
        grid.handle_input(key(ch), &backend).unwrap();
    }
    grid.handle_input(enter(), &backend).unwrap();
    assert_eq!(grid.hours(&cell), 168.0);

    grid.handle_input(GridInput::Click(cell.clone()), &backend).unwrap();
    grid.handle_input(GridInput::Key(Key::Enter), &backend).unwrap();
    grid.update_edit("abc");
    grid.handle_input(enter(), &backend).unwrap();
    assert_eq!(grid.hours(&cell), 0.0);
}

#[test]
fn test_escape_cancels_without_write() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let cell = CellRef::new(7, 42, "2024-01-01");

    grid.handle_input(GridInput::Click(cell.clone()), &backend).unwrap();
    grid.handle_input(key('7'), &backend).unwrap();
    grid.handle_input(GridInput::Key(Key::Escape), &backend).unwrap();

    assert!(!grid.edit().is_editing());
    assert_eq!(grid.hours(&cell), 10.0);
    assert_eq!(backend.calls("update_row_hours"), 0);
    assert_eq!(grid.selection().selected_cell(), Some(&cell));
}

#[test]
fn test_failed_single_commit_rolls_back_cell() {
    let mut backend = FakeBackend::new(team_snapshot());
    backend.fail_writes = vec![42];
    let mut grid = loaded(&backend);
    let cell = CellRef::new(7, 42, "2024-01-08");

    grid.handle_input(GridInput::Click(cell.clone()), &backend).unwrap();
    grid.handle_input(key('9'), &backend).unwrap();
    grid.handle_input(enter(), &backend).unwrap();

    assert!(!grid.edit().is_editing());
    assert_eq!(grid.hours(&cell), 5.0);
    assert_eq!(grid.total(7, &w("2024-01-08")), 5.0);
    // No advance on failure
    assert_eq!(grid.selection().selected_cell(), Some(&cell));
    let events = grid.drain_events();
    let ns = notices(&events);
    assert_eq!(ns.len(), 1);
    assert_eq!(ns[0].message, "Failed to update 1 assignment");
    assert!(!events.contains(&GridEvent::AnalyticsInvalidated));
}

#[test]
fn test_drag_range_commit_is_one_row_write() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);

    grid.handle_input(GridInput::MouseDown(CellRef::new(7, 43, "2024-01-15")), &backend).unwrap();
    grid.handle_input(GridInput::MouseEnter(CellRef::new(7, 43, "2024-01-08")), &backend).unwrap();
    grid.handle_input(GridInput::MouseEnter(CellRef::new(7, 43, "2024-01-01")), &backend).unwrap();
    grid.handle_input(GridInput::MouseUp, &backend).unwrap();
    assert_eq!(grid.selection().cells().len(), 3);

    grid.handle_input(enter(), &backend).unwrap();
    grid.update_edit("6");
    grid.handle_input(enter(), &backend).unwrap();

    for week in ["2024-01-01", "2024-01-08", "2024-01-15"] {
        assert_eq!(grid.hours(&CellRef::new(7, 43, week)), 6.0);
    }
    assert_eq!(backend.calls("update_row_hours 43"), 1);
    assert_eq!(backend.calls("bulk_update_hours"), 0);
    assert!(!grid.selection().is_multi());
}

#[test]
fn test_shift_click_other_row_is_noop() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);

    grid.handle_input(GridInput::Click(CellRef::new(7, 42, "2024-01-01")), &backend).unwrap();
    grid.handle_input(GridInput::ShiftClick(CellRef::new(7, 43, "2024-01-15")), &backend).unwrap();
    assert_eq!(grid.selection().selected_cell(), Some(&CellRef::new(7, 42, "2024-01-01")));

    grid.handle_input(GridInput::ShiftClick(CellRef::new(7, 42, "2024-01-15")), &backend).unwrap();
    assert_eq!(grid.selection().cells().len(), 3);
}

#[test]
fn test_arrow_keys() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let arrow = |dir, shift| GridInput::Key(Key::Arrow { dir, shift });

    grid.handle_input(GridInput::Click(CellRef::new(7, 42, "2024-01-01")), &backend).unwrap();
    grid.handle_input(arrow(Direction::Right, true), &backend).unwrap();
    assert_eq!(grid.selection().cells().len(), 2);

    grid.handle_input(arrow(Direction::Down, false), &backend).unwrap();
    assert_eq!(grid.selection().selected_cell(), Some(&CellRef::new(7, 43, "2024-01-08")));

    grid.handle_input(arrow(Direction::Down, false), &backend).unwrap();
    assert_eq!(grid.selection().selected_cell(), Some(&CellRef::new(9, 50, "2024-01-08")));

    // Shift+vertical never builds a cross-row range
    grid.handle_input(arrow(Direction::Up, true), &backend).unwrap();
    assert_eq!(grid.selection().selected_cell(), Some(&CellRef::new(9, 50, "2024-01-08")));

    grid.handle_input(arrow(Direction::Left, false), &backend).unwrap();
    assert_eq!(grid.selection().selected_cell(), Some(&CellRef::new(9, 50, "2024-01-01")));
}

// ---------------------------------------------------------------------------
// Bulk writes
// ---------------------------------------------------------------------------

#[test]
fn test_bulk_partial_failure_rolls_back_failed_group() {
    let mut backend = FakeBackend::new(team_snapshot());
    backend.fail_writes = vec![50];
    let mut grid = loaded(&backend);

    let targets = vec![CellRef::new(7, 42, "2024-01-08"), CellRef::new(9, 50, "2024-01-08")];
    let report = grid.apply_hours(&targets, 16.0, &backend);

    assert_eq!(report.committed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(backend.calls("bulk_update_hours 2"), 1);
    assert_eq!(backend.calls("update_row_hours"), 0);

    let a = grid.rows().assignment(42).unwrap();
    assert_eq!(a.hours(&w("2024-01-08")), 16.0);
    let b = grid.rows().assignment(50).unwrap();
    assert_eq!(b.weekly_hours, team_snapshot().rows[2].weekly_hours);
    assert_eq!(grid.total(9, &w("2024-01-08")), 20.0);
    assert_eq!(grid.total(7, &w("2024-01-08")), 16.0);

    let events = grid.drain_events();
    let ns = notices(&events);
    assert_eq!(ns.len(), 1);
    assert_eq!(ns[0].level, NoticeLevel::Error);
    assert_eq!(ns[0].message, "Failed to update 1 assignment");
    assert!(events.contains(&GridEvent::AnalyticsInvalidated));
}

#[test]
fn test_interleaved_writes_last_settle_wins() {
    let mut backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let cell = CellRef::new(7, 42, "2024-01-01");

    let first = grid.prepare_hours(&[cell.clone()], 5.0);
    let second = grid.prepare_hours(&[cell.clone()], 7.0);
    assert_eq!(grid.hours(&cell), 7.0);

    let first = staffgrid_engine::bulk::dispatch(first, &backend);
    backend.fail_writes = vec![42];
    let second = staffgrid_engine::bulk::dispatch(second, &backend);

    grid.settle_hours(first);
    grid.settle_hours(second);
    // The second write failed and restored what it saw: the first write's value
    assert_eq!(grid.hours(&cell), 5.0);
    assert_eq!(backend.stored.borrow()[&42].hours(&w("2024-01-01")), 5.0);
}

#[test]
fn test_hours_are_clamped_on_direct_apply() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);
    let cell = CellRef::new(9, 50, "2024-01-01");
    grid.apply_hours(&[cell.clone()], -3.0, &backend);
    assert_eq!(grid.hours(&cell), 0.0);
    grid.apply_hours(&[cell.clone()], 500.0, &backend);
    assert_eq!(grid.hours(&cell), 168.0);
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[test]
fn test_expand_fetches_once() {
    let backend = FakeBackend::new(team_snapshot())
        .with_detail(vec![Assignment::new(60, 11, 2).with_hours([("2024-01-08", 8.0)])]);
    let mut grid = loaded(&backend);

    assert!(!grid.rows().person(11).unwrap().is_loaded());
    assert!(grid.expand_person(11, &backend).unwrap());
    assert!(!grid.expand_person(11, &backend).unwrap());
    assert_eq!(backend.calls("fetch_row_detail 11"), 1);

    assert_eq!(grid.rows().rows_for(11).len(), 1);
    // Backend total kept, missing week derived
    assert_eq!(grid.total(11, &w("2024-01-01")), 40.0);
    assert_eq!(grid.total(11, &w("2024-01-08")), 8.0);

    grid.refresh_person(11, &backend).unwrap();
    assert_eq!(backend.calls("fetch_row_detail 11"), 2);
    assert!(matches!(grid.expand_person(99, &backend), Err(GridError::NotFound(_))));
}

#[test]
fn test_assign_and_remove() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);

    let id = grid.assign_project(9, 2, &backend).unwrap();
    assert_eq!(grid.rows().rows_for(9).len(), 2);
    assert_eq!(grid.rows().owner_of(id), Some(9));

    grid.handle_input(GridInput::Click(CellRef::new(9, 50, "2024-01-08")), &backend).unwrap();
    grid.handle_input(key('1'), &backend).unwrap();
    grid.remove_assignment(50, &backend).unwrap();

    assert!(grid.rows().assignment(50).is_none());
    assert!(grid.selection().is_empty());
    assert!(!grid.edit().is_editing());
    assert_eq!(grid.total(9, &w("2024-01-08")), 0.0);
    assert_eq!(
        grid.drain_events(),
        vec![GridEvent::AnalyticsInvalidated, GridEvent::AnalyticsInvalidated]
    );

    assert!(matches!(grid.remove_assignment(50, &backend), Err(GridError::NotFound(_))));
    assert!(matches!(grid.assign_project(404, 1, &backend), Err(GridError::NotFound(_))));
}

#[test]
fn test_failed_remove_keeps_row() {
    let mut backend = FakeBackend::new(team_snapshot());
    backend.fail_writes = vec![43];
    let mut grid = loaded(&backend);

    let err = grid.remove_assignment(43, &backend).unwrap_err();
    assert!(matches!(err, GridError::RemoteWrite(BackendError::Http(500, _))));
    assert!(grid.rows().assignment(43).is_some());
    assert_eq!(notices(grid.events()).len(), 1);
}

#[test]
fn test_status_filter_and_fallback() {
    let backend = FakeBackend::new(team_snapshot());
    let mut grid = loaded(&backend);

    grid.set_status_filter(StatusFilter::only(["planning"]));
    let visible = grid.visible_rows();
    let ids: Vec<PersonId> = visible.iter().map(|r| r.person_id).collect();
    assert_eq!(ids, vec![7, 11]);
    assert_eq!(visible[0].assignments, vec![43]);

    // Project 3 is unknown to the snapshot: filter can't be computed
    grid.assign_project(9, 3, &backend).unwrap();
    let visible = grid.visible_rows();
    assert_eq!(visible.len(), 3);
    assert_eq!(visible[1].assignments.len(), 2);
}
