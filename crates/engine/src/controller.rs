//! GridController: the one owner of grid state.
//!
//! Holds the week axis, rows, totals, selection, open edit and load state,
//! and routes input to them. Remote calls go through a `&dyn GridBackend`
//! passed per call; the controller never holds a backend itself.
//!
//! Writes and loads are also exposed in split form (`prepare_hours` /
//! `settle_hours`, `begin_load` / `finish_load`) so a host can run the
//! network leg elsewhere and keep handling input meanwhile.

use rustc_hash::FxHashMap;
use staffgrid_client::{GridBackend, ProjectInfo, Snapshot};
use staffgrid_core::{
    clamp_hours, is_entry_char, resolve_commit_scope, sanitize_hours, AggregateTotals, AssignmentId,
    CellRef, CommitScope, EditSession, PersonId, ProjectId, SelectionModel, WeekAxis, WeekKey,
    DEFAULT_HOURS_CAP,
};

use crate::bulk::{self, BulkReport, DispatchedBulk, PendingBulk};
use crate::error::GridError;
use crate::events::{EventQueue, GridEvent};
use crate::filter::{self, StatusFilter, VisibleRow};
use crate::input::{GridInput, Key};
use crate::loader::{
    JobHandle, LoadOutcome, LoadRequest, LoadState, LoadTicket, LoaderConfig, SnapshotLoader,
};
use crate::rows::RowStore;

#[derive(Debug)]
pub struct GridController {
    axis: WeekAxis,
    rows: RowStore,
    totals: AggregateTotals,
    projects: FxHashMap<ProjectId, ProjectInfo>,
    status_filter: StatusFilter,
    selection: SelectionModel,
    edit: EditSession,
    loader: SnapshotLoader,
    load_state: LoadState,
    /// Bumped by every `begin_load`; only the latest ticket may finish.
    generation: u64,
    request: LoadRequest,
    hours_cap: f64,
    events: EventQueue,
}

impl Default for GridController {
    fn default() -> Self {
        Self::new(LoaderConfig::default(), DEFAULT_HOURS_CAP)
    }
}

impl GridController {
    pub fn new(loader: LoaderConfig, hours_cap: f64) -> Self {
        Self {
            axis: WeekAxis::default(),
            rows: RowStore::new(),
            totals: AggregateTotals::new(),
            projects: FxHashMap::default(),
            status_filter: StatusFilter::all(),
            selection: SelectionModel::new(),
            edit: EditSession::new(),
            loader: SnapshotLoader::new(loader),
            load_state: LoadState::Idle,
            generation: 0,
            request: LoadRequest::default(),
            hours_cap,
            events: EventQueue::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn axis(&self) -> &WeekAxis {
        &self.axis
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn totals(&self) -> &AggregateTotals {
        &self.totals
    }

    pub fn total(&self, person: PersonId, week: &WeekKey) -> f64 {
        self.totals.get(person, week)
    }

    /// Hours in one cell; unknown rows and unset weeks read as zero.
    pub fn hours(&self, cell: &CellRef) -> f64 {
        self.rows.find(&cell.row_key()).map_or(0.0, |a| a.hours(&cell.week))
    }

    pub fn project(&self, id: ProjectId) -> Option<&ProjectInfo> {
        self.projects.get(&id)
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn loader(&self) -> &SnapshotLoader {
        &self.loader
    }

    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hours_cap(&self) -> f64 {
        self.hours_cap
    }

    pub fn events(&self) -> &[GridEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Start a load. Any load still in flight becomes stale.
    pub fn begin_load(&mut self, request: LoadRequest) -> LoadTicket {
        self.generation += 1;
        self.request = request.clone();
        self.load_state = LoadState::Loading;
        LoadTicket { generation: self.generation, request }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Job progress for `ticket`. Ignored once the ticket is stale.
    pub fn record_progress(&mut self, ticket: &LoadTicket, job: &JobHandle) {
        if !self.is_current(ticket) {
            return;
        }
        self.load_state = LoadState::Polling(job.clone());
        self.events.push(GridEvent::LoadProgress { progress: job.progress, message: job.message.clone() });
    }

    /// Apply the result of `ticket`'s acquisition. Returns `Ok(false)` when
    /// the ticket was superseded and nothing changed.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadOutcome, GridError>,
    ) -> Result<bool, GridError> {
        if !self.is_current(&ticket) {
            log::debug!("Dropping stale load {} (current {})", ticket.generation, self.generation);
            return Ok(false);
        }
        match result {
            Ok(outcome) => {
                self.apply_snapshot(outcome.snapshot);
                self.load_state = LoadState::Ready;
                if let Some(warning) = outcome.warning {
                    self.events.warn(warning);
                }
                log::info!(
                    "Loaded {} weeks, {} people ({:?})",
                    self.axis.len(),
                    self.rows.len(),
                    outcome.path
                );
                self.events.push(GridEvent::Loaded { generation: ticket.generation, path: outcome.path });
                Ok(true)
            }
            Err(e) => {
                log::error!("Load failed: {}", e);
                self.load_state = LoadState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// begin_load, acquire, finish_load in one call.
    pub fn load(&mut self, request: LoadRequest, backend: &dyn GridBackend) -> Result<(), GridError> {
        let ticket = self.begin_load(request);
        let loader = self.loader.clone();
        let result = loader.acquire(&ticket.request, backend, &mut |job| self.record_progress(&ticket, job));
        self.finish_load(ticket, result).map(|_| ())
    }

    pub fn reload(&mut self, backend: &dyn GridBackend) -> Result<(), GridError> {
        self.load(self.request.clone(), backend)
    }

    /// Change the horizon and reload.
    pub fn set_weeks(&mut self, weeks: u32, backend: &dyn GridBackend) -> Result<(), GridError> {
        let request = LoadRequest { weeks, ..self.request.clone() };
        self.load(request, backend)
    }

    /// Change the department scope and reload.
    pub fn set_scope(
        &mut self,
        scope: staffgrid_client::ScopeFilters,
        backend: &dyn GridBackend,
    ) -> Result<(), GridError> {
        let request = LoadRequest { scope, ..self.request.clone() };
        self.load(request, backend)
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let Snapshot { week_keys, people, rows, projects, totals } = snapshot;
        self.axis = WeekAxis::new(week_keys);
        self.rows = RowStore::from_snapshot(&people, rows);
        self.totals = totals;
        for person in self.rows.people() {
            if person.is_loaded() {
                self.totals.derive_missing(person.person_id, &self.axis, &person.assignments);
            }
        }
        self.projects = projects.into_iter().map(|p| (p.id, p)).collect();
        self.selection.clear();
        self.edit.cancel();
    }

    // ── Person detail ────────────────────────────────────────────────

    /// Load a collapsed person's assignments. Returns whether a fetch ran.
    pub fn expand_person(&mut self, person: PersonId, backend: &dyn GridBackend) -> Result<bool, GridError> {
        match self.rows.person(person) {
            None => Err(GridError::NotFound(format!("person {}", person))),
            Some(p) if p.is_loaded() => Ok(false),
            Some(_) => self.refresh_person(person, backend).map(|_| true),
        }
    }

    /// Re-fetch a person's assignments even if already loaded.
    pub fn refresh_person(&mut self, person: PersonId, backend: &dyn GridBackend) -> Result<(), GridError> {
        let detail = backend.fetch_row_detail(person).map_err(|e| {
            self.events.error(format!("Could not load assignments: {}", e));
            GridError::Fetch(e)
        })?;
        self.rows.replace_person_rows(person, detail);
        self.totals.derive_missing(person, &self.axis, self.rows.rows_for(person));
        self.drop_dangling_refs();
        Ok(())
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn select(&mut self, cell: CellRef, extend: bool) {
        self.selection.select_cell(cell, extend, &self.axis);
    }

    pub fn begin_drag(&mut self, cell: CellRef) {
        self.selection.begin_drag(cell);
    }

    pub fn extend_drag(&mut self, cell: CellRef) {
        self.selection.extend_drag(cell, &self.axis);
    }

    pub fn end_drag(&mut self) {
        self.selection.end_drag();
    }

    pub fn move_selection(&mut self, weeks: isize) {
        self.selection.move_by(weeks, &self.axis);
    }

    pub fn extend_selection(&mut self, weeks: isize) {
        self.selection.extend_by(weeks, &self.axis);
    }

    /// Move to the same week in the row `rows` above or below.
    pub fn move_row(&mut self, rows: isize) {
        let Some(focus) = self.selection.focus().cloned() else {
            return;
        };
        if let Some(key) = self.rows.neighbor(&focus.row_key(), rows) {
            let target = CellRef::new(key.person_id, key.assignment_id, focus.week);
            self.selection.select_cell(target, false, &self.axis);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// Open an edit on the focused cell with its current value. A range
    /// selection is kept, so the commit becomes a bulk write.
    pub fn start_edit(&mut self) -> bool {
        let Some(cell) = self.selection.focus().cloned() else {
            return false;
        };
        let current = self.hours(&cell);
        self.edit.start(cell, current);
        true
    }

    /// Keystroke while not editing: opens an edit on the single selected
    /// cell if `ch` is a digit or `.`.
    pub fn start_edit_with_char(&mut self, ch: char) -> bool {
        if self.edit.is_editing() {
            return false;
        }
        let Some(cell) = self.selection.selected_cell().cloned() else {
            return false;
        };
        self.edit.start_with_char(cell, ch)
    }

    pub fn update_edit(&mut self, text: impl Into<String>) {
        self.edit.update_value(text);
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    /// Commit the open edit. Returns `Ok(None)` if nothing was open.
    ///
    /// The edit always closes. On full success the selection collapses and
    /// moves one week right (when there is a next week).
    pub fn commit_edit(&mut self, backend: &dyn GridBackend) -> Result<Option<BulkReport>, GridError> {
        let Some(edit) = self.edit.take() else {
            return Ok(None);
        };
        let value = sanitize_hours(&edit.raw, self.hours_cap);

        let targets = match resolve_commit_scope(&self.selection, &edit) {
            CommitScope::Single(cell) => vec![cell],
            CommitScope::Bulk(cells) => {
                if let Err(e) = self.selection.validate_contiguous(&self.axis) {
                    self.events.error(e.to_string());
                    return Err(e.into());
                }
                cells
            }
        };

        let report = self.apply_hours(&targets, value, backend);
        if report.is_success() {
            let next = self.axis.next(&edit.cell.week).cloned();
            let target = match next {
                Some(week) => edit.cell.at_week(week),
                None => edit.cell,
            };
            self.selection.select_cell(target, false, &self.axis);
        }
        Ok(Some(report))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Optimistically set `value` (clamped) on every target.
    pub fn prepare_hours(&mut self, targets: &[CellRef], value: f64) -> PendingBulk {
        let value = clamp_hours(value, self.hours_cap);
        bulk::prepare(&mut self.rows, &mut self.totals, targets, value)
    }

    /// Reconcile a dispatched write.
    pub fn settle_hours(&mut self, dispatched: DispatchedBulk) -> BulkReport {
        bulk::settle(dispatched, &mut self.rows, &mut self.totals, &mut self.events)
    }

    pub fn apply_hours(&mut self, targets: &[CellRef], value: f64, backend: &dyn GridBackend) -> BulkReport {
        let pending = self.prepare_hours(targets, value);
        if pending.is_empty() {
            return BulkReport { skipped: pending.skipped, ..BulkReport::default() };
        }
        let dispatched = bulk::dispatch(pending, backend);
        self.settle_hours(dispatched)
    }

    /// Create an assignment of `person` to `project`.
    pub fn assign_project(
        &mut self,
        person: PersonId,
        project: ProjectId,
        backend: &dyn GridBackend,
    ) -> Result<AssignmentId, GridError> {
        if self.rows.person(person).is_none() {
            return Err(GridError::NotFound(format!("person {}", person)));
        }
        let row = backend.create_row(person, project).map_err(|e| {
            self.events.error(format!("Could not assign project: {}", e));
            GridError::RemoteWrite(e)
        })?;
        let id = row.id;
        let weeks: Vec<WeekKey> = row.weekly_hours.keys().cloned().collect();
        self.rows.push_assignment(row);
        for week in &weeks {
            self.totals.recompute(person, week, self.rows.rows_for(person));
        }
        self.events.push(GridEvent::AnalyticsInvalidated);
        Ok(id)
    }

    /// Delete an assignment and everything that points at it.
    pub fn remove_assignment(
        &mut self,
        assignment: AssignmentId,
        backend: &dyn GridBackend,
    ) -> Result<(), GridError> {
        let Some(person) = self.rows.owner_of(assignment) else {
            log::warn!("Remove requested for unknown assignment {}", assignment);
            return Err(GridError::NotFound(format!("assignment {}", assignment)));
        };
        backend.delete_row(assignment).map_err(|e| {
            self.events.error(format!("Could not remove assignment: {}", e));
            GridError::RemoteWrite(e)
        })?;
        if let Some(removed) = self.rows.remove_assignment(assignment) {
            let mut weeks: Vec<WeekKey> = self.axis.keys().to_vec();
            weeks.extend(removed.weekly_hours.into_keys().filter(|w| !self.axis.contains(w)));
            for week in &weeks {
                self.totals.recompute(person, week, self.rows.rows_for(person));
            }
        }
        self.drop_dangling_refs();
        self.events.push(GridEvent::AnalyticsInvalidated);
        Ok(())
    }

    /// Clear selection or edit that refers to rows no longer present.
    fn drop_dangling_refs(&mut self) {
        let rows = &self.rows;
        if self.selection.cells().iter().any(|c| rows.find(&c.row_key()).is_none()) {
            self.selection.clear();
        }
        if let Some(edit) = self.edit.current() {
            if rows.find(&edit.cell.row_key()).is_none() {
                self.edit.cancel();
            }
        }
    }

    // ── Derived views ────────────────────────────────────────────────

    pub fn status_filter(&self) -> &StatusFilter {
        &self.status_filter
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
    }

    /// Rows passing the status filter. If the filter cannot be computed,
    /// everything is shown.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        match filter::visible_rows(&self.rows, &self.projects, &self.status_filter) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Status filter failed, showing all rows: {}", e);
                filter::all_rows(&self.rows)
            }
        }
    }

    // ── Input ────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, input: GridInput, backend: &dyn GridBackend) -> Result<(), GridError> {
        match input {
            GridInput::Click(cell) => self.select(cell, false),
            GridInput::ShiftClick(cell) => self.select(cell, true),
            GridInput::MouseDown(cell) => self.begin_drag(cell),
            GridInput::MouseEnter(cell) => self.extend_drag(cell),
            GridInput::MouseUp => self.end_drag(),
            GridInput::DoubleClick(cell) => {
                self.select(cell, false);
                self.start_edit();
            }
            GridInput::Blur => {
                self.commit_edit(backend)?;
            }
            GridInput::Key(key) => self.handle_key(key, backend)?,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: Key, backend: &dyn GridBackend) -> Result<(), GridError> {
        if self.edit.is_editing() {
            match key {
                Key::Char(ch) => self.edit.push_char(ch),
                Key::Backspace => self.edit.backspace(),
                Key::Enter => {
                    self.commit_edit(backend)?;
                }
                Key::Escape => self.edit.cancel(),
                Key::Arrow { .. } => {}
            }
            return Ok(());
        }

        match key {
            Key::Char(ch) if is_entry_char(ch) => {
                self.start_edit_with_char(ch);
            }
            Key::Char(_) | Key::Backspace => {}
            Key::Enter => {
                self.start_edit();
            }
            Key::Escape => self.selection.clear(),
            Key::Arrow { dir, shift } => match (dir.is_horizontal(), shift) {
                (true, false) => self.move_selection(dir.delta()),
                (true, true) => self.extend_selection(dir.delta()),
                (false, false) => self.move_row(dir.delta()),
                // A range never spans rows
                (false, true) => {}
            },
        }
        Ok(())
    }
}
