//! `sgrid` commands.
//!
//! Every grid command loads a fresh snapshot, drives the controller the way
//! a UI would (select, type, commit), prints notices, and exits.

use std::io::{self, Write};

use chrono::NaiveDate;
use staffgrid_client::{
    delete_auth, load_auth, save_auth, AuthCredentials, BackendError, GridBackend, HttpBackend,
    ScopeFilters,
};
use staffgrid_config::Settings;
use staffgrid_core::{format_hours, AssignmentId, CellRef, PersonId, ProjectId, WeekKey};
use staffgrid_engine::{
    BulkReport, GridController, GridEvent, GridInput, Key, LoadRequest, NoticeLevel, StatusFilter,
};

use crate::exit_codes::*;
use crate::render;
use crate::{CliError, ScopeArgs};

pub struct Context {
    pub settings: Settings,
    pub api_base: Option<String>,
}

// ── Login ───────────────────────────────────────────────────────────

pub fn cmd_login(ctx: &Context, token: Option<String>) -> Result<(), CliError> {
    // --token flag > SGRID_API_TOKEN env > interactive prompt
    let token = if let Some(t) = token {
        t
    } else if let Ok(t) = std::env::var("SGRID_API_TOKEN") {
        t
    } else if atty::is(atty::Stream::Stdin) {
        eprint!("API token: ");
        io::stderr().flush().ok();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).map_err(|e| CliError::general(e.to_string()))?;
        buf.trim().to_string()
    } else {
        return Err(CliError::args("No token provided and stdin is not a TTY")
            .with_hint("pass --token or set SGRID_API_TOKEN"));
    };
    if token.is_empty() {
        return Err(CliError::args("No token provided").with_hint("pass --token or set SGRID_API_TOKEN"));
    }

    let api_base = ctx.api_base.clone().unwrap_or_else(|| ctx.settings.api_base.clone());
    let mut creds = AuthCredentials::new(token, api_base);
    let backend = HttpBackend::new(creds.clone(), ctx.settings.api_timeout()).map_err(CliError::backend)?;

    let user = backend.verify_token().map_err(|e| match e {
        BackendError::Http(401, _) | BackendError::Http(403, _) => CliError {
            code: EXIT_NOT_AUTH,
            message: "Invalid API token".into(),
            hint: None,
        },
        other => CliError::backend(other),
    })?;

    creds.user_email = Some(user.email.clone());
    save_auth(&creds).map_err(CliError::general)?;

    match user.name {
        Some(name) => eprintln!("Authenticated as {} ({})", name, user.email),
        None => eprintln!("Authenticated as {}", user.email),
    }
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    delete_auth().map_err(CliError::general)?;
    eprintln!("Logged out");
    Ok(())
}

// ── Show / expand ───────────────────────────────────────────────────

pub fn cmd_show(ctx: &Context, scope: &ScopeArgs, status: Vec<String>, json: bool) -> Result<(), CliError> {
    let backend = connect(ctx)?;
    let mut grid = load_grid(ctx, scope, &backend)?;
    if !status.is_empty() {
        grid.set_status_filter(StatusFilter::only(status));
    }
    print_grid(&grid, json)
}

pub fn cmd_expand(ctx: &Context, scope: &ScopeArgs, people: Vec<PersonId>, refresh: bool) -> Result<(), CliError> {
    let backend = connect(ctx)?;
    let mut grid = load_grid(ctx, scope, &backend)?;
    for person in people {
        let result = if refresh {
            grid.refresh_person(person, &backend)
        } else {
            grid.expand_person(person, &backend).map(|_| ())
        };
        report_events(&mut grid);
        result.map_err(CliError::grid)?;
    }
    print_grid(&grid, false)
}

// ── Edits ───────────────────────────────────────────────────────────

pub fn cmd_set(
    ctx: &Context,
    scope: &ScopeArgs,
    person: PersonId,
    assignment: AssignmentId,
    week: &str,
    hours: &str,
) -> Result<(), CliError> {
    let backend = connect(ctx)?;
    let mut grid = load_grid(ctx, scope, &backend)?;
    let week = parse_week(&grid, week)?;
    let cell = CellRef::new(person, assignment, week);
    ensure_row(&mut grid, &cell, &backend)?;

    grid.handle_input(GridInput::Click(cell.clone()), &backend).map_err(CliError::grid)?;
    grid.start_edit();
    grid.update_edit(hours);
    let report = grid.commit_edit(&backend).map_err(CliError::grid);
    report_events(&mut grid);
    check_report(report?)?;

    eprintln!("{} {} = {}", cell.assignment_id, cell.week, format_hours(grid.hours(&cell)));
    Ok(())
}

pub fn cmd_fill(
    ctx: &Context,
    scope: &ScopeArgs,
    person: PersonId,
    assignment: AssignmentId,
    from: &str,
    to: &str,
    hours: &str,
) -> Result<(), CliError> {
    let backend = connect(ctx)?;
    let mut grid = load_grid(ctx, scope, &backend)?;
    let start = CellRef::new(person, assignment, parse_week(&grid, from)?);
    let end = start.at_week(parse_week(&grid, to)?);
    ensure_row(&mut grid, &start, &backend)?;

    for input in [GridInput::MouseDown(start.clone()), GridInput::MouseEnter(end), GridInput::MouseUp] {
        grid.handle_input(input, &backend).map_err(CliError::grid)?;
    }
    let cells = grid.selection().cells().to_vec();
    grid.handle_input(GridInput::Key(Key::Enter), &backend).map_err(CliError::grid)?;
    grid.update_edit(hours);
    let report = grid.commit_edit(&backend).map_err(CliError::grid);
    report_events(&mut grid);
    check_report(report?)?;

    let value = cells.first().map(|c| grid.hours(c)).unwrap_or(0.0);
    eprintln!("{} weeks of assignment {} = {}", cells.len(), assignment, format_hours(value));
    Ok(())
}

// ── Assign / unassign ───────────────────────────────────────────────

pub fn cmd_assign(ctx: &Context, scope: &ScopeArgs, person: PersonId, project: ProjectId) -> Result<(), CliError> {
    let backend = connect(ctx)?;
    let mut grid = load_grid(ctx, scope, &backend)?;
    let result = grid.assign_project(person, project, &backend);
    report_events(&mut grid);
    let id = result.map_err(CliError::grid)?;
    println!("{}", id);
    Ok(())
}

pub fn cmd_unassign(ctx: &Context, scope: &ScopeArgs, assignment: AssignmentId) -> Result<(), CliError> {
    let backend = connect(ctx)?;
    let mut grid = load_grid(ctx, scope, &backend)?;
    if grid.rows().owner_of(assignment).is_none() {
        expand_all(&mut grid, &backend)?;
    }
    let result = grid.remove_assignment(assignment, &backend);
    report_events(&mut grid);
    result.map_err(CliError::grid)?;
    eprintln!("Removed assignment {}", assignment);
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn connect(ctx: &Context) -> Result<HttpBackend, CliError> {
    let mut creds = load_auth().ok_or_else(|| CliError::backend(BackendError::NotAuthenticated))?;
    if let Some(base) = &ctx.api_base {
        creds.api_base = base.trim_end_matches('/').to_string();
    }
    HttpBackend::new(creds, ctx.settings.api_timeout()).map_err(CliError::backend)
}

fn load_request(ctx: &Context, scope: &ScopeArgs) -> Result<LoadRequest, CliError> {
    let weeks = scope.weeks.unwrap_or(ctx.settings.default_weeks);
    if weeks == 0 {
        return Err(CliError::args("--weeks must be at least 1"));
    }
    Ok(LoadRequest::new(weeks).with_scope(ScopeFilters {
        department: scope.department,
        include_children: scope.include_children,
    }))
}

/// Load through the split API so job progress can be shown as it arrives.
fn load_grid(ctx: &Context, scope: &ScopeArgs, backend: &dyn GridBackend) -> Result<GridController, CliError> {
    let request = load_request(ctx, scope)?;
    let mut grid = GridController::new(ctx.settings.loader_config(), ctx.settings.effective_hours_cap());

    let ticket = grid.begin_load(request);
    let loader = grid.loader().clone();
    let mut polled = false;
    let result = loader.acquire(&ticket.request, backend, &mut |job| {
        polled = true;
        eprint!("\rBuilding snapshot... {:>3}%", job.progress);
        grid.record_progress(&ticket, job);
    });
    if polled {
        eprintln!();
    }

    let finished = grid.finish_load(ticket, result);
    report_events(&mut grid);
    finished.map_err(CliError::grid)?;
    Ok(grid)
}

/// Print queued notices to stderr and drop the rest.
fn report_events(grid: &mut GridController) {
    for event in grid.drain_events() {
        match event {
            GridEvent::Notice(n) => match n.level {
                NoticeLevel::Info => eprintln!("{}", n.message),
                NoticeLevel::Warning => eprintln!("warning: {}", n.message),
                NoticeLevel::Error => eprintln!("error: {}", n.message),
            },
            GridEvent::Loaded { generation, path } => {
                log::debug!("load {} complete via {:?}", generation, path)
            }
            GridEvent::AnalyticsInvalidated | GridEvent::LoadProgress { .. } => {}
        }
    }
}

fn check_report(report: Option<BulkReport>) -> Result<(), CliError> {
    match report {
        Some(r) if r.failed > 0 => Err(CliError { code: EXIT_PARTIAL_WRITE, message: String::new(), hint: None }),
        Some(r) if r.committed == 0 => Err(CliError::grid(staffgrid_engine::GridError::NotFound(
            "no matching assignment row".into(),
        ))),
        Some(_) => Ok(()),
        None => Err(CliError::general("nothing to commit")),
    }
}

/// Week argument as a key on the loaded axis.
fn parse_week(grid: &GridController, raw: &str) -> Result<WeekKey, CliError> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::args(format!("Invalid week '{}' (expected YYYY-MM-DD)", raw)))?;
    let key = WeekKey::new(date.format("%Y-%m-%d").to_string());
    if grid.axis().contains(&key) {
        return Ok(key);
    }
    let hint = match (grid.axis().keys().first(), grid.axis().keys().last()) {
        (Some(first), Some(last)) => format!("loaded weeks run {} to {}; widen with --weeks", first, last),
        _ => "the loaded grid has no weeks".to_string(),
    };
    Err(CliError::args(format!("Week {} is not on the grid", key)).with_hint(hint))
}

/// Make sure the cell's row is in memory, expanding its person if needed.
fn ensure_row(grid: &mut GridController, cell: &CellRef, backend: &dyn GridBackend) -> Result<(), CliError> {
    if grid.rows().find(&cell.row_key()).is_some() {
        return Ok(());
    }
    let expanded = grid.expand_person(cell.person_id, backend);
    report_events(grid);
    expanded.map_err(CliError::grid)?;
    if grid.rows().find(&cell.row_key()).is_none() {
        return Err(CliError::grid(staffgrid_engine::GridError::NotFound(format!(
            "assignment {} of person {}",
            cell.assignment_id, cell.person_id
        ))));
    }
    Ok(())
}

fn expand_all(grid: &mut GridController, backend: &dyn GridBackend) -> Result<(), CliError> {
    let collapsed: Vec<PersonId> =
        grid.rows().people().iter().filter(|p| !p.is_loaded()).map(|p| p.person_id).collect();
    for person in collapsed {
        let result = grid.expand_person(person, backend);
        report_events(grid);
        result.map_err(CliError::grid)?;
    }
    Ok(())
}

fn print_grid(grid: &GridController, json: bool) -> Result<(), CliError> {
    let text = if json {
        serde_json::to_string_pretty(&render::render_json(grid)).map_err(|e| CliError::general(e.to_string()))?
    } else {
        render::render_table(grid)
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text.trim_end()).map_err(|e| CliError::general(e.to_string()))
}
