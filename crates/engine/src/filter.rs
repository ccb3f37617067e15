//! Project-status filter over loaded rows.
//!
//! Visibility is derived, never stored: callers recompute it whenever rows
//! or the filter change.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use staffgrid_client::ProjectInfo;
use staffgrid_core::{Assignment, AssignmentId, PersonId, ProjectId};

use crate::error::GridError;
use crate::rows::RowStore;

/// Allowed project statuses. Empty means everything is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    allowed: BTreeSet<String>,
}

impl StatusFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { allowed: statuses.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect() }
    }

    pub fn is_all(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn allows(&self, status: &str) -> bool {
        self.is_all() || self.allowed.contains(&status.to_ascii_lowercase())
    }
}

/// One person as displayed, with the assignments that pass the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow {
    pub person_id: PersonId,
    pub assignments: Vec<AssignmentId>,
}

/// Apply `filter` to every loaded row. Collapsed people are always shown;
/// loaded people only when at least one assignment passes.
///
/// A row whose project status cannot be resolved (not on the row, not in
/// `projects`) is an error.
pub fn visible_rows(
    rows: &RowStore,
    projects: &FxHashMap<ProjectId, ProjectInfo>,
    filter: &StatusFilter,
) -> Result<Vec<VisibleRow>, GridError> {
    let mut out = Vec::with_capacity(rows.len());
    for person in rows.people() {
        if !person.is_loaded() {
            out.push(VisibleRow { person_id: person.person_id, assignments: Vec::new() });
            continue;
        }
        let mut ids = Vec::with_capacity(person.assignments.len());
        for a in &person.assignments {
            if filter.is_all() || filter.allows(project_status(a, projects)?) {
                ids.push(a.id);
            }
        }
        if filter.is_all() || !ids.is_empty() {
            out.push(VisibleRow { person_id: person.person_id, assignments: ids });
        }
    }
    Ok(out)
}

/// Everything, unfiltered.
pub fn all_rows(rows: &RowStore) -> Vec<VisibleRow> {
    rows.people()
        .iter()
        .map(|p| VisibleRow {
            person_id: p.person_id,
            assignments: p.assignments.iter().map(|a| a.id).collect(),
        })
        .collect()
}

fn project_status<'a>(
    row: &'a Assignment,
    projects: &'a FxHashMap<ProjectId, ProjectInfo>,
) -> Result<&'a str, GridError> {
    if let Some(status) = row.project_status.as_deref() {
        return Ok(status);
    }
    projects
        .get(&row.project_id)
        .and_then(|p| p.status.as_deref())
        .ok_or_else(|| {
            GridError::Derived(format!("no status for project {} (assignment {})", row.project_id, row.id))
        })
}
