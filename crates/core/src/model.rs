//! Row entities and cell references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::week::WeekKey;

pub type PersonId = i64;
pub type AssignmentId = i64;
pub type ProjectId = i64;

/// Week → hours for one assignment row.
pub type WeeklyHours = BTreeMap<WeekKey, f64>;

/// Hours in a week; the ceiling for any single cell unless policy is tighter.
pub const DEFAULT_HOURS_CAP: f64 = 168.0;

/// An assignment: one person on one project, with hours per week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    #[serde(alias = "person")]
    pub person_id: PersonId,
    #[serde(alias = "project")]
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_status: Option<String>,
    #[serde(default, alias = "weeklyHours")]
    pub weekly_hours: WeeklyHours,
}

impl Assignment {
    pub fn new(id: AssignmentId, person_id: PersonId, project_id: ProjectId) -> Self {
        Self {
            id,
            person_id,
            project_id,
            person_name: None,
            project_name: None,
            project_status: None,
            weekly_hours: WeeklyHours::new(),
        }
    }

    pub fn with_hours<K: Into<WeekKey>>(mut self, hours: impl IntoIterator<Item = (K, f64)>) -> Self {
        for (week, value) in hours {
            self.weekly_hours.insert(week.into(), value);
        }
        self
    }

    /// Hours for a week; missing weeks read as zero.
    pub fn hours(&self, week: &WeekKey) -> f64 {
        self.weekly_hours.get(week).copied().unwrap_or(0.0)
    }

    pub fn row_key(&self) -> RowKey {
        RowKey { person_id: self.person_id, assignment_id: self.id }
    }
}

/// Identity of one grid row: a person's assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub person_id: PersonId,
    pub assignment_id: AssignmentId,
}

/// One editable cell: (person, assignment, week).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub person_id: PersonId,
    pub assignment_id: AssignmentId,
    pub week: WeekKey,
}

impl CellRef {
    pub fn new(person_id: PersonId, assignment_id: AssignmentId, week: impl Into<WeekKey>) -> Self {
        Self { person_id, assignment_id, week: week.into() }
    }

    pub fn row_key(&self) -> RowKey {
        RowKey { person_id: self.person_id, assignment_id: self.assignment_id }
    }

    pub fn same_row(&self, other: &CellRef) -> bool {
        self.person_id == other.person_id && self.assignment_id == other.assignment_id
    }

    /// The same row at a different week.
    pub fn at_week(&self, week: WeekKey) -> Self {
        Self { person_id: self.person_id, assignment_id: self.assignment_id, week }
    }
}
