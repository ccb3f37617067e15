//! Row storage: people in display order, each with their assignments.
//!
//! Lookups by person and by assignment are O(1) through two indexes that
//! are rebuilt whenever rows move between people or are removed.

use rustc_hash::FxHashMap;
use staffgrid_client::PersonSummary;
use staffgrid_core::{Assignment, AssignmentId, PersonId, RowKey};

/// Whether a person's assignments are in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailState {
    /// Only the person and their totals are known.
    Collapsed,
    /// Assignments (with hours) are loaded.
    Loaded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonRow {
    pub person_id: PersonId,
    pub name: String,
    pub assignments: Vec<Assignment>,
    pub detail: DetailState,
}

impl PersonRow {
    pub fn collapsed(person_id: PersonId, name: impl Into<String>) -> Self {
        Self { person_id, name: name.into(), assignments: Vec::new(), detail: DetailState::Collapsed }
    }

    pub fn is_loaded(&self) -> bool {
        self.detail == DetailState::Loaded
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowStore {
    people: Vec<PersonRow>,
    /// person_id -> index into `people`
    person_index: FxHashMap<PersonId, usize>,
    /// assignment_id -> owning person
    owner: FxHashMap<AssignmentId, PersonId>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot. People keep the snapshot's order; anyone who
    /// only appears through a row is appended. People with rows arrive
    /// loaded, the rest collapsed.
    pub fn from_snapshot(people: &[PersonSummary], rows: Vec<Assignment>) -> Self {
        let mut store = Self::new();
        for p in people {
            store.ensure_person(p.id, &p.name);
        }
        for row in rows {
            let name = row.person_name.clone().unwrap_or_default();
            let idx = store.ensure_person(row.person_id, &name);
            let person = &mut store.people[idx];
            person.detail = DetailState::Loaded;
            store.owner.insert(row.id, row.person_id);
            person.assignments.push(row);
        }
        store
    }

    fn ensure_person(&mut self, person_id: PersonId, name: &str) -> usize {
        if let Some(&idx) = self.person_index.get(&person_id) {
            if self.people[idx].name.is_empty() && !name.is_empty() {
                self.people[idx].name = name.to_string();
            }
            return idx;
        }
        let idx = self.people.len();
        self.people.push(PersonRow::collapsed(person_id, name));
        self.person_index.insert(person_id, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn people(&self) -> &[PersonRow] {
        &self.people
    }

    pub fn person(&self, person_id: PersonId) -> Option<&PersonRow> {
        self.person_index.get(&person_id).map(|&i| &self.people[i])
    }

    /// A person's loaded assignments (empty if unknown or collapsed).
    pub fn rows_for(&self, person_id: PersonId) -> &[Assignment] {
        self.person(person_id).map(|p| p.assignments.as_slice()).unwrap_or(&[])
    }

    pub fn owner_of(&self, assignment_id: AssignmentId) -> Option<PersonId> {
        self.owner.get(&assignment_id).copied()
    }

    /// Look up a row, requiring the person to match.
    pub fn find(&self, key: &RowKey) -> Option<&Assignment> {
        if self.owner_of(key.assignment_id)? != key.person_id {
            return None;
        }
        self.rows_for(key.person_id).iter().find(|a| a.id == key.assignment_id)
    }

    pub fn find_mut(&mut self, key: &RowKey) -> Option<&mut Assignment> {
        if self.owner_of(key.assignment_id)? != key.person_id {
            return None;
        }
        let idx = *self.person_index.get(&key.person_id)?;
        self.people[idx].assignments.iter_mut().find(|a| a.id == key.assignment_id)
    }

    pub fn assignment(&self, assignment_id: AssignmentId) -> Option<&Assignment> {
        let person_id = self.owner_of(assignment_id)?;
        self.find(&RowKey { person_id, assignment_id })
    }

    /// Replace a person's assignments with freshly fetched ones.
    pub fn replace_person_rows(&mut self, person_id: PersonId, rows: Vec<Assignment>) {
        let name = rows.iter().find_map(|r| r.person_name.clone()).unwrap_or_default();
        let idx = self.ensure_person(person_id, &name);
        for old in &self.people[idx].assignments {
            self.owner.remove(&old.id);
        }
        for row in &rows {
            self.owner.insert(row.id, person_id);
        }
        let person = &mut self.people[idx];
        person.assignments = rows;
        person.detail = DetailState::Loaded;
    }

    /// Append a newly created row under its person.
    pub fn push_assignment(&mut self, row: Assignment) {
        let name = row.person_name.clone().unwrap_or_default();
        let idx = self.ensure_person(row.person_id, &name);
        self.owner.insert(row.id, row.person_id);
        self.people[idx].assignments.push(row);
    }

    pub fn remove_assignment(&mut self, assignment_id: AssignmentId) -> Option<Assignment> {
        let person_id = self.owner.remove(&assignment_id)?;
        let idx = *self.person_index.get(&person_id)?;
        let rows = &mut self.people[idx].assignments;
        let pos = rows.iter().position(|a| a.id == assignment_id)?;
        Some(rows.remove(pos))
    }

    /// Every loaded assignment, in display order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.people.iter().flat_map(|p| p.assignments.iter())
    }

    /// The row `delta` rows above or below `key` in display order, skipping
    /// collapsed people. Clamped at both ends.
    pub fn neighbor(&self, key: &RowKey, delta: isize) -> Option<RowKey> {
        let order: Vec<RowKey> = self.assignments().map(|a| a.row_key()).collect();
        let pos = order.iter().position(|k| k == key)?;
        let target = (pos as isize + delta).clamp(0, order.len() as isize - 1) as usize;
        order.get(target).copied()
    }
}
