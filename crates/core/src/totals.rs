//! Per-person weekly hour totals.
//!
//! Totals arrive pre-aggregated in the snapshot. Local derivation only
//! fills pairs the backend left out, except after an edit, where the
//! edited (person, week) pairs are recomputed from the rows in memory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Assignment, PersonId};
use crate::week::{WeekAxis, WeekKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateTotals {
    by_person: BTreeMap<PersonId, BTreeMap<WeekKey, f64>>,
}

impl AggregateTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total for a pair; absent pairs read as zero.
    pub fn get(&self, person: PersonId, week: &WeekKey) -> f64 {
        self.by_person
            .get(&person)
            .and_then(|weeks| weeks.get(week))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn contains(&self, person: PersonId, week: &WeekKey) -> bool {
        self.by_person
            .get(&person)
            .map_or(false, |weeks| weeks.contains_key(week))
    }

    pub fn set(&mut self, person: PersonId, week: WeekKey, value: f64) {
        self.by_person.entry(person).or_default().insert(week, value);
    }

    pub fn person(&self, person: PersonId) -> Option<&BTreeMap<WeekKey, f64>> {
        self.by_person.get(&person)
    }

    pub fn remove_person(&mut self, person: PersonId) {
        self.by_person.remove(&person);
    }

    pub fn people(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.by_person.keys().copied()
    }

    /// Overwrite one pair with the sum of the given rows.
    pub fn recompute<'a>(
        &mut self,
        person: PersonId,
        week: &WeekKey,
        rows: impl IntoIterator<Item = &'a Assignment>,
    ) {
        let sum = sum_week(rows, week);
        self.set(person, week.clone(), sum);
    }

    /// Fill every axis week the backend did not supply, from the rows.
    /// Supplied pairs are left alone.
    pub fn derive_missing(&mut self, person: PersonId, axis: &WeekAxis, rows: &[Assignment]) {
        for week in axis.keys() {
            if !self.contains(person, week) {
                let sum = sum_week(rows.iter(), week);
                self.set(person, week.clone(), sum);
            }
        }
    }
}

fn sum_week<'a>(rows: impl IntoIterator<Item = &'a Assignment>, week: &WeekKey) -> f64 {
    rows.into_iter().map(|a| a.hours(week)).sum()
}
