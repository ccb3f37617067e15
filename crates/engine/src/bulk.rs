//! Optimistic hour writes over one or many cells, with per-row rollback.
//!
//! A write runs in three steps so the network round trip sits between two
//! plain function calls:
//!
//! 1. [`prepare`] groups targets by row, snapshots the previous values,
//!    applies the new value locally and recomputes the affected totals.
//! 2. [`dispatch`] sends one batched request (several rows) or one per-row
//!    request (a single row) and records an outcome per row.
//! 3. [`settle`] rolls back failed rows, merges server rows for succeeded
//!    ones, and reports.
//!
//! Rollback restores only the weeks this write touched, so other edits to
//! the same row are not clobbered.

use rustc_hash::FxHashMap;
use staffgrid_client::{GridBackend, HoursUpdate};
use staffgrid_core::{AggregateTotals, Assignment, CellRef, RowKey, WeekKey, WeeklyHours};

use crate::events::{EventQueue, GridEvent};
use crate::rows::RowStore;

/// One row's part of a write.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlan {
    pub row: RowKey,
    /// Targeted weeks with their value before the write (`None` = unset).
    pub prev: Vec<(WeekKey, Option<f64>)>,
    /// The row's full hours after the write.
    pub next: WeeklyHours,
}

impl GroupPlan {
    pub fn weeks(&self) -> impl Iterator<Item = &WeekKey> {
        self.prev.iter().map(|(w, _)| w)
    }
}

/// Locally applied, not yet sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBulk {
    pub groups: Vec<GroupPlan>,
    /// Groups dropped because their row was not found locally.
    pub skipped: usize,
}

impl PendingBulk {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    /// Write accepted. Carries the stored row when the server returned one.
    Committed(Option<Assignment>),
    Failed(String),
}

/// Sent, outcomes known, not yet reconciled.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedBulk {
    pub pending: PendingBulk,
    /// Parallel to `pending.groups`.
    pub outcomes: Vec<GroupOutcome>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub committed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BulkReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Group, snapshot, apply, recompute totals.
pub fn prepare(
    rows: &mut RowStore,
    totals: &mut AggregateTotals,
    targets: &[CellRef],
    value: f64,
) -> PendingBulk {
    // Group by row, first-seen order
    let mut order: Vec<RowKey> = Vec::new();
    let mut weeks_by_row: FxHashMap<RowKey, Vec<WeekKey>> = FxHashMap::default();
    for cell in targets {
        let key = cell.row_key();
        let weeks = weeks_by_row.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if !weeks.contains(&cell.week) {
            weeks.push(cell.week.clone());
        }
    }

    let mut groups = Vec::with_capacity(order.len());
    let mut skipped = 0;
    for key in order {
        let weeks = weeks_by_row.remove(&key).unwrap_or_default();
        let Some(row) = rows.find_mut(&key) else {
            log::warn!(
                "Skipping write for missing assignment {} (person {})",
                key.assignment_id,
                key.person_id
            );
            skipped += 1;
            continue;
        };

        let prev: Vec<(WeekKey, Option<f64>)> =
            weeks.iter().map(|w| (w.clone(), row.weekly_hours.get(w).copied())).collect();
        let mut next = row.weekly_hours.clone();
        for w in &weeks {
            next.insert(w.clone(), value);
        }
        row.weekly_hours = next.clone();
        groups.push(GroupPlan { row: key, prev, next });
    }

    for group in &groups {
        recompute_totals(rows, totals, group);
    }

    PendingBulk { groups, skipped }
}

/// Send the writes. Never fails as a whole: every error lands in the
/// outcome of the group it belongs to.
pub fn dispatch(pending: PendingBulk, backend: &dyn GridBackend) -> DispatchedBulk {
    let outcomes = match pending.groups.as_slice() {
        [] => Vec::new(),
        [only] => {
            log::debug!("Updating assignment {}", only.row.assignment_id);
            vec![match backend.update_row_hours(only.row.assignment_id, &only.next) {
                Ok(stored) => GroupOutcome::Committed(Some(stored)),
                Err(e) => GroupOutcome::Failed(e.to_string()),
            }]
        }
        groups => {
            let updates: Vec<HoursUpdate> = groups
                .iter()
                .map(|g| HoursUpdate { assignment_id: g.row.assignment_id, weekly_hours: g.next.clone() })
                .collect();
            log::debug!("Bulk updating {} assignments", updates.len());
            match backend.bulk_update_hours(&updates) {
                Ok(results) => {
                    let by_id: FxHashMap<_, _> = results.iter().map(|r| (r.assignment_id, r)).collect();
                    groups
                        .iter()
                        .map(|g| match by_id.get(&g.row.assignment_id) {
                            Some(r) if r.is_ok() => GroupOutcome::Committed(None),
                            Some(r) => GroupOutcome::Failed(
                                r.error.clone().unwrap_or_else(|| r.status.clone()),
                            ),
                            None => GroupOutcome::Failed("no result returned".into()),
                        })
                        .collect()
                }
                Err(e) => {
                    let msg = e.to_string();
                    groups.iter().map(|_| GroupOutcome::Failed(msg.clone())).collect()
                }
            }
        }
    };
    DispatchedBulk { pending, outcomes }
}

/// Reconcile outcomes into local state. Failed groups go back to their
/// previous values together; one error notice covers all of them.
pub fn settle(
    dispatched: DispatchedBulk,
    rows: &mut RowStore,
    totals: &mut AggregateTotals,
    events: &mut EventQueue,
) -> BulkReport {
    let DispatchedBulk { pending, outcomes } = dispatched;
    let mut report = BulkReport { skipped: pending.skipped, ..BulkReport::default() };

    for (group, outcome) in pending.groups.iter().zip(outcomes) {
        match outcome {
            GroupOutcome::Committed(stored) => {
                report.committed += 1;
                if let (Some(stored), Some(row)) = (stored, rows.find_mut(&group.row)) {
                    for week in group.weeks() {
                        match stored.weekly_hours.get(week) {
                            Some(&v) => row.weekly_hours.insert(week.clone(), v),
                            None => row.weekly_hours.remove(week),
                        };
                    }
                }
            }
            GroupOutcome::Failed(reason) => {
                report.failed += 1;
                log::warn!("Write to assignment {} failed: {}", group.row.assignment_id, reason);
                if let Some(row) = rows.find_mut(&group.row) {
                    for (week, prev) in &group.prev {
                        match prev {
                            Some(v) => row.weekly_hours.insert(week.clone(), *v),
                            None => row.weekly_hours.remove(week),
                        };
                    }
                }
            }
        }
        recompute_totals(rows, totals, group);
    }

    if report.failed > 0 {
        events.error(failure_message(report.failed));
    }
    if report.committed > 0 {
        events.push(GridEvent::AnalyticsInvalidated);
    }
    report
}

/// `"Failed to update 1 assignment"`, `"Failed to update 3 assignments"`.
pub fn failure_message(failed: usize) -> String {
    let noun = if failed == 1 { "assignment" } else { "assignments" };
    format!("Failed to update {} {}", failed, noun)
}

fn recompute_totals(rows: &RowStore, totals: &mut AggregateTotals, group: &GroupPlan) {
    let person = group.row.person_id;
    for week in group.weeks() {
        totals.recompute(person, week, rows.rows_for(person));
    }
}
