//! Core types for the assignment grid - weeks, cells, selection, editing.
//!
//! No IO and no backend concepts. The engine crate composes these into a
//! controller; the client crate ships them over the wire.

pub mod edit;
pub mod model;
pub mod selection;
pub mod totals;
pub mod week;

pub use edit::{
    clamp_hours, format_hours, is_entry_char, resolve_commit_scope, sanitize_hours,
    CommitScope, EditSession, EditState,
};
pub use model::{
    Assignment, AssignmentId, CellRef, PersonId, ProjectId, RowKey, WeeklyHours,
    DEFAULT_HOURS_CAP,
};
pub use selection::{SelectionError, SelectionModel, SelectionState};
pub use totals::AggregateTotals;
pub use week::{WeekAxis, WeekKey};
