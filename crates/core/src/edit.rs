//! Single-cell edit lifecycle and hour sanitization.
//!
//! At most one edit is open at a time. Raw text is stored as typed and only
//! parsed at commit, where bad input is coerced rather than rejected.

use crate::model::CellRef;
use crate::selection::{SelectionModel, SelectionState};

/// The open edit: which cell, and the text typed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct EditState {
    pub cell: CellRef,
    pub raw: String,
}

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: Option<EditState>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_some()
    }

    pub fn current(&self) -> Option<&EditState> {
        self.state.as_ref()
    }

    /// Open an edit seeded with the cell's formatted current value.
    /// Replaces any edit that was already open.
    pub fn start(&mut self, cell: CellRef, current_value: f64) {
        self.state = Some(EditState { cell, raw: format_hours(current_value) });
    }

    /// Open an edit from a keystroke. Only digits and `.` start an edit; the
    /// typed character replaces the cell's value rather than appending.
    pub fn start_with_char(&mut self, cell: CellRef, ch: char) -> bool {
        if !is_entry_char(ch) {
            return false;
        }
        self.state = Some(EditState { cell, raw: ch.to_string() });
        true
    }

    pub fn update_value(&mut self, text: impl Into<String>) {
        if let Some(state) = self.state.as_mut() {
            state.raw = text.into();
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(state) = self.state.as_mut() {
            state.raw.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.raw.pop();
        }
    }

    /// Close the edit and hand back what was typed. Used by commit: the edit
    /// closes whether or not the write later succeeds.
    pub fn take(&mut self) -> Option<EditState> {
        self.state.take()
    }

    pub fn cancel(&mut self) {
        self.state = None;
    }
}

/// Keystrokes that open an edit on a selected cell.
pub fn is_entry_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

/// Parse typed text into hours in `[0, cap]`. Anything unparsable is zero.
pub fn sanitize_hours(raw: &str, cap: f64) -> f64 {
    let parsed = raw.trim().parse::<f64>().unwrap_or(0.0);
    clamp_hours(parsed, cap)
}

/// Clamp a number into `[0, cap]`; NaN and infinities become zero.
pub fn clamp_hours(value: f64, cap: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    value.min(cap)
}

/// Render hours without a trailing `.0`.
pub fn format_hours(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Where a commit applies.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitScope {
    /// Just the edited cell.
    Single(CellRef),
    /// Every cell of the multi-cell selection.
    Bulk(Vec<CellRef>),
}

/// Decide between the single-cell and bulk paths. A multi-cell range
/// alongside an open edit makes the commit a bulk write over the range.
pub fn resolve_commit_scope(selection: &SelectionModel, edit: &EditState) -> CommitScope {
    match selection.state() {
        SelectionState::Range { cells, .. } if cells.len() > 1 => CommitScope::Bulk(cells.clone()),
        _ => CommitScope::Single(edit.cell.clone()),
    }
}
