//! Selection model: single cell or a contiguous week range within one row.
//!
//! A range never spans rows. Drag and shift-extend only ever build valid
//! ranges, but a range can go stale when the week axis is replaced, so
//! consumers must call [`SelectionModel::validate_contiguous`] before
//! treating a range as bulk-editable.

use std::fmt;

use crate::model::CellRef;
use crate::week::WeekAxis;

/// Why a range is not bulk-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    NotSameRow,
    NotContiguous,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NotSameRow => write!(f, "Selection must be within a single assignment row"),
            SelectionError::NotContiguous => write!(f, "Selection must be a contiguous week range"),
        }
    }
}

impl std::error::Error for SelectionError {}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Empty,
    Single(CellRef),
    /// Cells in axis order, plus the anchor the range was extended from.
    Range { cells: Vec<CellRef>, start: CellRef },
}

#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    state: SelectionState,
    anchor: Option<CellRef>,
    /// The cell the user last moved to; arrows and shift-arrows start here.
    focus: Option<CellRef>,
    dragging: bool,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a range from arbitrary cells, bypassing drag/extend.
    /// The result is not guaranteed to be valid.
    pub fn from_cells(cells: Vec<CellRef>) -> Self {
        let Some(first) = cells.first().cloned() else {
            return Self::default();
        };
        let focus = cells.last().cloned();
        Self {
            state: SelectionState::Range { cells, start: first.clone() },
            anchor: Some(first),
            focus,
            dragging: false,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn anchor(&self) -> Option<&CellRef> {
        self.anchor.as_ref()
    }

    pub fn focus(&self) -> Option<&CellRef> {
        self.focus.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, SelectionState::Empty)
    }

    /// The selected cell when exactly one cell is selected.
    pub fn selected_cell(&self) -> Option<&CellRef> {
        match &self.state {
            SelectionState::Single(cell) => Some(cell),
            SelectionState::Range { cells, .. } if cells.len() == 1 => cells.first(),
            _ => None,
        }
    }

    /// All selected cells, in axis order for ranges.
    pub fn cells(&self) -> &[CellRef] {
        match &self.state {
            SelectionState::Empty => &[],
            SelectionState::Single(cell) => std::slice::from_ref(cell),
            SelectionState::Range { cells, .. } => cells,
        }
    }

    /// More than one cell selected.
    pub fn is_multi(&self) -> bool {
        self.cells().len() > 1
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        self.cells().iter().any(|c| c == cell)
    }

    /// Click (or shift-click when `extend`).
    ///
    /// Extending needs an anchor in the same row; otherwise the request is
    /// ignored and the selection is left as it was.
    pub fn select_cell(&mut self, cell: CellRef, extend: bool, axis: &WeekAxis) {
        if extend {
            if let Some(anchor) = self.anchor.clone() {
                if let Some(cells) = contiguous_block(&anchor, &cell, axis) {
                    self.state = SelectionState::Range { cells, start: anchor };
                    self.focus = Some(cell);
                }
                return;
            }
        }
        self.anchor = Some(cell.clone());
        self.focus = Some(cell.clone());
        self.state = SelectionState::Single(cell);
    }

    pub fn begin_drag(&mut self, cell: CellRef) {
        self.anchor = Some(cell.clone());
        self.focus = Some(cell.clone());
        self.state = SelectionState::Range { cells: vec![cell.clone()], start: cell };
        self.dragging = true;
    }

    /// Only effective while dragging, and only within the anchor's row.
    pub fn extend_drag(&mut self, cell: CellRef, axis: &WeekAxis) {
        if !self.dragging {
            return;
        }
        let Some(anchor) = self.anchor.clone() else {
            return;
        };
        if let Some(cells) = contiguous_block(&anchor, &cell, axis) {
            self.state = SelectionState::Range { cells, start: anchor };
            self.focus = Some(cell);
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Arrow key: move the focus by `delta` weeks and collapse to it.
    pub fn move_by(&mut self, delta: isize, axis: &WeekAxis) {
        let Some(focus) = self.focus.clone() else {
            return;
        };
        if let Some(week) = axis.offset(&focus.week, delta) {
            let target = focus.at_week(week.clone());
            self.select_cell(target, false, axis);
        }
    }

    /// Shift+arrow: move the focus by `delta` weeks, extending from the anchor.
    pub fn extend_by(&mut self, delta: isize, axis: &WeekAxis) {
        let Some(focus) = self.focus.clone() else {
            return;
        };
        if let Some(week) = axis.offset(&focus.week, delta) {
            let target = focus.at_week(week.clone());
            self.select_cell(target, true, axis);
        }
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::Empty;
        self.anchor = None;
        self.focus = None;
        self.dragging = false;
    }

    /// Check that the selection is one row and an unbroken block of weeks
    /// on the current axis.
    pub fn validate_contiguous(&self, axis: &WeekAxis) -> Result<(), SelectionError> {
        let cells = match &self.state {
            SelectionState::Empty | SelectionState::Single(_) => return Ok(()),
            SelectionState::Range { cells, .. } => cells,
        };
        let Some(first) = cells.first() else {
            return Ok(());
        };
        if cells.iter().any(|c| !c.same_row(first)) {
            return Err(SelectionError::NotSameRow);
        }

        let mut positions = Vec::with_capacity(cells.len());
        for cell in cells {
            match axis.position(&cell.week) {
                Some(p) => positions.push(p),
                None => return Err(SelectionError::NotContiguous),
            }
        }
        positions.sort_unstable();
        if positions.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(SelectionError::NotContiguous);
        }
        Ok(())
    }
}

/// Cells between `anchor` and `target` (inclusive) in the anchor's row.
/// `None` when the rows differ or either week is off the axis.
fn contiguous_block(anchor: &CellRef, target: &CellRef, axis: &WeekAxis) -> Option<Vec<CellRef>> {
    if !anchor.same_row(target) {
        return None;
    }
    let i = axis.position(&anchor.week)?;
    let j = axis.position(&target.week)?;
    Some(
        axis.span(i, j)
            .iter()
            .map(|week| anchor.at_week(week.clone()))
            .collect(),
    )
}
