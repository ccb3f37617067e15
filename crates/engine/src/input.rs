//! Pointer and keyboard input as the grid sees it.

use staffgrid_core::CellRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Week delta for horizontal moves, row delta for vertical ones.
    pub fn delta(self) -> isize {
        match self {
            Direction::Left | Direction::Up => -1,
            Direction::Right | Direction::Down => 1,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Escape,
    Arrow { dir: Direction, shift: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridInput {
    Click(CellRef),
    ShiftClick(CellRef),
    MouseDown(CellRef),
    MouseEnter(CellRef),
    MouseUp,
    DoubleClick(CellRef),
    Key(Key),
    /// The edit box lost focus.
    Blur,
}
