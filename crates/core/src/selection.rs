use serde::{Deserialize, Serialize};

use crate::expansion::GridBounds;
use crate::range::CellRange;
use crate::{MAX_COLS, MAX_ROWS};

/// The selection model: an active cell plus an optional rectangular range.
///
/// The range, when present, always has the anchor at one corner. For "is this
/// cell selected" queries the range wins over the active cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    active: (usize, usize),
    anchor: (usize, usize),
    range: Option<CellRange>,
}

impl SelectionState {
    /// Create a new selection with a single cell.
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            active: (row, col),
            anchor: (row, col),
            range: None,
        }
    }

    /// The active (cursor) cell.
    pub fn active_cell(&self) -> (usize, usize) {
        self.active
    }

    /// Get the anchor cell (for extending selections).
    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    /// The explicit range, if one has been made.
    pub fn range(&self) -> Option<CellRange> {
        self.range
    }

    /// The range every range-scoped operation targets: the explicit range,
    /// or the active cell as a degenerate range.
    pub fn selected_range(&self) -> CellRange {
        self.range
            .map(|r| r.normalized())
            .unwrap_or_else(|| CellRange::single(self.active.0, self.active.1))
    }

    /// Check if a cell is selected.
    pub fn is_cell_in_range(&self, row: usize, col: usize) -> bool {
        match self.range {
            Some(range) => range.contains(row, col),
            None => self.active == (row, col),
        }
    }

    /// Check if selection is a single cell.
    pub fn is_single_cell(&self) -> bool {
        self.range.map_or(true, |r| r.normalized().is_single())
    }

    /// Set selection to a single cell (click). Clears any range.
    pub fn set_active(&mut self, row: usize, col: usize) {
        let (row, col) = clamp_to_platform(row, col);
        self.active = (row, col);
        self.anchor = (row, col);
        self.range = None;
    }

    /// Extend from the anchor to the given cell (shift+click / shift+arrow).
    pub fn extend_to(&mut self, row: usize, col: usize) {
        let (row, col) = clamp_to_platform(row, col);
        let (anchor_row, anchor_col) = self.anchor;
        if (row, col) == self.anchor {
            self.range = None;
        } else {
            self.range = Some(CellRange::new(anchor_row, anchor_col, row, col));
        }
    }

    /// The far corner of the current extension (the cell opposite the anchor).
    pub fn extent(&self) -> (usize, usize) {
        match self.range {
            Some(r) => (r.end_row, r.end_col),
            None => self.active,
        }
    }

    /// Move active cell by delta, collapsing to single cell.
    pub fn move_by(&mut self, d_row: isize, d_col: isize) -> (usize, usize) {
        let (row, col) = offset(self.active, d_row, d_col);
        self.set_active(row, col);
        (row, col)
    }

    /// Extend selection by delta from current extent.
    pub fn extend_by(&mut self, d_row: isize, d_col: isize) -> (usize, usize) {
        let (row, col) = offset(self.extent(), d_row, d_col);
        self.extend_to(row, col);
        (row, col)
    }

    /// Select an entire row, spanning the current logical column bound.
    pub fn select_row(&mut self, row: usize, bounds: &GridBounds) {
        let row = row.min(MAX_ROWS - 1);
        self.active = (row, 0);
        self.anchor = (row, 0);
        self.range = Some(CellRange::new(row, 0, row, bounds.visible_cols.saturating_sub(1)));
    }

    /// Select an entire column, spanning the current logical row bound.
    pub fn select_column(&mut self, col: usize, bounds: &GridBounds) {
        let col = col.min(MAX_COLS - 1);
        self.active = (0, col);
        self.anchor = (0, col);
        self.range = Some(CellRange::new(0, col, bounds.visible_rows.saturating_sub(1), col));
    }

    /// Select every cell inside the current logical bounds.
    pub fn select_all(&mut self, bounds: &GridBounds) {
        self.active = (0, 0);
        self.anchor = (0, 0);
        self.range = Some(CellRange::new(
            0,
            0,
            bounds.visible_rows.saturating_sub(1),
            bounds.visible_cols.saturating_sub(1),
        ));
    }

    /// Check if selection is an entire row (spans all logical columns)
    pub fn is_full_row(&self, bounds: &GridBounds) -> bool {
        let r = self.selected_range();
        r.min_col() == 0 && r.max_col() + 1 >= bounds.visible_cols
    }

    /// Check if selection is an entire column (spans all logical rows)
    pub fn is_full_column(&self, bounds: &GridBounds) -> bool {
        let r = self.selected_range();
        r.min_row() == 0 && r.max_row() + 1 >= bounds.visible_rows
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

fn clamp_to_platform(row: usize, col: usize) -> (usize, usize) {
    (row.min(MAX_ROWS - 1), col.min(MAX_COLS - 1))
}

fn offset((row, col): (usize, usize), d_row: isize, d_col: isize) -> (usize, usize) {
    let new_row = (row as isize + d_row).clamp(0, MAX_ROWS as isize - 1) as usize;
    let new_col = (col as isize + d_col).clamp(0, MAX_COLS as isize - 1) as usize;
    (new_row, new_col)
}
