use serde::{Deserialize, Serialize};

use crate::a1;

/// A rectangular range of cells, inclusive on both ends.
///
/// Corners are stored as given: a drag from bottom-right to top-left yields a
/// range whose `start_*` fields are larger than its `end_*` fields. Every
/// accessor below normalizes, so callers never compare raw corners directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRange {
    /// Create a range from two corners in any order.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1,
            start_col: c1,
            end_row: r2,
            end_col: c2,
        }
    }

    /// Create a single-cell range.
    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    /// Copy of this range with start <= end on both axes.
    pub fn normalized(&self) -> Self {
        Self {
            start_row: self.min_row(),
            start_col: self.min_col(),
            end_row: self.max_row(),
            end_col: self.max_col(),
        }
    }

    pub fn min_row(&self) -> usize {
        self.start_row.min(self.end_row)
    }

    pub fn max_row(&self) -> usize {
        self.start_row.max(self.end_row)
    }

    pub fn min_col(&self) -> usize {
        self.start_col.min(self.end_col)
    }

    pub fn max_col(&self) -> usize {
        self.start_col.max(self.end_col)
    }

    pub fn row_count(&self) -> usize {
        self.max_row() - self.min_row() + 1
    }

    pub fn col_count(&self) -> usize {
        self.max_col() - self.min_col() + 1
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.min_row() && row <= self.max_row() && col >= self.min_col() && col <= self.max_col()
    }

    /// True if `other` lies entirely inside this range.
    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(other.min_row(), other.min_col()) && self.contains(other.max_row(), other.max_col())
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.min_row() <= other.max_row()
            && other.min_row() <= self.max_row()
            && self.min_col() <= other.max_col()
            && other.min_col() <= self.max_col()
    }

    /// Smallest range covering both `self` and the cell (row, col).
    pub fn union_cell(&self, row: usize, col: usize) -> Self {
        Self {
            start_row: self.min_row().min(row),
            start_col: self.min_col().min(col),
            end_row: self.max_row().max(row),
            end_col: self.max_col().max(col),
        }
    }

    /// Check if this is a single cell.
    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.normalized();
        (n.start_row..=n.end_row).flat_map(move |r| (n.start_col..=n.end_col).map(move |c| (r, c)))
    }

    /// A1-style label, e.g. `B2:D4` or `C7` for a single cell.
    pub fn label(&self) -> String {
        let n = self.normalized();
        if n.is_single() {
            a1(n.start_row, n.start_col)
        } else {
            format!("{}:{}", a1(n.start_row, n.start_col), a1(n.end_row, n.end_col))
        }
    }
}
