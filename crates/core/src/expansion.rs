//! Grid expansion policy.
//!
//! Logical bounds are the rows/columns the UI currently treats as navigable.
//! They start at a minimum, grow as the user approaches an edge, and never
//! shrink. They do not gate the cell store: a write far outside the bounds
//! still lands, the bounds simply try to catch up first.

use serde::{Deserialize, Serialize};

use crate::{MAX_COLS, MAX_ROWS};

/// Logical (navigable) grid size. Monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridBounds {
    pub visible_rows: usize,
    pub visible_cols: usize,
}

impl GridBounds {
    pub fn total_cells(&self) -> usize {
        self.visible_rows.saturating_mul(self.visible_cols)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.visible_rows && col < self.visible_cols
    }
}

/// What caused the expansion check. Scrolling activates closer to the edge
/// than explicit navigation so continuous scrolling does not run away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionTrigger {
    Navigation,
    Write,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionConfig {
    pub min_visible_rows: usize,
    pub min_visible_cols: usize,
    pub row_buffer: usize,
    pub col_buffer: usize,
    /// Distance from the edge that triggers growth on navigation/write.
    pub navigation_margin: usize,
    /// Distance from the edge that triggers growth on scroll (smaller).
    pub scroll_margin: usize,
    /// Logical cell count considered "small"; growth beyond 4x this is refused.
    pub performance_threshold: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            min_visible_rows: 100,
            min_visible_cols: 26,
            row_buffer: 100,
            col_buffer: 10,
            navigation_margin: 10,
            scroll_margin: 3,
            performance_threshold: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionOutcome {
    /// Target was not near an edge, or growth would not increase the bounds.
    Unchanged,
    Grown { rows: usize, cols: usize },
    /// Growth was refused by the soft cap; bounds were left as they were.
    Capped { requested_rows: usize, requested_cols: usize },
}

#[derive(Debug, Clone, Default)]
pub struct ExpansionPolicy {
    config: ExpansionConfig,
}

impl ExpansionPolicy {
    pub fn new(config: ExpansionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Bounds a fresh sheet starts with.
    pub fn initial_bounds(&self) -> GridBounds {
        GridBounds {
            visible_rows: self.config.min_visible_rows.clamp(1, MAX_ROWS),
            visible_cols: self.config.min_visible_cols.clamp(1, MAX_COLS),
        }
    }

    /// Soft cap on `visible_rows * visible_cols`.
    pub fn cell_cap(&self) -> usize {
        self.config.performance_threshold.saturating_mul(4)
    }

    fn margin(&self, trigger: ExpansionTrigger) -> usize {
        match trigger {
            ExpansionTrigger::Navigation | ExpansionTrigger::Write => self.config.navigation_margin,
            ExpansionTrigger::Scroll => self.config.scroll_margin,
        }
    }

    /// Compute the bounds a target would ask for, without applying them.
    pub fn requested_bounds(
        &self,
        bounds: &GridBounds,
        row: usize,
        col: usize,
        trigger: ExpansionTrigger,
    ) -> GridBounds {
        let margin = self.margin(trigger);
        let mut requested = *bounds;

        if row.saturating_add(margin) >= bounds.visible_rows {
            let target = row
                .saturating_add(self.config.row_buffer)
                .max(self.config.min_visible_rows)
                .min(MAX_ROWS);
            requested.visible_rows = requested.visible_rows.max(target);
        }
        if col.saturating_add(margin) >= bounds.visible_cols {
            let target = col
                .saturating_add(self.config.col_buffer)
                .max(self.config.min_visible_cols)
                .min(MAX_COLS);
            requested.visible_cols = requested.visible_cols.max(target);
        }
        requested
    }

    /// Grow `bounds` so (row, col) is comfortably inside them.
    ///
    /// Never shrinks. If the result would exceed the soft cap the bounds are
    /// left untouched and `Capped` is returned; callers proceed regardless.
    pub fn ensure(
        &self,
        bounds: &mut GridBounds,
        row: usize,
        col: usize,
        trigger: ExpansionTrigger,
    ) -> ExpansionOutcome {
        let requested = self.requested_bounds(bounds, row, col, trigger);
        if requested == *bounds {
            return ExpansionOutcome::Unchanged;
        }

        if requested.total_cells() > self.cell_cap() {
            log::warn!(
                "grid expansion to {}x{} refused: {} cells exceeds cap of {}",
                requested.visible_rows,
                requested.visible_cols,
                requested.total_cells(),
                self.cell_cap()
            );
            return ExpansionOutcome::Capped {
                requested_rows: requested.visible_rows,
                requested_cols: requested.visible_cols,
            };
        }

        log::debug!(
            "grid bounds {}x{} -> {}x{} ({:?})",
            bounds.visible_rows,
            bounds.visible_cols,
            requested.visible_rows,
            requested.visible_cols,
            trigger
        );
        *bounds = requested;
        ExpansionOutcome::Grown {
            rows: requested.visible_rows,
            cols: requested.visible_cols,
        }
    }
}
