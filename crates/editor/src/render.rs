use cellgrid_engine::{CellDisplay, EvalCache};

use crate::editor::GridEditor;

/// One materialized cell of the render window.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    pub row: usize,
    pub col: usize,
    pub display: CellDisplay,
    pub selected: bool,
    pub active: bool,
    /// Inside the copied/cut source outline.
    pub in_clipboard: bool,
    /// Inside the fill handle preview.
    pub in_fill_preview: bool,
}

impl GridEditor {
    /// Cells of the current viewport, row-major. Nothing outside the window
    /// is resolved, and formula results are shared across the window.
    pub fn render_cells(&self) -> Vec<RenderedCell> {
        let vp = self.viewport.viewport();
        let active = self.selection.active_cell();
        let clipboard = self.clipboard_highlight();
        let fill = self.fill_preview();
        let mut formulas = EvalCache::default();

        let mut cells = Vec::with_capacity(vp.cell_count());
        for row in vp.start_row..vp.end_row {
            for col in vp.start_col..vp.end_col {
                cells.push(RenderedCell {
                    row,
                    col,
                    display: self.sheet.display_with(row, col, &mut formulas),
                    selected: self.selection.is_cell_in_range(row, col),
                    active: (row, col) == active,
                    in_clipboard: clipboard.map_or(false, |r| r.contains(row, col)),
                    in_fill_preview: fill.map_or(false, |r| r.contains(row, col)),
                });
            }
        }
        cells
    }
}
