//! Selection, scrolling, zoom and the frame-coalesced viewport.

use cellgrid_core::expansion::ExpansionTrigger;
use cellgrid_core::viewport::Viewport;

use crate::editor::GridEditor;

impl GridEditor {
    /// Click a cell: single-cell selection.
    pub fn select_cell(&mut self, row: usize, col: usize) {
        self.selection.set_active(row, col);
        self.after_selection_change(Some(self.selection.extent()));
    }

    /// Shift-click: extend from the anchor to (row, col).
    pub fn extend_selection(&mut self, row: usize, col: usize) {
        self.selection.extend_to(row, col);
        self.after_selection_change(Some(self.selection.extent()));
    }

    /// Arrow key: move the active cell, collapsing any range.
    pub fn move_selection(&mut self, d_row: isize, d_col: isize) {
        self.selection.move_by(d_row, d_col);
        self.after_selection_change(Some(self.selection.extent()));
    }

    /// Shift+arrow: grow or shrink the range from its far corner.
    pub fn extend_selection_by(&mut self, d_row: isize, d_col: isize) {
        self.selection.extend_by(d_row, d_col);
        self.after_selection_change(Some(self.selection.extent()));
    }

    pub fn select_row(&mut self, row: usize) {
        self.selection.select_row(row, &self.bounds);
        self.after_selection_change(Some(self.selection.active_cell()));
    }

    pub fn select_column(&mut self, col: usize) {
        self.selection.select_column(col, &self.bounds);
        self.after_selection_change(Some(self.selection.active_cell()));
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.bounds);
        self.after_selection_change(None);
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        self.selection.is_cell_in_range(row, col)
    }

    // A new selection hides a plain copy's marquee. A pending cut survives so
    // the user can pick the paste destination. Whole row/column/sheet
    // selections only expand toward their active cell.
    fn after_selection_change(&mut self, target: Option<(usize, usize)>) {
        if let Some((row, col)) = target {
            self.ensure_visible(row, col, ExpansionTrigger::Navigation);
        }
        if self.clipboard.as_ref().map_or(false, |c| !c.is_cut) {
            self.copy_highlight = false;
        }
    }

    /// Record a scroll event. The viewport is recomputed on the next frame.
    pub fn scroll_to(&mut self, scroll_top: f64, scroll_left: f64) {
        self.viewport.on_scroll(scroll_top, scroll_left);
        let (row, col) = self.calculator.visible_extent(self.viewport.input());
        self.ensure_visible(row, col, ExpansionTrigger::Scroll);
    }

    /// Record a container resize.
    pub fn resize_container(&mut self, client_width: f64, client_height: f64) {
        self.viewport.on_resize(client_width, client_height);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    /// Run the per-frame recompute. Returns the new viewport if anything
    /// changed since the previous frame.
    pub fn on_animation_frame(&mut self) -> Option<Viewport> {
        self.viewport.on_animation_frame(&self.calculator, &self.bounds)
    }

    /// The viewport as of the last frame.
    pub fn viewport(&self) -> &Viewport {
        self.viewport.viewport()
    }

    pub fn viewport_dirty(&self) -> bool {
        self.viewport.is_dirty()
    }
}
