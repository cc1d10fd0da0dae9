//! Cell edits, delete, formatting and undo/redo.

use cellgrid_core::expansion::ExpansionTrigger;
use cellgrid_core::CellRange;
use cellgrid_engine::{CellRecord, CellValue, FormatPatch};

use crate::editor::GridEditor;
use crate::history::{CellChange, Command};

impl GridEditor {
    /// Commit typed input to one cell. Returns false if the value did not
    /// change (no history entry).
    pub fn edit_cell(&mut self, row: usize, col: usize, input: &str) -> bool {
        let before = self.sheet.record(row, col).clone();
        let after = CellRecord::with_format(CellValue::from_input(input), before.formatting.clone());
        if before == after {
            return false;
        }
        self.commit(Command::Edit { change: CellChange { row, col, before, after } }).is_some()
    }

    /// Commit typed input to the active cell.
    pub fn edit_active(&mut self, input: &str) -> bool {
        let (row, col) = self.selection.active_cell();
        self.edit_cell(row, col, input)
    }

    /// Clear values in the selection, keeping formatting.
    pub fn delete_selection(&mut self) -> bool {
        let range = self.selection.selected_range();
        let changes = self
            .populated_cells(&range)
            .into_iter()
            .filter_map(|(row, col)| {
                let before = self.sheet.record(row, col).clone();
                if before.value.is_empty() {
                    return None;
                }
                let after = CellRecord::with_format(CellValue::Empty, before.formatting.clone());
                Some(CellChange { row, col, before, after })
            })
            .collect();

        match Command::from_changes(changes, |changes| Command::Delete { changes }) {
            Some(cmd) => self.commit(cmd).is_some(),
            None => false,
        }
    }

    /// Merge a partial format into every selected cell as one command.
    pub fn apply_format(&mut self, patch: FormatPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let range = self.selection.selected_range();
        let changes = range
            .cells()
            .map(|(row, col)| {
                let before = self.sheet.record(row, col).clone();
                let after = CellRecord::with_format(before.value.clone(), patch.applied_to(&before.formatting));
                CellChange { row, col, before, after }
            })
            .collect();

        let kind = patch.kind();
        let label = patch.describe();
        match Command::from_changes(changes, |changes| Command::Format { changes, kind, label }) {
            Some(cmd) => self.commit(cmd).is_some(),
            None => false,
        }
    }

    /// Reset the selection's formatting to default.
    pub fn clear_formatting(&mut self) -> bool {
        self.apply_format(FormatPatch::clear())
    }

    /// Undo the last command. Undo on an empty history does nothing.
    pub fn undo(&mut self) -> Option<String> {
        let description = self.history.undo(&mut self.sheet, &mut self.layout)?;
        self.viewport.invalidate();
        self.status_message = Some(format!("Undo: {}", description));
        Some(description)
    }

    pub fn redo(&mut self) -> Option<String> {
        // Redo writes the same cells the command wrote the first time
        if let Some((row, col)) = self.history.peek_redo().and_then(Command::extent) {
            self.ensure_visible(row, col, ExpansionTrigger::Write);
        }
        let description = self.history.redo(&mut self.sheet, &mut self.layout)?;
        self.viewport.invalidate();
        self.status_message = Some(format!("Redo: {}", description));
        Some(description)
    }

    /// Cells of `range` that have a stored record. Walks whichever of the
    /// range or the store is smaller.
    pub(crate) fn populated_cells(&self, range: &CellRange) -> Vec<(usize, usize)> {
        let range = range.normalized();
        if range.cell_count() <= self.sheet.populated_count() {
            range.cells().filter(|&(r, c)| self.sheet.get_record(r, c).is_some()).collect()
        } else {
            let mut cells: Vec<_> = self
                .sheet
                .iter()
                .map(|(cell, _)| cell)
                .filter(|&(r, c)| range.contains(r, c))
                .collect();
            cells.sort_unstable();
            cells
        }
    }
}
