use cellgrid_core::expansion::ExpansionTrigger;
use cellgrid_core::CellRange;
use cellgrid_protocol::WorkerTask;

use crate::compute::fill_payload;
use crate::editor::{GridEditor, OpStatus};

/// Fill handle drag in progress.
///
/// The preview is the bounding box of the source and the cell under the
/// pointer; it never shrinks below the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillDrag {
    pub source: CellRange,
    pub current: (usize, usize),
}

impl FillDrag {
    pub fn begin(source: CellRange) -> Self {
        let source = source.normalized();
        Self { source, current: (source.end_row, source.end_col) }
    }

    pub fn update(&mut self, row: usize, col: usize) {
        self.current = (row, col);
    }

    pub fn preview(&self) -> CellRange {
        self.source.union_cell(self.current.0, self.current.1)
    }

    /// The target rectangle to fill on release, or `None` if the preview
    /// does not reach past the source in any direction.
    pub fn target(&self) -> Option<CellRange> {
        let preview = self.preview();
        (preview != self.source).then_some(preview)
    }
}

/// Source and target for Fill Down: the first row of `range` fills the rest.
/// `None` for single-row ranges.
pub fn fill_down_ranges(range: CellRange) -> Option<(CellRange, CellRange)> {
    let r = range.normalized();
    if r.row_count() < 2 {
        return None;
    }
    Some((CellRange::new(r.start_row, r.start_col, r.start_row, r.end_col), r))
}

/// Source and target for Fill Right: the first column fills the rest.
pub fn fill_right_ranges(range: CellRange) -> Option<(CellRange, CellRange)> {
    let r = range.normalized();
    if r.col_count() < 2 {
        return None;
    }
    Some((CellRange::new(r.start_row, r.start_col, r.end_row, r.start_col), r))
}

impl GridEditor {
    /// Grab the fill handle of the current selection.
    pub fn begin_fill_drag(&mut self) {
        self.fill_drag = Some(FillDrag::begin(self.selection.selected_range()));
    }

    pub fn update_fill_drag(&mut self, row: usize, col: usize) {
        if let Some(drag) = self.fill_drag.as_mut() {
            drag.update(row, col);
            self.ensure_visible(row, col, ExpansionTrigger::Navigation);
        }
    }

    /// Range to draw as the fill preview while dragging.
    pub fn fill_preview(&self) -> Option<CellRange> {
        self.fill_drag.map(|d| d.preview())
    }

    pub fn cancel_fill_drag(&mut self) {
        self.fill_drag = None;
    }

    /// Release the fill handle. Fills only if the preview reaches past the
    /// source; the selection then covers the filled rectangle.
    pub fn end_fill_drag(&mut self) -> OpStatus {
        let Some(drag) = self.fill_drag.take() else {
            return OpStatus::NoChange;
        };
        let Some(target) = drag.target() else {
            return OpStatus::NoChange;
        };
        let status = self.fill(drag.source, target);
        self.selection.set_active(target.start_row, target.start_col);
        self.selection.extend_to(target.end_row, target.end_col);
        status
    }

    /// Copy the selection's first row down through the rest of it.
    pub fn fill_down(&mut self) -> OpStatus {
        match fill_down_ranges(self.selection.selected_range()) {
            Some((source, target)) => self.fill(source, target),
            None => OpStatus::NoChange,
        }
    }

    /// Copy the selection's first column right through the rest of it.
    pub fn fill_right(&mut self) -> OpStatus {
        match fill_right_ranges(self.selection.selected_range()) {
            Some((source, target)) => self.fill(source, target),
            None => OpStatus::NoChange,
        }
    }

    fn fill(&mut self, source: CellRange, target: CellRange) -> OpStatus {
        let payload = fill_payload(&self.sheet, source, target);
        self.dispatch(WorkerTask::ComputeFill(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_is_bounding_box() {
        let mut drag = FillDrag::begin(CellRange::new(2, 2, 3, 3));
        assert_eq!(drag.target(), None);
        drag.update(8, 2);
        assert_eq!(drag.preview(), CellRange::new(2, 2, 8, 3));
        drag.update(0, 5);
        assert_eq!(drag.preview(), CellRange::new(0, 2, 3, 5));
        assert!(drag.target().is_some());
    }

    #[test]
    fn test_pointer_inside_source_fills_nothing() {
        let mut drag = FillDrag::begin(CellRange::new(3, 3, 1, 1));
        drag.update(2, 2);
        assert_eq!(drag.target(), None);
    }

    #[test]
    fn test_fill_down_and_right_ranges() {
        let (src, tgt) = fill_down_ranges(CellRange::new(4, 1, 0, 2)).unwrap();
        assert_eq!(src, CellRange::new(0, 1, 0, 2));
        assert_eq!(tgt, CellRange::new(0, 1, 4, 2));
        assert!(fill_down_ranges(CellRange::new(0, 0, 0, 5)).is_none());

        let (src, _) = fill_right_ranges(CellRange::new(0, 0, 1, 3)).unwrap();
        assert_eq!(src, CellRange::new(0, 0, 1, 0));
        assert!(fill_right_ranges(CellRange::single(0, 0)).is_none());
    }
}
