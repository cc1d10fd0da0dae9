//! Row height / column width overrides and the resize drag gesture.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::editor::GridEditor;
use crate::history::Command;

/// Smallest size a drag can produce, in unzoomed pixels.
pub const MIN_SIZE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub fn label(&self, index: usize) -> String {
        match self {
            Axis::Row => format!("row {}", index + 1),
            Axis::Column => format!("column {}", cellgrid_core::col_to_letters(index)),
        }
    }
}

/// Explicit sizes. Absent entries use the configured default, so "no
/// override" and "override equal to the default" are different states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeOverrides {
    rows: FxHashMap<usize, f32>,
    cols: FxHashMap<usize, f32>,
}

impl SizeOverrides {
    fn map(&self, axis: Axis) -> &FxHashMap<usize, f32> {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.cols,
        }
    }

    fn map_mut(&mut self, axis: Axis) -> &mut FxHashMap<usize, f32> {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.cols,
        }
    }

    pub fn get(&self, axis: Axis, index: usize) -> Option<f32> {
        self.map(axis).get(&index).copied()
    }

    /// `None` removes the override.
    pub fn set(&mut self, axis: Axis, index: usize, size: Option<f32>) {
        match size {
            Some(size) => {
                self.map_mut(axis).insert(index, size);
            }
            None => {
                self.map_mut(axis).remove(&index);
            }
        }
    }

    pub fn size_or(&self, axis: Axis, index: usize, default: f32) -> f32 {
        self.get(axis, index).unwrap_or(default)
    }

    pub fn len(&self, axis: Axis) -> usize {
        self.map(axis).len()
    }
}

/// An in-progress resize drag. The preview size follows the pointer; nothing
/// is committed until [`ResizeDragState::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDragState {
    pub axis: Axis,
    pub index: usize,
    /// Pointer position (zoomed pixels) when the drag began.
    pub start_pos: f64,
    /// Override in effect before the drag; `None` if there was none.
    pub original: Option<f32>,
    /// Effective size before the drag.
    pub base_size: f32,
    pub preview: f32,
}

impl ResizeDragState {
    pub fn begin(axis: Axis, index: usize, start_pos: f64, original: Option<f32>, default: f32) -> Self {
        let base_size = original.unwrap_or(default);
        Self { axis, index, start_pos, original, base_size, preview: base_size }
    }

    /// Track the pointer. `zoom` converts screen delta back to logical pixels.
    pub fn update(&mut self, pos: f64, zoom: f64) -> f32 {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        let delta = ((pos - self.start_pos) / zoom) as f32;
        self.preview = (self.base_size + delta).max(MIN_SIZE);
        self.preview
    }

    /// The committed size, or `None` if the drag changed nothing.
    pub fn finish(&self) -> Option<f32> {
        if (self.preview - self.base_size).abs() < f32::EPSILON {
            None
        } else {
            Some(self.preview)
        }
    }
}

impl GridEditor {
    /// Effective height of `row`, unzoomed.
    pub fn row_height(&self, row: usize) -> f32 {
        self.layout.size_or(Axis::Row, row, self.settings.row_height)
    }

    /// Effective width of `col`, unzoomed.
    pub fn col_width(&self, col: usize) -> f32 {
        self.layout.size_or(Axis::Column, col, self.settings.default_column_width)
    }

    /// Grab a row or column border at pointer position `pos`.
    pub fn begin_resize(&mut self, axis: Axis, index: usize, pos: f64) {
        let default = match axis {
            Axis::Row => self.settings.row_height,
            Axis::Column => self.settings.default_column_width,
        };
        let original = self.layout.get(axis, index);
        self.resize_drag = Some(ResizeDragState::begin(axis, index, pos, original, default));
    }

    /// Track the pointer. Returns the preview size.
    pub fn update_resize(&mut self, pos: f64) -> Option<f32> {
        let zoom = self.viewport.input().zoom;
        self.resize_drag.as_mut().map(|drag| drag.update(pos, zoom))
    }

    pub fn resize_preview(&self) -> Option<&ResizeDragState> {
        self.resize_drag.as_ref()
    }

    /// Release the border: one Resize command, or none if nothing changed.
    pub fn end_resize(&mut self) -> bool {
        let Some(drag) = self.resize_drag.take() else {
            return false;
        };
        let Some(size) = drag.finish() else {
            return false;
        };
        self.commit(Command::Resize {
            axis: drag.axis,
            index: drag.index,
            before: drag.original,
            after: Some(size),
        })
        .is_some()
    }

    pub fn cancel_resize(&mut self) {
        self.resize_drag = None;
    }
}
