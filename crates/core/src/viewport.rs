//! Viewport calculation.
//!
//! Turns scroll offsets + container size + zoom into the window of logical
//! rows/columns that must be materialized. Recomputation is coalesced by
//! [`ViewportState`]: scroll and resize events only mark it dirty, and the
//! host calls [`ViewportState::on_animation_frame`] once per frame.

use serde::{Deserialize, Serialize};

use crate::expansion::GridBounds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    /// Unzoomed row height in logical pixels.
    pub row_height: f32,
    /// Unzoomed column width in logical pixels.
    pub col_width: f32,
    /// Extra rows/cols rendered on each side of the visible area.
    pub buffer: usize,
    /// Hard cap on rendered rows regardless of container size or zoom.
    pub max_render_rows: usize,
    /// Hard cap on rendered columns regardless of container size or zoom.
    pub max_render_cols: usize,
    /// Below this many logical cells the whole grid is rendered.
    pub performance_threshold: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            row_height: 24.0,
            col_width: 80.0,
            buffer: 5,
            max_render_rows: 100,
            max_render_cols: 50,
            performance_threshold: 1_000_000,
        }
    }
}

/// Raw scroll-container state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportInput {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub client_width: f64,
    pub client_height: f64,
    pub zoom: f64,
}

impl Default for ViewportInput {
    fn default() -> Self {
        Self {
            scroll_top: 0.0,
            scroll_left: 0.0,
            client_width: 1280.0,
            client_height: 720.0,
            zoom: 1.0,
        }
    }
}

/// The materialized window: rows `start_row..end_row`, cols `start_col..end_col`
/// (inclusive-exclusive), plus aggregate pixel extents for scroll sizing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
    /// Full logical height in zoomed pixels (scroll container height).
    pub total_height: f64,
    /// Full logical width in zoomed pixels (scroll container width).
    pub total_width: f64,
    /// Pixel offset of `start_row` from the top of the grid.
    pub offset_top: f64,
    /// Pixel offset of `start_col` from the left of the grid.
    pub offset_left: f64,
}

impl Viewport {
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row
    }

    pub fn col_count(&self) -> usize {
        self.end_col - self.start_col
    }

    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row < self.end_row && col >= self.start_col && col < self.end_col
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewportCalculator {
    config: ViewportConfig,
}

impl ViewportCalculator {
    pub fn new(config: ViewportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Maximum cells a computed viewport can ever hold.
    pub fn render_cap(&self) -> usize {
        self.config.max_render_rows * self.config.max_render_cols
    }

    fn effective_sizes(&self, zoom: f64) -> (f64, f64) {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        let rh = (self.config.row_height as f64 * zoom).max(1.0);
        let cw = (self.config.col_width as f64 * zoom).max(1.0);
        (rh, cw)
    }

    /// True when the logical grid is small enough to skip virtualization.
    fn renders_full_grid(&self, bounds: &GridBounds) -> bool {
        bounds.total_cells() < self.config.performance_threshold
            && bounds.visible_rows <= self.config.max_render_rows
            && bounds.visible_cols <= self.config.max_render_cols
    }

    pub fn compute(&self, input: &ViewportInput, bounds: &GridBounds) -> Viewport {
        let (rh, cw) = self.effective_sizes(input.zoom);
        let total_height = bounds.visible_rows as f64 * rh;
        let total_width = bounds.visible_cols as f64 * cw;

        if self.renders_full_grid(bounds) {
            return Viewport {
                start_row: 0,
                end_row: bounds.visible_rows,
                start_col: 0,
                end_col: bounds.visible_cols,
                total_height,
                total_width,
                offset_top: 0.0,
                offset_left: 0.0,
            };
        }

        let (start_row, end_row) = axis_window(
            input.scroll_top,
            input.client_height,
            rh,
            self.config.buffer,
            bounds.visible_rows,
            self.config.max_render_rows,
        );
        let (start_col, end_col) = axis_window(
            input.scroll_left,
            input.client_width,
            cw,
            self.config.buffer,
            bounds.visible_cols,
            self.config.max_render_cols,
        );

        Viewport {
            start_row,
            end_row,
            start_col,
            end_col,
            total_height,
            total_width,
            offset_top: start_row as f64 * rh,
            offset_left: start_col as f64 * cw,
        }
    }

    /// Last row/col actually under the scroll window (unbuffered). Used for
    /// scroll-driven expansion checks.
    pub fn visible_extent(&self, input: &ViewportInput) -> (usize, usize) {
        let (rh, cw) = self.effective_sizes(input.zoom);
        let bottom = (input.scroll_top.max(0.0) + input.client_height.max(0.0)) / rh;
        let right = (input.scroll_left.max(0.0) + input.client_width.max(0.0)) / cw;
        (to_index(bottom.ceil()).saturating_sub(1), to_index(right.ceil()).saturating_sub(1))
    }
}

/// One axis of the viewport formula:
/// start = max(0, floor(scroll / size) - buffer)
/// end   = min(limit, start + ceil(client / size) + 2 * buffer), capped at start + max.
fn axis_window(scroll: f64, client: f64, size: f64, buffer: usize, limit: usize, max: usize) -> (usize, usize) {
    let first = to_index((scroll.max(0.0) / size).floor());
    let start = first.saturating_sub(buffer).min(limit);
    let span = to_index((client.max(0.0) / size).ceil()).saturating_add(2 * buffer);
    let end = start.saturating_add(span).min(limit).min(start.saturating_add(max));
    (start, end)
}

fn to_index(v: f64) -> usize {
    if v.is_finite() && v > 0.0 {
        v.min(usize::MAX as f64) as usize
    } else {
        0
    }
}

/// Viewport state record with per-frame coalescing.
///
/// Any number of scroll/resize events between two frames produce exactly one
/// recomputation.
#[derive(Debug, Clone, Default)]
pub struct ViewportState {
    input: ViewportInput,
    current: Viewport,
    dirty: bool,
    /// Events folded into an already-pending recompute.
    coalesced: u64,
}

impl ViewportState {
    pub fn new(input: ViewportInput) -> Self {
        Self {
            input,
            current: Viewport::default(),
            dirty: true,
            coalesced: 0,
        }
    }

    pub fn input(&self) -> &ViewportInput {
        &self.input
    }

    pub fn viewport(&self) -> &Viewport {
        &self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn coalesced_events(&self) -> u64 {
        self.coalesced
    }

    fn mark_dirty(&mut self) {
        if self.dirty {
            self.coalesced += 1;
        }
        self.dirty = true;
    }

    pub fn on_scroll(&mut self, scroll_top: f64, scroll_left: f64) {
        self.input.scroll_top = scroll_top;
        self.input.scroll_left = scroll_left;
        self.mark_dirty();
    }

    pub fn on_resize(&mut self, client_width: f64, client_height: f64) {
        self.input.client_width = client_width;
        self.input.client_height = client_height;
        self.mark_dirty();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.input.zoom = zoom;
        self.mark_dirty();
    }

    /// Force a recompute on the next frame (e.g. bounds grew).
    pub fn invalidate(&mut self) {
        self.mark_dirty();
    }

    /// Recompute if anything changed since the last frame.
    /// Returns the new viewport only when it was recomputed.
    pub fn on_animation_frame(&mut self, calc: &ViewportCalculator, bounds: &GridBounds) -> Option<Viewport> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        self.current = calc.compute(&self.input, bounds);
        Some(self.current)
    }
}
