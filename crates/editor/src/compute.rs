//! Pure paste/fill computation.
//!
//! These functions never see the cell store: they turn a payload into a list
//! of updates and clears. The same code runs on the offload worker and, for
//! small operations or as a fallback, on the calling thread.

use cellgrid_core::{in_platform_bounds, CellRange};
use cellgrid_engine::formula::shift_formula_refs;
use cellgrid_engine::{CellRecord, CellValue, Sheet};
use cellgrid_protocol::{CellCoord, CellUpdate, ComputeResult, FillPayload, PastePayload, WorkerTask};
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::history::CellChange;

#[derive(Debug, Error, PartialEq)]
pub enum ComputeError {
    #[error("fill source has {actual} records, expected {rows}x{cols}")]
    SourceShape { rows: usize, cols: usize, actual: usize },
    #[error("fill source is empty")]
    EmptySource,
}

pub fn compute_task(task: &WorkerTask) -> Result<ComputeResult, ComputeError> {
    match task {
        WorkerTask::ComputePaste(p) => Ok(compute_paste(p)),
        WorkerTask::ComputeFill(f) => compute_fill(f),
    }
}

/// Place `data` at the start cell. For a cut, cells of the cut range that
/// the paste does not write are cleared; cells in both are written once.
pub fn compute_paste(payload: &PastePayload) -> ComputeResult {
    let mut updates = Vec::new();
    let mut footprint = FxHashSet::default();

    for (i, row) in payload.data.iter().enumerate() {
        for (j, rec) in row.iter().enumerate() {
            let r = payload.start_row + i;
            let c = payload.start_col + j;
            if !in_platform_bounds(r, c) {
                continue;
            }
            footprint.insert((r, c));
            updates.push(CellUpdate {
                row: r,
                col: c,
                value: rec.value.clone(),
                formatting: (!payload.values_only).then(|| rec.formatting.clone()),
            });
        }
    }

    let clears = match (payload.is_cut, payload.cut_range) {
        (true, Some(cut)) => cut
            .cells()
            .filter(|cell| !footprint.contains(cell))
            .map(|(row, col)| CellCoord { row, col })
            .collect(),
        _ => Vec::new(),
    };

    ComputeResult { updates, clears }
}

/// Tile the source pattern over every target cell outside the source.
///
/// The pattern is anchored at the source's top-left corner and wraps with a
/// Euclidean modulo, so fills up/left line up with fills down/right.
pub fn compute_fill(payload: &FillPayload) -> Result<ComputeResult, ComputeError> {
    let rows = payload.source_rows;
    let cols = payload.source_cols;
    if rows == 0 || cols == 0 {
        return Err(ComputeError::EmptySource);
    }
    if payload.source.len() != rows * cols {
        return Err(ComputeError::SourceShape { rows, cols, actual: payload.source.len() });
    }

    let source = payload.source_range();
    let mut updates = Vec::new();

    for (r, c) in payload.target.cells() {
        if source.contains(r, c) || !in_platform_bounds(r, c) {
            continue;
        }
        let rel_row = (r as i64 - payload.source_row as i64).rem_euclid(rows as i64) as usize;
        let rel_col = (c as i64 - payload.source_col as i64).rem_euclid(cols as i64) as usize;
        let rec = &payload.source[rel_row * cols + rel_col];

        let value = match &rec.value {
            CellValue::Text(f) if payload.shift_formulas && rec.value.is_formula() => {
                let d_row = r as i64 - (payload.source_row + rel_row) as i64;
                let d_col = c as i64 - (payload.source_col + rel_col) as i64;
                CellValue::Text(shift_formula_refs(f, d_row, d_col))
            }
            other => other.clone(),
        };

        updates.push(CellUpdate { row: r, col: c, value, formatting: Some(rec.formatting.clone()) });
    }

    Ok(ComputeResult { updates, clears: Vec::new() })
}

/// Build a fill payload from the current store contents.
pub fn fill_payload(sheet: &Sheet, source: CellRange, target: CellRange) -> FillPayload {
    let source = source.normalized();
    FillPayload {
        source: sheet.records_in(&source).into_iter().flatten().collect(),
        source_rows: source.row_count(),
        source_cols: source.col_count(),
        source_row: source.start_row,
        source_col: source.start_col,
        target: target.normalized(),
        shift_formulas: true,
    }
}

/// Turn a computed result into before/after changes against the current
/// store. Unchanged cells are dropped.
///
/// An update without formatting keeps the destination's formatting. A clear
/// resets the whole record, or only the value when `clear_values_only`.
pub fn result_changes(sheet: &Sheet, result: &ComputeResult, clear_values_only: bool) -> Vec<CellChange> {
    let mut changes = Vec::with_capacity(result.updates.len() + result.clears.len());

    for u in &result.updates {
        if !in_platform_bounds(u.row, u.col) {
            continue;
        }
        let before = sheet.record(u.row, u.col).clone();
        let formatting = u.formatting.clone().unwrap_or_else(|| before.formatting.clone());
        let after = CellRecord::with_format(u.value.clone(), formatting);
        changes.push(CellChange { row: u.row, col: u.col, before, after });
    }

    for c in &result.clears {
        if !in_platform_bounds(c.row, c.col) {
            continue;
        }
        let before = sheet.record(c.row, c.col).clone();
        let after = if clear_values_only {
            CellRecord::with_format(CellValue::Empty, before.formatting.clone())
        } else {
            CellRecord::default()
        };
        changes.push(CellChange { row: c.row, col: c.col, before, after });
    }

    changes.retain(|c| !c.is_noop());
    changes
}
