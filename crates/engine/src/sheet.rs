use std::cell::RefCell;

use cellgrid_core::{in_platform_bounds, parse_a1, CellRange};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{CellRecord, CellValue};
use crate::display::{self, CellDisplay};
use crate::format::{CellFormat, FormatPatch};
use crate::formula;

static EMPTY_VALUE: CellValue = CellValue::Empty;
static EMPTY_RECORD: CellRecord = CellRecord {
    value: CellValue::Empty,
    formatting: CellFormat::DEFAULT,
};

/// Sparse cell store: row index -> column index -> record.
///
/// Absent entries read as empty with default formatting. Every mutation bumps
/// `revision`, which offloaded computations use to detect stale results.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    rows: FxHashMap<usize, FxHashMap<usize, CellRecord>>,
    revision: u64,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of materialized records (including cleared ones).
    pub fn populated_count(&self) -> usize {
        self.rows.values().map(|cols| cols.len()).sum()
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.get_record(row, col).map(|r| &r.value).unwrap_or(&EMPTY_VALUE)
    }

    pub fn get_record(&self, row: usize, col: usize) -> Option<&CellRecord> {
        self.rows.get(&row).and_then(|cols| cols.get(&col))
    }

    /// The record at (row, col), or the empty record if none exists.
    pub fn record(&self, row: usize, col: usize) -> &CellRecord {
        self.get_record(row, col).unwrap_or(&EMPTY_RECORD)
    }

    pub fn get_format(&self, row: usize, col: usize) -> &CellFormat {
        &self.record(row, col).formatting
    }

    /// Text a user would edit in the cell.
    pub fn get_raw(&self, row: usize, col: usize) -> String {
        self.get(row, col).raw_display()
    }

    // Row-level partial merge: only the touched column is materialized.
    fn record_mut(&mut self, row: usize, col: usize) -> Option<&mut CellRecord> {
        if !in_platform_bounds(row, col) {
            log::warn!("write to ({}, {}) dropped: beyond the platform grid", row, col);
            return None;
        }
        self.revision += 1;
        Some(self.rows.entry(row).or_default().entry(col).or_default())
    }

    /// Direct, non-undoable value write.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(rec) = self.record_mut(row, col) {
            rec.value = value;
        }
    }

    /// Write typed input (trimmed, numbers recognized).
    pub fn set_input(&mut self, row: usize, col: usize, input: &str) {
        self.set(row, col, CellValue::from_input(input));
    }

    pub fn set_record(&mut self, row: usize, col: usize, record: CellRecord) {
        if let Some(rec) = self.record_mut(row, col) {
            *rec = record;
        }
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: CellFormat) {
        if let Some(rec) = self.record_mut(row, col) {
            rec.formatting = format;
        }
    }

    pub fn patch_format(&mut self, row: usize, col: usize, patch: &FormatPatch) {
        if let Some(rec) = self.record_mut(row, col) {
            patch.apply(&mut rec.formatting);
        }
    }

    /// All materialized records.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &CellRecord)> {
        self.rows
            .iter()
            .flat_map(|(row, cols)| cols.iter().map(move |(col, rec)| ((*row, *col), rec)))
    }

    /// Bounding box of all non-blank cells.
    pub fn used_range(&self) -> Option<CellRange> {
        let mut bounds: Option<CellRange> = None;
        for ((row, col), rec) in self.iter() {
            if rec.is_blank() {
                continue;
            }
            bounds = Some(match bounds {
                Some(b) => b.union_cell(row, col),
                None => CellRange::single(row, col),
            });
        }
        bounds
    }

    /// Snapshot of the normalized range, row-major, blanks included.
    pub fn records_in(&self, range: &CellRange) -> Vec<Vec<CellRecord>> {
        let r = range.normalized();
        (r.start_row..=r.end_row)
            .map(|row| (r.start_col..=r.end_col).map(|col| self.record(row, col).clone()).collect())
            .collect()
    }

    /// The value the cell displays: formulas are evaluated, everything else
    /// is returned as stored.
    pub fn computed_value(&self, row: usize, col: usize) -> CellValue {
        self.computed_value_with(row, col, &mut EvalCache::default())
    }

    /// [`Sheet::computed_value`] sharing `cache` with other reads of the same
    /// sheet state.
    ///
    /// Formula dependencies are resolved with an explicit work stack, not by
    /// recursion, so a chain of any length evaluates each cell once. A cell
    /// that (transitively) refers back to itself reads the cycle as empty.
    pub fn computed_value_with(&self, row: usize, col: usize, cache: &mut EvalCache) -> CellValue {
        let mut stack = vec![(row, col)];
        let mut visiting: FxHashSet<(usize, usize)> = FxHashSet::default();

        while let Some(&cell) = stack.last() {
            if cache.values.contains_key(&cell) {
                stack.pop();
                continue;
            }
            let Some(source) = self.formula_at(cell.0, cell.1) else {
                cache.values.insert(cell, self.get(cell.0, cell.1).clone());
                stack.pop();
                continue;
            };
            visiting.insert(cell);

            let missing = RefCell::new(None);
            let result = formula::evaluate(source, |addr| {
                let Some(dep) = parse_a1(addr) else {
                    return CellValue::Empty;
                };
                if let Some(v) = cache.values.get(&dep) {
                    return v.clone();
                }
                if self.formula_at(dep.0, dep.1).is_none() {
                    return self.get(dep.0, dep.1).clone();
                }
                if !visiting.contains(&dep) {
                    missing.borrow_mut().get_or_insert(dep);
                }
                CellValue::Empty
            });

            // Resolve one dependency at a time, then evaluate again
            match missing.into_inner() {
                Some(dep) => stack.push(dep),
                None => {
                    visiting.remove(&cell);
                    cache.values.insert(cell, result);
                    stack.pop();
                }
            }
        }

        cache.values.get(&(row, col)).cloned().unwrap_or_default()
    }

    fn formula_at(&self, row: usize, col: usize) -> Option<&str> {
        let value = self.get(row, col);
        match value {
            CellValue::Text(source) if value.is_formula() => Some(source.as_str()),
            _ => None,
        }
    }

    /// Computed value at an A1 address; malformed addresses read as empty.
    pub fn get_by_a1(&self, addr: &str) -> CellValue {
        match parse_a1(addr) {
            Some((row, col)) => self.computed_value(row, col),
            None => CellValue::Empty,
        }
    }

    /// Display string and paint properties for one cell.
    pub fn display(&self, row: usize, col: usize) -> CellDisplay {
        self.display_with(row, col, &mut EvalCache::default())
    }

    /// [`Sheet::display`] sharing formula results across a batch of cells.
    pub fn display_with(&self, row: usize, col: usize, cache: &mut EvalCache) -> CellDisplay {
        display::resolve(&self.computed_value_with(row, col, cache), self.get_format(row, col))
    }
}

/// Formula results computed during one read of an unchanged sheet. Drop it
/// once the sheet is mutated.
#[derive(Debug, Default)]
pub struct EvalCache {
    values: FxHashMap<(usize, usize), CellValue>,
}

impl EvalCache {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
