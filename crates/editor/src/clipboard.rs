//! In-memory clipboard record and its tab/newline text form.

use cellgrid_core::CellRange;
use cellgrid_engine::{CellRecord, CellValue, Sheet};
use cellgrid_protocol::{PastePayload, WorkerTask};

use crate::editor::{GridEditor, OpStatus};

/// Snapshot taken by copy/cut.
///
/// Blank cells are stored explicitly (an empty record in `data`, an empty
/// field in `text`) so that pasting a blank overwrites the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardRecord {
    /// Row-major, `range.row_count()` rows of `range.col_count()` records.
    pub data: Vec<Vec<CellRecord>>,
    /// Normalized source range.
    pub range: CellRange,
    /// A pending cut: the next structured paste clears the source cells
    /// outside the paste footprint, then this becomes a plain copy.
    pub is_cut: bool,
    /// What was written to the system clipboard.
    pub text: String,
}

impl ClipboardRecord {
    pub fn capture(sheet: &Sheet, range: CellRange, is_cut: bool) -> Self {
        let range = range.normalized();
        let data = sheet.records_in(&range);
        let text = to_tsv(&data);
        Self { data, range, is_cut, text }
    }

    pub fn rows(&self) -> usize {
        self.data.len()
    }

    pub fn cols(&self) -> usize {
        self.data.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// True if `text` is what this record put on the system clipboard, i.e.
    /// pasting it should use the structured form.
    pub fn matches_text(&self, text: &str) -> bool {
        normalize_newlines(text) == normalize_newlines(&self.text)
    }
}

/// Serialize records as tab-separated cells and newline-separated rows.
/// Formulas are written as their source text.
pub fn to_tsv(data: &[Vec<CellRecord>]) -> String {
    data.iter()
        .map(|row| row.iter().map(|rec| rec.value.raw_display()).collect::<Vec<_>>().join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse pasted text into rows of value-only records.
///
/// One trailing newline terminates the last row rather than starting a new
/// one; `\r\n` is accepted. Consecutive delimiters produce empty fields, and
/// rows may be ragged.
pub fn parse_tsv(text: &str) -> Vec<Vec<CellRecord>> {
    let normalized = normalize_newlines(text);
    let body = normalized.strip_suffix('\n').unwrap_or(normalized.as_str());
    if body.is_empty() {
        return Vec::new();
    }
    body.split('\n')
        .map(|line| {
            line.split('\t')
                .map(|field| CellRecord::new(CellValue::from_field(field)))
                .collect()
        })
        .collect()
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

impl GridEditor {
    /// Copy the selection. Returns the text for the system clipboard.
    pub fn copy(&mut self) -> String {
        self.capture_clipboard(false)
    }

    /// Cut the selection. Nothing changes until the cut is pasted.
    pub fn cut(&mut self) -> String {
        self.capture_clipboard(true)
    }

    fn capture_clipboard(&mut self, is_cut: bool) -> String {
        let range = self.selection.selected_range();
        let record = ClipboardRecord::capture(&self.sheet, range, is_cut);
        let text = record.text.clone();
        self.status_message = Some(format!(
            "{} {}",
            if is_cut { "Cut" } else { "Copied" },
            range.label()
        ));
        self.clipboard = Some(record);
        self.copy_highlight = true;
        text
    }

    /// Drop the clipboard record, abandoning a pending cut.
    pub fn cancel_clipboard(&mut self) {
        self.clipboard = None;
        self.copy_highlight = false;
    }

    /// Source range to outline: a pending cut, or a copy not yet hidden by a
    /// selection change.
    pub fn clipboard_highlight(&self) -> Option<CellRange> {
        self.clipboard
            .as_ref()
            .filter(|c| c.is_cut || self.copy_highlight)
            .map(|c| c.range)
    }

    /// Paste the clipboard record (values and formatting) at the active cell.
    pub fn paste(&mut self) -> OpStatus {
        self.paste_record(false)
    }

    /// Paste the clipboard record's values, leaving destination formatting.
    pub fn paste_values(&mut self) -> OpStatus {
        self.paste_record(true)
    }

    fn paste_record(&mut self, values_only: bool) -> OpStatus {
        let Some(record) = self.clipboard.as_mut() else {
            return OpStatus::NoChange;
        };
        if record.data.is_empty() {
            return OpStatus::NoChange;
        }
        let (start_row, start_col) = self.selection.active_cell();
        let payload = PastePayload {
            start_row,
            start_col,
            data: record.data.clone(),
            is_cut: record.is_cut,
            cut_range: record.is_cut.then_some(record.range),
            values_only,
        };
        // The cut is resolved by this paste; later pastes are plain copies
        if record.is_cut {
            record.is_cut = false;
            self.copy_highlight = false;
        }
        self.dispatch(WorkerTask::ComputePaste(payload))
    }

    /// Paste text from the system clipboard. Text this editor copied pastes
    /// as the structured record; anything else pastes as values.
    pub fn paste_text(&mut self, text: &str) -> OpStatus {
        if self.clipboard.as_ref().map_or(false, |c| c.matches_text(text)) {
            return self.paste();
        }
        let data = parse_tsv(text);
        if data.is_empty() {
            return OpStatus::NoChange;
        }
        let (start_row, start_col) = self.selection.active_cell();
        self.dispatch(WorkerTask::ComputePaste(PastePayload {
            start_row,
            start_col,
            data,
            is_cut: false,
            cut_range: None,
            values_only: true,
        }))
    }
}
