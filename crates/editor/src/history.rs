//! Undo/Redo history for grid operations
//!
//! Every mutation is a [`Command`] carrying the before/after state of each
//! cell it touches. Commands are plain data: executing one writes its `after`
//! records, undoing it writes its `before` records.
use std::time::{Duration, Instant};

use cellgrid_core::{a1, in_platform_bounds};
use cellgrid_engine::{CellRecord, FormatKind, Sheet};

use crate::layout::{Axis, SizeOverrides};

#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub before: CellRecord,
    pub after: CellRecord,
}

impl CellChange {
    /// True if applying the change would leave the store as it is: the
    /// records match, or the cell is beyond the platform grid where writes
    /// are dropped.
    pub fn is_noop(&self) -> bool {
        self.before == self.after || !in_platform_bounds(self.row, self.col)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Single-cell edit.
    Edit { change: CellChange },
    /// Paste, including the cleared cells of a cut source.
    Paste { changes: Vec<CellChange> },
    Fill { changes: Vec<CellChange> },
    /// Clear values in a range.
    Delete { changes: Vec<CellChange> },
    Format {
        changes: Vec<CellChange>,
        kind: FormatKind,
        label: String,
    },
    /// `None` means "no explicit size".
    Resize {
        axis: Axis,
        index: usize,
        before: Option<f32>,
        after: Option<f32>,
    },
}

impl Command {
    /// Build a cell command from raw changes, dropping cells that do not
    /// change. Returns `None` if nothing changes at all.
    pub fn from_changes(
        changes: Vec<CellChange>,
        make: impl FnOnce(Vec<CellChange>) -> Command,
    ) -> Option<Command> {
        let changes: Vec<CellChange> = changes.into_iter().filter(|c| !c.is_noop()).collect();
        if changes.is_empty() {
            None
        } else {
            Some(make(changes))
        }
    }

    pub fn changes(&self) -> &[CellChange] {
        match self {
            Command::Edit { change } => std::slice::from_ref(change),
            Command::Paste { changes }
            | Command::Fill { changes }
            | Command::Delete { changes }
            | Command::Format { changes, .. } => changes,
            Command::Resize { .. } => &[],
        }
    }

    /// True if running the command would change nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Command::Resize { before, after, .. } => before == after,
            _ => self.changes().iter().all(CellChange::is_noop),
        }
    }

    pub fn execute(&self, sheet: &mut Sheet, layout: &mut SizeOverrides) {
        match self {
            Command::Resize { axis, index, after, .. } => layout.set(*axis, *index, *after),
            _ => {
                for c in self.changes() {
                    sheet.set_record(c.row, c.col, c.after.clone());
                }
            }
        }
    }

    pub fn undo(&self, sheet: &mut Sheet, layout: &mut SizeOverrides) {
        match self {
            // No prior size: drop the override rather than writing a default
            Command::Resize { axis, index, before, .. } => layout.set(*axis, *index, *before),
            _ => {
                for c in self.changes().iter().rev() {
                    sheet.set_record(c.row, c.col, c.before.clone());
                }
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            Command::Edit { change } => format!("Edit {}", a1(change.row, change.col)),
            Command::Paste { changes } => format!("Paste {}", cells_label(changes.len())),
            Command::Fill { changes } => format!("Fill {}", cells_label(changes.len())),
            Command::Delete { changes } => format!("Clear {}", cells_label(changes.len())),
            Command::Format { label, .. } => label.clone(),
            Command::Resize { axis, index, .. } => format!("Resize {}", axis.label(*index)),
        }
    }

    /// Bottom-right-most row and column written, for grid expansion.
    pub fn extent(&self) -> Option<(usize, usize)> {
        let changes = self.changes();
        let max_row = changes.iter().map(|c| c.row).max()?;
        let max_col = changes.iter().map(|c| c.col).max()?;
        Some((max_row, max_col))
    }

    fn same_cells(&self, other: &Command) -> bool {
        let a = self.changes();
        let b = other.changes();
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.row == y.row && x.col == y.col)
    }
}

fn cells_label(n: usize) -> String {
    if n == 1 {
        "1 cell".to_string()
    } else {
        format!("{} cells", n)
    }
}

#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub command: Command,
    pub at: Instant,
}

pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: usize,
    coalesce_window: Duration,
    /// Set by undo/redo so the next command never merges across them.
    barrier: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100, Duration::from_millis(500))
    }
}

impl History {
    pub fn new(max_entries: usize, coalesce_window: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
            coalesce_window,
            barrier: false,
        }
    }

    /// Run `command` and record it. No-op commands are neither run nor
    /// recorded. Returns whether the command was recorded.
    pub fn execute(&mut self, command: Command, sheet: &mut Sheet, layout: &mut SizeOverrides) -> bool {
        self.execute_at(command, sheet, layout, Instant::now())
    }

    pub(crate) fn execute_at(
        &mut self,
        command: Command,
        sheet: &mut Sheet,
        layout: &mut SizeOverrides,
        now: Instant,
    ) -> bool {
        if command.is_noop() {
            return false;
        }
        command.execute(sheet, layout);
        self.push_entry(HistoryEntry { command, at: now });
        true
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.redo_stack.clear();

        if !self.barrier {
            if let Some(last) = self.undo_stack.last_mut() {
                if Self::coalesce(last, &entry, self.coalesce_window) {
                    // Toggled back to where it started
                    if last.command.is_noop() {
                        self.undo_stack.pop();
                    }
                    return;
                }
            }
        }
        self.barrier = false;

        self.undo_stack.push(entry);
        // Limit history size
        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    // Same-kind format commands on the same cells inside the window merge:
    // earliest `before`, latest `after`.
    fn coalesce(last: &mut HistoryEntry, next: &HistoryEntry, window: Duration) -> bool {
        let (Command::Format { kind: last_kind, .. }, Command::Format { kind: next_kind, .. }) =
            (&last.command, &next.command)
        else {
            return false;
        };
        if last_kind != next_kind
            || *last_kind == FormatKind::Mixed
            || !last.command.same_cells(&next.command)
            || next.at.saturating_duration_since(last.at) > window
        {
            return false;
        }

        if let (Command::Format { changes: merged, label, .. }, Command::Format { changes: newer, label: new_label, .. }) =
            (&mut last.command, &next.command)
        {
            for (m, n) in merged.iter_mut().zip(newer) {
                m.after = n.after.clone();
            }
            *label = new_label.clone();
        }
        last.at = next.at;
        true
    }

    /// Undo the most recent command. Returns its description, or `None` if
    /// there was nothing to undo.
    pub fn undo(&mut self, sheet: &mut Sheet, layout: &mut SizeOverrides) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        entry.command.undo(sheet, layout);
        let description = entry.command.description();
        self.redo_stack.push(entry);
        self.barrier = true;
        Some(description)
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self, sheet: &mut Sheet, layout: &mut SizeOverrides) -> Option<String> {
        let entry = self.redo_stack.pop()?;
        entry.command.execute(sheet, layout);
        let description = entry.command.description();
        self.undo_stack.push(entry);
        self.barrier = true;
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// The command `undo` would revert.
    pub fn peek_undo(&self) -> Option<&Command> {
        self.undo_stack.last().map(|e| &e.command)
    }

    /// The command `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&Command> {
        self.redo_stack.last().map(|e| &e.command)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.barrier = false;
    }
}
