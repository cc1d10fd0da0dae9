//! The grid editor: one sheet plus everything that edits and presents it.
//!
//! Operations are split across modules by concern, each adding an
//! `impl GridEditor` block:
//! - `editing`: cell edits, delete, formatting, undo/redo
//! - `navigation`: selection, scrolling, zoom, frame-coalesced viewport
//! - `clipboard`: copy, cut, paste, paste values, text paste
//! - `fill`: fill handle drag, fill down/right
//! - `layout`: row/column resize drag
//! - `offload`: worker dispatch and response handling
//! - `render`: render window materialization

use cellgrid_config::GridSettings;
use cellgrid_core::expansion::{ExpansionOutcome, ExpansionPolicy, ExpansionTrigger, GridBounds};
use cellgrid_core::viewport::{ViewportCalculator, ViewportInput, ViewportState};
use cellgrid_core::SelectionState;
use cellgrid_engine::{CellValue, Sheet};
use rustc_hash::FxHashMap;

use crate::clipboard::ClipboardRecord;
use crate::fill::FillDrag;
use crate::history::{Command, History};
use crate::layout::{ResizeDragState, SizeOverrides};
use crate::offload::PendingOp;
use crate::worker::OffloadWorker;

/// What a paste/fill request turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    /// Applied as one command with this description.
    Applied(String),
    /// Nothing to do, or nothing would change. No history entry.
    NoChange,
    /// Sent to the offload worker under this request id.
    Pending(String),
}

pub struct GridEditor {
    pub(crate) settings: GridSettings,
    pub(crate) sheet: Sheet,
    pub(crate) layout: SizeOverrides,
    pub(crate) history: History,
    pub(crate) selection: SelectionState,
    pub(crate) bounds: GridBounds,
    pub(crate) expansion: ExpansionPolicy,
    pub(crate) calculator: ViewportCalculator,
    pub(crate) viewport: ViewportState,

    pub(crate) clipboard: Option<ClipboardRecord>,
    /// Whether a plain copy's source is still highlighted.
    pub(crate) copy_highlight: bool,
    pub(crate) fill_drag: Option<FillDrag>,
    pub(crate) resize_drag: Option<ResizeDragState>,

    pub(crate) worker: Option<OffloadWorker>,
    pub(crate) pending: FxHashMap<String, PendingOp>,

    pub(crate) status_message: Option<String>,
}

impl Default for GridEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl GridEditor {
    /// Editor with default settings.
    pub fn new() -> Self {
        Self::with_settings(GridSettings::default())
    }

    pub fn with_settings(settings: GridSettings) -> Self {
        let settings = settings.validate();
        let expansion = ExpansionPolicy::new(settings.expansion_config());
        let bounds = expansion.initial_bounds();

        let worker = if settings.offload_enabled {
            match OffloadWorker::spawn() {
                Ok(worker) => Some(worker),
                Err(e) => {
                    log::warn!("{}; computing paste/fill on the main thread", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            history: History::new(settings.history_limit, settings.coalesce_window()),
            calculator: ViewportCalculator::new(settings.viewport_config()),
            viewport: ViewportState::new(ViewportInput::default()),
            sheet: Sheet::new(),
            layout: SizeOverrides::default(),
            selection: SelectionState::default(),
            bounds,
            expansion,
            clipboard: None,
            copy_highlight: false,
            fill_drag: None,
            resize_drag: None,
            worker,
            pending: FxHashMap::default(),
            status_message: None,
            settings,
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Current logical (navigable) bounds.
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn layout(&self) -> &SizeOverrides {
        &self.layout
    }

    pub fn clipboard(&self) -> Option<&ClipboardRecord> {
        self.clipboard.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Direct, non-undoable write (loading data). The logical bounds grow
    /// first; the write lands even if they are capped.
    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        self.ensure_visible(row, col, ExpansionTrigger::Write);
        self.sheet.set(row, col, value);
    }

    /// Grow the logical bounds toward (row, col). Refusals are logged by the
    /// policy and otherwise ignored.
    pub(crate) fn ensure_visible(&mut self, row: usize, col: usize, trigger: ExpansionTrigger) -> ExpansionOutcome {
        let outcome = self.expansion.ensure(&mut self.bounds, row, col, trigger);
        if matches!(outcome, ExpansionOutcome::Grown { .. }) {
            self.viewport.invalidate();
        }
        outcome
    }

    /// Execute a command through history. No-ops are dropped. Returns the
    /// command description if it was recorded.
    pub(crate) fn commit(&mut self, command: Command) -> Option<String> {
        if let Some((row, col)) = command.extent() {
            self.ensure_visible(row, col, ExpansionTrigger::Write);
        }
        let description = command.description();
        if !self.history.execute(command, &mut self.sheet, &mut self.layout) {
            return None;
        }
        self.viewport.invalidate();
        self.status_message = Some(description.clone());
        Some(description)
    }
}
