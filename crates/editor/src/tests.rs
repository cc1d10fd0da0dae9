//! Scenario tests for the grid editor
//!
//! End-to-end flows through `GridEditor`: edits and undo, clipboard with cut
//! resolution, fill handle tiling, formatting coalescing, resize, and the
//! offload worker with stale and failed responses.

use std::time::Duration;

use cellgrid_config::GridSettings;
use cellgrid_core::{CellRange, MAX_COLS, MAX_ROWS};
use cellgrid_engine::{CellFormat, CellRecord, CellValue, FormatPatch};
use cellgrid_protocol::{ComputeResult, WorkerResponse, WorkerTask};

use crate::editor::{GridEditor, OpStatus};
use crate::history::Command;
use crate::layout::Axis;
use crate::worker::OffloadWorker;

fn editor() -> GridEditor {
    GridEditor::with_settings(GridSettings { offload_enabled: false, ..GridSettings::default() })
}

/// Editor that offloads anything larger than `threshold` cells.
fn offload_editor(threshold: usize) -> GridEditor {
    GridEditor::with_settings(GridSettings {
        offload_enabled: true,
        offload_threshold: threshold,
        worker_timeout_ms: 10_000,
        ..GridSettings::default()
    })
}

fn num(ed: &GridEditor, row: usize, col: usize) -> Option<f64> {
    ed.sheet().get(row, col).as_number()
}

fn select(ed: &mut GridEditor, r1: usize, c1: usize, r2: usize, c2: usize) {
    ed.select_cell(r1, c1);
    ed.extend_selection(r2, c2);
}

// =========================================================================
// Editing and history
// =========================================================================

#[test]
fn test_edit_undo_redo() {
    let mut ed = editor();
    assert!(ed.edit_cell(0, 0, "42"));
    assert_eq!(num(&ed, 0, 0), Some(42.0));

    assert_eq!(ed.undo().as_deref(), Some("Edit A1"));
    assert_eq!(ed.sheet().get(0, 0), &CellValue::Empty);
    assert_eq!(ed.status_message(), Some("Undo: Edit A1"));

    assert_eq!(ed.redo().as_deref(), Some("Edit A1"));
    assert_eq!(num(&ed, 0, 0), Some(42.0));
}

#[test]
fn test_noop_edit_creates_no_history() {
    let mut ed = editor();
    ed.edit_cell(3, 3, "hello");
    assert_eq!(ed.history().undo_len(), 1);

    assert!(!ed.edit_cell(3, 3, "hello"));
    assert!(!ed.edit_cell(3, 3, "  hello  "), "trimmed input equals current value");
    assert_eq!(ed.history().undo_len(), 1);

    // Clearing an already-empty cell is also a no-op
    assert!(!ed.edit_cell(9, 9, ""));
    assert_eq!(ed.history().undo_len(), 1);
}

#[test]
fn test_undo_redo_on_empty_history() {
    let mut ed = editor();
    assert_eq!(ed.undo(), None);
    assert_eq!(ed.redo(), None);
    assert!(!ed.can_undo());
}

#[test]
fn test_edit_keeps_cell_formatting() {
    let mut ed = editor();
    ed.select_cell(1, 1);
    ed.apply_format(FormatPatch::bold(true));
    ed.edit_active("x");
    assert!(ed.sheet().get_format(1, 1).bold);
}

#[test]
fn test_delete_selection_clears_values_only() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    ed.edit_cell(1, 0, "2");
    select(&mut ed, 0, 0, 1, 0);
    ed.apply_format(FormatPatch::italic(true));

    assert!(ed.delete_selection());
    assert_eq!(ed.sheet().get(0, 0), &CellValue::Empty);
    assert!(ed.sheet().get_format(1, 0).italic, "formatting survives delete");
    assert_eq!(ed.history().peek_undo().map(Command::description).as_deref(), Some("Clear 2 cells"));

    assert!(!ed.delete_selection(), "nothing left to clear");
    ed.undo();
    assert_eq!(num(&ed, 1, 0), Some(2.0));
}

#[test]
fn test_far_write_succeeds_even_when_capped() {
    let mut ed = editor();
    let before = ed.bounds();
    assert!(ed.edit_cell(500_000, 2, "7"));
    assert_eq!(num(&ed, 500_000, 2), Some(7.0));
    // 500_100 x 26 exceeds the soft cap; the bounds stay put but never shrink
    assert!(ed.bounds().visible_rows >= before.visible_rows);

    ed.set_value(600_000, 1, CellValue::Number(1.0));
    assert_eq!(num(&ed, 600_000, 1), Some(1.0));
}

#[test]
fn test_edit_beyond_platform_grid_is_not_recorded() {
    let mut ed = editor();
    assert!(!ed.edit_cell(MAX_ROWS, 0, "x"));
    assert!(!ed.edit_cell(0, MAX_COLS, "x"));
    assert!(!ed.can_undo());
    assert_eq!(ed.sheet().get(MAX_ROWS, 0), &CellValue::Empty);
}

#[test]
fn test_paste_clipped_at_platform_edge_records_only_stored_cells() {
    let mut ed = editor();
    ed.select_cell(MAX_ROWS - 1, 0);
    assert_eq!(ed.paste_text("1\n2\n3"), OpStatus::Applied("Paste 1 cell".to_string()));
    ed.undo();
    assert!(!ed.can_undo());
    assert_eq!(ed.sheet().get(MAX_ROWS - 1, 0), &CellValue::Empty);
}

#[test]
fn test_navigation_grows_bounds() {
    let mut ed = editor();
    ed.select_cell(95, 0);
    assert_eq!(ed.bounds().visible_rows, 195);
    ed.move_selection(-90, 0);
    assert_eq!(ed.bounds().visible_rows, 195, "bounds never shrink");
}

// =========================================================================
// Formatting
// =========================================================================

#[test]
fn test_format_coalescing_through_editor() {
    let mut ed = editor();
    select(&mut ed, 0, 0, 1, 1);
    ed.apply_format(FormatPatch::bold(true));
    ed.apply_format(FormatPatch::bold(false));
    ed.apply_format(FormatPatch::bold(true));
    assert_eq!(ed.history().undo_len(), 1, "rapid same-kind toggles coalesce");

    ed.undo();
    assert!(!ed.sheet().get_format(0, 0).bold);
    assert!(ed.sheet().get_format(1, 1).is_default());
}

#[test]
fn test_format_different_kind_is_separate_step() {
    let mut ed = editor();
    ed.select_cell(2, 2);
    ed.apply_format(FormatPatch::bold(true));
    ed.apply_format(FormatPatch::italic(true));
    assert_eq!(ed.history().undo_len(), 2);
    ed.undo();
    let f = ed.sheet().get_format(2, 2);
    assert!(f.bold && !f.italic);
}

#[test]
fn test_clear_formatting() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "5");
    ed.select_cell(0, 0);
    ed.apply_format(FormatPatch::background("#ff0000"));
    assert!(ed.clear_formatting());
    assert!(ed.sheet().get_format(0, 0).is_default());
    assert_eq!(num(&ed, 0, 0), Some(5.0), "value untouched");
    assert!(!ed.clear_formatting(), "already default");
}

// =========================================================================
// Clipboard
// =========================================================================

#[test]
fn test_copy_paste_round_trip_with_blanks() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    ed.edit_cell(1, 1, "text");
    // Destination has stale data where the source is blank
    ed.edit_cell(10, 11, "stale");

    select(&mut ed, 0, 0, 1, 1);
    let text = ed.copy();
    assert_eq!(text, "1\t\n\ttext");

    ed.select_cell(10, 10);
    // The blank-onto-blank cell is unchanged and not counted
    assert_eq!(ed.paste(), OpStatus::Applied("Paste 3 cells".to_string()));
    assert_eq!(num(&ed, 10, 10), Some(1.0));
    assert_eq!(ed.sheet().get(10, 11), &CellValue::Empty, "blank overwrote stale value");
    assert_eq!(ed.sheet().get(11, 11), &CellValue::Text("text".into()));
}

#[test]
fn test_paste_carries_formatting_and_paste_values_does_not() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "3");
    ed.select_cell(0, 0);
    ed.apply_format(FormatPatch::bold(true));
    ed.copy();

    ed.select_cell(5, 0);
    ed.paste();
    assert!(ed.sheet().get_format(5, 0).bold);

    ed.select_cell(6, 0);
    ed.apply_format(FormatPatch::italic(true));
    ed.paste_values();
    let f = ed.sheet().get_format(6, 0);
    assert!(f.italic && !f.bold);
    assert_eq!(num(&ed, 6, 0), Some(3.0));
}

#[test]
fn test_cut_paste_disjoint_moves_cells() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    ed.edit_cell(0, 1, "2");
    select(&mut ed, 0, 0, 0, 1);
    ed.cut();

    ed.select_cell(5, 5);
    ed.paste();
    assert_eq!(ed.sheet().get(0, 0), &CellValue::Empty);
    assert_eq!(ed.sheet().get(0, 1), &CellValue::Empty);
    assert_eq!((num(&ed, 5, 5), num(&ed, 5, 6)), (Some(1.0), Some(2.0)));

    // One undo restores both sides
    ed.undo();
    assert_eq!((num(&ed, 0, 0), num(&ed, 0, 1)), (Some(1.0), Some(2.0)));
    assert_eq!(ed.sheet().get(5, 5), &CellValue::Empty);
}

#[test]
fn test_cut_paste_overlapping() {
    let mut ed = editor();
    for (i, v) in ["1", "2", "3", "4"].iter().enumerate() {
        ed.edit_cell(i / 2, i % 2, v);
    }
    select(&mut ed, 0, 0, 1, 1);
    ed.cut();

    ed.select_cell(1, 1);
    ed.paste();
    // B2 is in both footprints: holds the pasted value
    assert_eq!(num(&ed, 1, 1), Some(1.0));
    assert_eq!((num(&ed, 1, 2), num(&ed, 2, 1), num(&ed, 2, 2)), (Some(2.0), Some(3.0), Some(4.0)));
    for (r, c) in [(0, 0), (0, 1), (1, 0)] {
        assert_eq!(ed.sheet().get(r, c), &CellValue::Empty, "({}, {}) cleared", r, c);
    }
}

#[test]
fn test_cut_is_resolved_by_first_paste() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "9");
    ed.select_cell(0, 0);
    ed.cut();
    ed.select_cell(3, 0);
    ed.paste();
    assert!(!ed.clipboard().map_or(true, |c| c.is_cut));

    // Refill the source; a second paste must not clear it again
    ed.edit_cell(0, 0, "10");
    ed.select_cell(6, 0);
    ed.paste();
    assert_eq!(num(&ed, 0, 0), Some(10.0));
    assert_eq!(num(&ed, 6, 0), Some(9.0));
}

#[test]
fn test_selection_clears_copy_highlight_but_not_cut() {
    let mut ed = editor();
    ed.select_cell(0, 0);
    ed.copy();
    assert_eq!(ed.clipboard_highlight(), Some(CellRange::single(0, 0)));
    ed.select_cell(4, 4);
    assert_eq!(ed.clipboard_highlight(), None);
    assert!(ed.clipboard().is_some(), "copy data survives");

    ed.select_cell(0, 0);
    ed.cut();
    ed.select_cell(4, 4);
    assert_eq!(ed.clipboard_highlight(), Some(CellRange::single(0, 0)));

    ed.cancel_clipboard();
    assert!(ed.clipboard().is_none());
    assert_eq!(ed.paste(), OpStatus::NoChange);
}

#[test]
fn test_paste_text_numbers_and_blanks() {
    let mut ed = editor();
    ed.edit_cell(0, 1, "old");
    ed.select_cell(0, 0);
    ed.paste_text("12\t\t12a\n-3.5\tx\n");
    assert_eq!(num(&ed, 0, 0), Some(12.0));
    assert_eq!(ed.sheet().get(0, 1), &CellValue::Empty);
    assert_eq!(ed.sheet().get(0, 2), &CellValue::Text("12a".into()));
    assert_eq!(num(&ed, 1, 0), Some(-3.5));
    assert_eq!(ed.sheet().get(2, 0), &CellValue::Empty, "trailing newline adds no row");
    assert_eq!(ed.paste_text(""), OpStatus::NoChange);
}

#[test]
fn test_paste_text_keeps_destination_formatting() {
    let mut ed = editor();
    ed.select_cell(5, 5);
    ed.apply_format(FormatPatch::bold(true));
    ed.paste_text("x");
    assert_eq!(ed.sheet().get(5, 5), &CellValue::Text("x".into()));
    assert!(ed.sheet().get_format(5, 5).bold);
}

#[test]
fn test_paste_text_of_own_copy_is_structured() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    ed.select_cell(0, 0);
    ed.apply_format(FormatPatch::italic(true));
    let text = ed.copy();

    ed.select_cell(2, 2);
    ed.paste_text(&text);
    assert!(ed.sheet().get_format(2, 2).italic, "formatting came from the record");
}

// =========================================================================
// Fill
// =========================================================================

#[test]
fn test_fill_drag_tiles_right() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "10");
    ed.edit_cell(0, 1, "20");
    select(&mut ed, 0, 0, 0, 1);

    ed.begin_fill_drag();
    ed.update_fill_drag(0, 6);
    assert_eq!(ed.fill_preview(), Some(CellRange::new(0, 0, 0, 6)));
    assert_eq!(ed.end_fill_drag(), OpStatus::Applied("Fill 5 cells".to_string()));

    let row: Vec<_> = (0..7).map(|c| num(&ed, 0, c)).collect();
    assert_eq!(row, [10.0, 20.0, 10.0, 20.0, 10.0, 20.0, 10.0].map(Some));
    assert_eq!(ed.selection().selected_range(), CellRange::new(0, 0, 0, 6));

    ed.undo();
    assert!((2..7).all(|c| ed.sheet().get(0, c).is_empty()));
}

#[test]
fn test_fill_drag_up_restores_overwritten_cells() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "keep");
    ed.edit_cell(3, 0, "a");
    ed.edit_cell(4, 0, "b");
    select(&mut ed, 3, 0, 4, 0);

    ed.begin_fill_drag();
    ed.update_fill_drag(0, 0);
    ed.end_fill_drag();
    let col: Vec<_> = (0..3).map(|r| ed.sheet().get_raw(r, 0)).collect();
    assert_eq!(col, ["b", "a", "b"]);

    ed.undo();
    assert_eq!(ed.sheet().get_raw(0, 0), "keep");
    assert_eq!(ed.sheet().get(1, 0), &CellValue::Empty);
}

#[test]
fn test_fill_drag_inside_source_is_noop() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    select(&mut ed, 0, 0, 2, 2);
    ed.begin_fill_drag();
    ed.update_fill_drag(1, 1);
    assert_eq!(ed.end_fill_drag(), OpStatus::NoChange);
    assert_eq!(ed.history().undo_len(), 1);
}

#[test]
fn test_fill_down_shifts_formulas() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    ed.edit_cell(1, 0, "2");
    ed.edit_cell(2, 0, "3");
    ed.edit_cell(0, 1, "=A1*2");
    select(&mut ed, 0, 1, 2, 1);
    ed.fill_down();

    assert_eq!(ed.sheet().get_raw(2, 1), "=A3*2");
    assert_eq!(ed.sheet().computed_value(2, 1), CellValue::Number(6.0));
    assert_eq!(ed.sheet().display(1, 1).text, "4");
}

#[test]
fn test_fill_down_long_formula_chain_displays() {
    let mut ed = offload_editor(10_000);
    ed.edit_cell(0, 0, "1");
    ed.edit_cell(1, 0, "=A1+1");
    select(&mut ed, 1, 0, 50_000, 0);
    assert!(matches!(ed.fill_down(), OpStatus::Pending(_)));
    ed.finish_offload();

    assert_eq!(ed.sheet().get_raw(50_000, 0), "=A50000+1");
    assert_eq!(ed.sheet().computed_value(50_000, 0), CellValue::Number(50_001.0));

    // Scrolled to the bottom, the render window resolves the end of the chain
    ed.scroll_to(50_000.0 * 24.0, 0.0);
    ed.on_animation_frame();
    let last = ed
        .render_cells()
        .into_iter()
        .find(|c| c.row == 50_000 && c.col == 0)
        .expect("last filled row is in the window");
    assert_eq!(last.display.text, "50001");
}

#[test]
fn test_fill_right_copies_format() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "x");
    ed.select_cell(0, 0);
    ed.apply_format(FormatPatch::bold(true));
    select(&mut ed, 0, 0, 0, 3);
    ed.fill_right();
    assert!(ed.sheet().get_format(0, 3).bold);
    assert_eq!(ed.sheet().get_raw(0, 3), "x");
    assert_eq!(ed.fill_down(), OpStatus::NoChange, "single row");
}

// =========================================================================
// Resize
// =========================================================================

#[test]
fn test_resize_drag_single_command() {
    let mut ed = editor();
    ed.begin_resize(Axis::Column, 1, 200.0);
    ed.update_resize(220.0);
    ed.update_resize(260.0);
    assert!(ed.end_resize());
    assert_eq!(ed.col_width(1), 140.0);
    assert_eq!(ed.history().undo_len(), 1);

    assert_eq!(ed.undo().as_deref(), Some("Resize column B"));
    assert_eq!(ed.layout().get(Axis::Column, 1), None, "override removed, not set to default");
    assert_eq!(ed.col_width(1), 80.0);
}

#[test]
fn test_resize_without_movement_records_nothing() {
    let mut ed = editor();
    ed.begin_resize(Axis::Row, 0, 10.0);
    ed.update_resize(10.0);
    assert!(!ed.end_resize());
    assert!(!ed.can_undo());
}

// =========================================================================
// Viewport and rendering
// =========================================================================

#[test]
fn test_small_grid_renders_fully() {
    let mut ed = editor();
    let vp = ed.on_animation_frame().unwrap();
    assert_eq!((vp.end_row, vp.end_col), (100, 26));
    assert_eq!(ed.render_cells().len(), 2600);
}

#[test]
fn test_frame_coalescing() {
    let mut ed = editor();
    ed.on_animation_frame();
    ed.scroll_to(24.0, 0.0);
    ed.scroll_to(48.0, 0.0);
    ed.resize_container(800.0, 600.0);
    assert!(ed.on_animation_frame().is_some());
    assert!(ed.on_animation_frame().is_none(), "nothing changed since last frame");
}

#[test]
fn test_scroll_grows_bounds_and_virtualizes() {
    let mut ed = editor();
    ed.scroll_to(24.0 * 80.0, 0.0);
    assert!(ed.bounds().visible_rows > 100);
    let vp = ed.on_animation_frame().unwrap();
    assert!(vp.start_row > 0);
    let cells = ed.render_cells();
    assert_eq!(cells.len(), vp.cell_count());
    assert!(cells.len() <= 100 * 50);
    assert!(cells.iter().all(|c| vp.contains(c.row, c.col)));
}

#[test]
fn test_render_flags() {
    let mut ed = editor();
    ed.edit_cell(1, 1, "5");
    select(&mut ed, 1, 1, 2, 2);
    ed.copy();
    ed.begin_fill_drag();
    ed.update_fill_drag(4, 2);
    ed.on_animation_frame();

    let cells = ed.render_cells();
    let at = |r: usize, c: usize| cells.iter().find(|x| x.row == r && x.col == c).unwrap();
    assert!(at(1, 1).active && at(1, 1).selected);
    assert!(at(2, 2).selected && !at(2, 2).active);
    assert!(at(2, 2).in_clipboard);
    assert!(at(4, 2).in_fill_preview && !at(4, 2).selected);
    assert_eq!(at(1, 1).display.text, "5");
}

// =========================================================================
// Offload worker
// =========================================================================

#[test]
fn test_large_paste_is_offloaded_as_one_command() {
    let mut ed = offload_editor(2);
    ed.select_cell(0, 0);
    let status = ed.paste_text("1\t2\n3\t4");
    assert!(matches!(status, OpStatus::Pending(_)));
    assert_eq!(ed.pending_count(), 1);
    assert_eq!(ed.sheet().get(0, 0), &CellValue::Empty, "not applied until the response");

    let statuses = ed.finish_offload();
    assert_eq!(statuses, vec![OpStatus::Applied("Paste 4 cells".to_string())]);
    assert_eq!(num(&ed, 1, 1), Some(4.0));
    assert_eq!(ed.history().undo_len(), 1);

    ed.undo();
    assert!(ed.sheet().used_range().is_none());
}

#[test]
fn test_small_paste_stays_inline() {
    let mut ed = offload_editor(100);
    ed.select_cell(0, 0);
    assert!(matches!(ed.paste_text("1\t2"), OpStatus::Applied(_)));
    assert_eq!(ed.pending_count(), 0);
}

#[test]
fn test_stale_fill_response_is_recomputed() {
    let mut ed = offload_editor(2);
    ed.edit_cell(0, 0, "1");
    select(&mut ed, 0, 0, 9, 0);
    assert!(matches!(ed.fill_down(), OpStatus::Pending(_)));

    // The source changes while the worker computes
    ed.edit_cell(0, 0, "5");
    ed.finish_offload();
    assert!((1..10).all(|r| num(&ed, r, 0) == Some(5.0)));
}

#[test]
fn test_failed_worker_falls_back_inline() {
    let mut ed = offload_editor(2);
    ed.worker = Some(
        OffloadWorker::spawn_with(Box::new(|_: &WorkerTask| Err::<ComputeResult, _>("out of memory".to_string())))
            .unwrap(),
    );
    ed.select_cell(0, 0);
    assert!(matches!(ed.paste_text("a\tb\tc"), OpStatus::Pending(_)));

    let statuses = ed.finish_offload();
    assert_eq!(statuses, vec![OpStatus::Applied("Paste 3 cells".to_string())]);
    assert_eq!(ed.sheet().get_raw(0, 2), "c");
}

#[test]
fn test_out_of_order_responses_are_correlated() {
    let mut ed = offload_editor(1);
    ed.select_cell(0, 0);
    let OpStatus::Pending(first) = ed.paste_text("1\t1") else { panic!("expected offload") };
    ed.select_cell(5, 0);
    let OpStatus::Pending(second) = ed.paste_text("2\t2") else { panic!("expected offload") };

    // Deliver the second response before the first
    let worker = ed.worker.take().unwrap();
    let mut responses = vec![
        worker.recv_timeout(Duration::from_secs(10)).unwrap(),
        worker.recv_timeout(Duration::from_secs(10)).unwrap(),
    ];
    responses.sort_by_key(|r| if r.request_id == second { 0 } else { 1 });
    assert_eq!(responses[1].request_id, first);

    for resp in responses {
        assert!(matches!(ed.handle_response(resp), Some(OpStatus::Applied(_))));
    }
    assert_eq!(num(&ed, 0, 1), Some(1.0));
    assert_eq!(num(&ed, 5, 1), Some(2.0));
    assert_eq!(ed.history().undo_len(), 2);
}

#[test]
fn test_unknown_response_is_ignored() {
    let mut ed = editor();
    let resp = WorkerResponse::success("never-issued", ComputeResult::default());
    assert_eq!(ed.handle_response(resp), None);
    assert!(!ed.can_undo());
}

#[test]
fn test_worker_result_without_changes_records_nothing() {
    let mut ed = offload_editor(1);
    ed.set_value(0, 0, CellValue::Number(1.0));
    ed.set_value(0, 1, CellValue::Number(2.0));
    ed.select_cell(0, 0);
    assert!(matches!(ed.paste_text("1\t2"), OpStatus::Pending(_)));
    assert_eq!(ed.finish_offload(), vec![OpStatus::NoChange]);
    assert!(!ed.can_undo());
}

#[test]
fn test_cleared_cut_cells_lose_formatting() {
    let mut ed = editor();
    ed.edit_cell(0, 0, "1");
    ed.select_cell(0, 0);
    ed.apply_format(FormatPatch::bold(true));
    ed.cut();
    ed.select_cell(3, 3);
    ed.paste();
    assert_eq!(ed.sheet().record(0, 0), &CellRecord::default());
    assert_eq!(ed.sheet().get_format(3, 3), &CellFormat { bold: true, ..CellFormat::default() });
}
