// Property-based tests for the viewport calculator and expansion policy.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use cellgrid_core::expansion::{ExpansionPolicy, ExpansionTrigger, GridBounds};
use cellgrid_core::viewport::{ViewportCalculator, ViewportInput};
use cellgrid_core::{MAX_COLS, MAX_ROWS};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn arb_bounds() -> impl Strategy<Value = GridBounds> {
    prop_oneof![
        // Small sheets that take the full-grid shortcut
        (1usize..=100, 1usize..=50),
        // Anything up to the platform ceiling
        (1usize..=MAX_ROWS, 1usize..=MAX_COLS),
    ]
    .prop_map(|(visible_rows, visible_cols)| GridBounds { visible_rows, visible_cols })
}

fn arb_input() -> impl Strategy<Value = ViewportInput> {
    (0.0..5e8f64, 0.0..5e7f64, 0.0..20_000.0f64, 0.0..20_000.0f64, 0.05..8.0f64).prop_map(
        |(scroll_top, scroll_left, client_width, client_height, zoom)| ViewportInput {
            scroll_top,
            scroll_left,
            client_width,
            client_height,
            zoom,
        },
    )
}

fn arb_trigger() -> impl Strategy<Value = ExpansionTrigger> {
    prop_oneof![
        Just(ExpansionTrigger::Navigation),
        Just(ExpansionTrigger::Write),
        Just(ExpansionTrigger::Scroll),
    ]
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn viewport_never_exceeds_render_cap(input in arb_input(), bounds in arb_bounds()) {
        let calc = ViewportCalculator::default();
        let vp = calc.compute(&input, &bounds);
        prop_assert!(vp.start_row <= vp.end_row && vp.start_col <= vp.end_col);
        prop_assert!(vp.end_row <= bounds.visible_rows);
        prop_assert!(vp.end_col <= bounds.visible_cols);
        prop_assert!(vp.cell_count() <= calc.render_cap());
    }

    #[test]
    fn expansion_is_monotonic_and_capped(
        targets in prop::collection::vec((0usize..MAX_ROWS, 0usize..MAX_COLS, arb_trigger()), 1..40),
    ) {
        let policy = ExpansionPolicy::default();
        let mut bounds = policy.initial_bounds();
        for (row, col, trigger) in targets {
            let before = bounds;
            policy.ensure(&mut bounds, row, col, trigger);
            prop_assert!(bounds.visible_rows >= before.visible_rows);
            prop_assert!(bounds.visible_cols >= before.visible_cols);
            prop_assert!(bounds.visible_rows <= MAX_ROWS && bounds.visible_cols <= MAX_COLS);
            prop_assert!(bounds.total_cells() <= policy.cell_cap());
        }
    }

    #[test]
    fn nearby_targets_always_fit(row in 0usize..5_000, col in 0usize..200) {
        let policy = ExpansionPolicy::default();
        let mut bounds = policy.initial_bounds();
        policy.ensure(&mut bounds, row, col, ExpansionTrigger::Navigation);
        prop_assert!(bounds.contains(row, col));
    }
}
