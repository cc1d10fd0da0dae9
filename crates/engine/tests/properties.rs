// Property-based tests for value parsing, reference shifting and the store.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use cellgrid_core::{a1, MAX_COLS, MAX_ROWS};
use cellgrid_engine::formula::shift_formula_refs;
use cellgrid_engine::{CellValue, Sheet};
use proptest::prelude::*;

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn arb_formula() -> impl Strategy<Value = String> {
    prop::collection::vec((100usize..1000, 30usize..200), 1..5).prop_map(|refs| {
        let body: Vec<String> = refs.into_iter().map(|(r, c)| a1(r, c)).collect();
        format!("={}", body.join("+"))
    })
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn printed_numbers_parse_back(n in -1e12..1e12f64) {
        prop_assert_eq!(CellValue::from_field(&n.to_string()), CellValue::Number(n));
    }

    #[test]
    fn numbers_with_trailing_text_stay_text(n in -1e6..1e6f64, suffix in "[a-z]{1,3}") {
        let field = format!("{}{}", n, suffix);
        prop_assert_eq!(CellValue::from_field(&field), CellValue::Text(field.clone()));
    }

    #[test]
    fn shift_then_unshift_is_identity(
        formula in arb_formula(),
        d_row in -50i64..50,
        d_col in -20i64..20,
    ) {
        let shifted = shift_formula_refs(&formula, d_row, d_col);
        prop_assert_eq!(shift_formula_refs(&shifted, -d_row, -d_col), formula);
    }

    #[test]
    fn writes_bump_revision_only_inside_the_grid(
        writes in prop::collection::vec((0usize..MAX_ROWS + 10, 0usize..MAX_COLS + 10, -100i32..100), 1..30),
    ) {
        let mut sheet = Sheet::new();
        for (row, col, n) in writes {
            let before = sheet.revision();
            sheet.set(row, col, CellValue::Number(n as f64));
            if row < MAX_ROWS && col < MAX_COLS {
                prop_assert!(sheet.revision() > before);
                prop_assert_eq!(sheet.get(row, col), &CellValue::Number(n as f64));
            } else {
                prop_assert_eq!(sheet.revision(), before);
                prop_assert!(sheet.get(row, col).is_empty());
            }
        }
    }
}
