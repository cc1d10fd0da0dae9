//! Relative reference shifting for fill.

use std::sync::OnceLock;

use cellgrid_core::{col_to_letters, letters_to_col, MAX_COLS, MAX_ROWS};
use regex::{Captures, Regex};

use super::eval::ERR_REF;

fn cell_ref_re() -> &'static Regex {
    static CELL_REF_RE: OnceLock<Regex> = OnceLock::new();
    CELL_REF_RE.get_or_init(|| {
        // prefix, $col, letters, $row, digits
        Regex::new(r"(^|[^A-Za-z0-9_.$])(\$?)([A-Za-z]{1,3})(\$?)(\d+)").expect("valid regex")
    })
}

/// Shift every relative A1 reference in `formula` by (`delta_row`, `delta_col`).
///
/// `$`-anchored parts stay put. Text inside string literals and names that
/// are immediately called (`LOG10(`) are left alone. A reference pushed off
/// the grid becomes `#REF!`.
pub fn shift_formula_refs(formula: &str, delta_row: i64, delta_col: i64) -> String {
    if delta_row == 0 && delta_col == 0 {
        return formula.to_string();
    }

    // Even segments are outside quotes
    let mut out = String::with_capacity(formula.len());
    for (i, segment) in formula.split('"').enumerate() {
        if i > 0 {
            out.push('"');
        }
        if i % 2 == 1 {
            out.push_str(segment);
        } else {
            out.push_str(&shift_segment(segment, delta_row, delta_col));
        }
    }
    out
}

fn shift_segment(segment: &str, delta_row: i64, delta_col: i64) -> String {
    let re = cell_ref_re();
    let mut out = String::with_capacity(segment.len());
    let mut last = 0;

    for caps in re.captures_iter(segment) {
        let Some(whole) = caps.get(0) else { continue };
        let next = segment[whole.end()..].chars().next();
        let is_ref = !matches!(next, Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '(');

        out.push_str(&segment[last..whole.start()]);
        if is_ref {
            out.push_str(&rewrite_ref(&caps, delta_row, delta_col));
        } else {
            out.push_str(whole.as_str());
        }
        last = whole.end();
    }
    out.push_str(&segment[last..]);
    out
}

fn rewrite_ref(caps: &Captures, delta_row: i64, delta_col: i64) -> String {
    let prefix = &caps[1];
    let col_absolute = &caps[2] == "$";
    let row_absolute = &caps[4] == "$";

    let (Some(col), Ok(row_num)) = (letters_to_col(&caps[3]), caps[5].parse::<i64>()) else {
        return caps[0].to_string();
    };
    let col = col as i64;

    let new_col = if col_absolute { col } else { col + delta_col };
    let new_row = if row_absolute { row_num } else { row_num + delta_row };

    if new_col < 0 || new_col >= MAX_COLS as i64 || new_row < 1 || new_row > MAX_ROWS as i64 {
        return format!("{}{}", prefix, ERR_REF);
    }

    format!(
        "{}{}{}{}{}",
        prefix,
        if col_absolute { "$" } else { "" },
        col_to_letters(new_col as usize),
        if row_absolute { "$" } else { "" },
        new_row
    )
}
