//! Framework-free grid types shared by the engine and the editor.
//!
//! Nothing in here touches cell data: ranges and selection describe *where*,
//! the viewport and expansion modules describe *what is materialized*.

pub mod expansion;
pub mod range;
pub mod selection;
pub mod viewport;

pub use range::CellRange;
pub use selection::SelectionState;

/// Platform row ceiling (Excel-compatible).
pub const MAX_ROWS: usize = 1_048_576;
/// Platform column ceiling (Excel-compatible).
pub const MAX_COLS: usize = 16_384;

/// True if (row, col) lies inside the platform-wide grid.
pub fn in_platform_bounds(row: usize, col: usize) -> bool {
    row < MAX_ROWS && col < MAX_COLS
}

/// Convert a 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA).
pub fn col_to_letters(col: usize) -> String {
    let mut s = String::new();
    let mut n = col;
    loop {
        s.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

/// Convert column letters to a 0-based index. Case-insensitive.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let v = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        acc = acc.checked_mul(26)?.checked_add(v)?;
    }
    Some(acc - 1)
}

/// Format a cell address in A1 notation.
pub fn a1(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letters(col), row + 1)
}

/// Parse an A1 address (optional `$` anchors) into 0-based (row, col).
pub fn parse_a1(addr: &str) -> Option<(usize, usize)> {
    let s = addr.trim().replace('$', "");
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    let col = letters_to_col(letters)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_letters_round_trip() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(MAX_COLS - 1), "XFD");
        assert_eq!(letters_to_col("xfd"), Some(MAX_COLS - 1));
        assert_eq!(letters_to_col("AA"), Some(26));
        assert_eq!(letters_to_col(""), None);
    }

    #[test]
    fn test_parse_a1() {
        assert_eq!(parse_a1("A1"), Some((0, 0)));
        assert_eq!(parse_a1("$B$3"), Some((2, 1)));
        assert_eq!(parse_a1("c10"), Some((9, 2)));
        assert_eq!(parse_a1("A0"), None);
        assert_eq!(parse_a1("12"), None);
        assert_eq!(parse_a1("A1B"), None);
        assert_eq!(a1(9, 2), "C10");
    }

    #[test]
    fn test_platform_bounds() {
        assert!(in_platform_bounds(MAX_ROWS - 1, MAX_COLS - 1));
        assert!(!in_platform_bounds(MAX_ROWS, 0));
        assert!(!in_platform_bounds(0, MAX_COLS));
    }
}
