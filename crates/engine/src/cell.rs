use serde::{Deserialize, Serialize};

use crate::format::CellFormat;

/// A raw cell value: `null`, a number, or a string on the wire.
///
/// Formulas are plain text beginning with `=`; they are evaluated for display
/// only and never replace the stored text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Interpret text typed into a single cell: surrounding whitespace is
    /// trimmed, then the rest follows [`CellValue::from_field`].
    pub fn from_input(input: &str) -> Self {
        Self::from_field(input.trim())
    }

    /// Interpret one field of pasted text, exactly as given.
    ///
    /// Only fields that are entirely a finite number become numeric; `"12a"`,
    /// `" 12"`, `"NaN"` and `"inf"` stay text. The empty field is `Empty`.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Empty;
        }
        match parse_number(field) {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(field.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.starts_with('='))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text a user would edit: numbers without trailing zeros, text
    /// verbatim, empty as "". Also the clipboard serialization of a cell.
    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_raw_number(*n),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

/// Strict numeric parse: digits, sign, decimal point and exponent only, and
/// the result must be finite.
pub fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    if !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) {
        return None;
    }
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_raw_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One stored cell. Created lazily on first write and never removed;
/// a cleared cell is a record holding `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "CellFormat::is_default")]
    pub formatting: CellFormat,
}

impl CellRecord {
    pub fn new(value: CellValue) -> Self {
        Self { value, formatting: CellFormat::default() }
    }

    pub fn with_format(value: CellValue, formatting: CellFormat) -> Self {
        Self { value, formatting }
    }

    /// True if the record is indistinguishable from an absent cell.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.formatting.is_default()
    }
}
