//! Formatting resolver: raw value + format -> display string and paint
//! properties.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::cell::CellValue;
use crate::format::{Alignment, CellFormat, NumberFormat, VerticalAlignment};
use crate::formula::is_error_sentinel;

/// Everything a renderer needs to paint one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDisplay {
    pub text: String,
    /// Resolved alignment; never `General`.
    pub align: Alignment,
    pub vertical_align: VerticalAlignment,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub hyperlink: Option<String>,
    pub is_error: bool,
}

/// Resolve `value` (already evaluated if it was a formula) under `format`.
pub fn resolve(value: &CellValue, format: &CellFormat) -> CellDisplay {
    let (text, numeric) = match value {
        CellValue::Empty => (String::new(), false),
        CellValue::Number(n) => (format_number(*n, format), true),
        CellValue::Text(s) => (s.clone(), false),
    };
    let is_error = matches!(value, CellValue::Text(s) if is_error_sentinel(s));

    let align = match format.alignment {
        Alignment::General if numeric => Alignment::Right,
        Alignment::General if is_error => Alignment::Center,
        Alignment::General => Alignment::Left,
        other => other,
    };

    CellDisplay {
        text,
        align,
        vertical_align: format.vertical_alignment,
        bold: format.bold,
        italic: format.italic,
        underline: format.underline || format.hyperlink.is_some(),
        strikethrough: format.strikethrough,
        font_family: format.font_family.clone(),
        font_size: format.font_size,
        text_color: format.text_color.clone(),
        background_color: format.background_color.clone(),
        hyperlink: format.hyperlink.clone(),
        is_error,
    }
}

/// Format a number per the cell's number format.
pub fn format_number(n: f64, format: &CellFormat) -> String {
    let decimals = format.effective_decimals() as usize;
    match &format.number_format {
        NumberFormat::General => match format.decimal_places {
            Some(places) => format!("{:.*}", places as usize, n),
            None => general(n),
        },
        NumberFormat::Number => with_thousands(n, decimals),
        NumberFormat::Currency => {
            if n < 0.0 {
                format!("-${}", with_thousands(n.abs(), decimals))
            } else {
                format!("${}", with_thousands(n, decimals))
            }
        }
        NumberFormat::Percentage => format!("{:.*}%", decimals, n * 100.0),
        NumberFormat::Date => serial_to_datetime(n)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| general(n)),
        NumberFormat::Time => serial_to_datetime(n)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| general(n)),
        NumberFormat::Custom(pattern) => format_custom(n, pattern),
    }
}

// Up to 10 significant decimals, trailing zeros trimmed
fn general(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    if n.abs() >= 1e15 || (n != 0.0 && n.abs() < 1e-9) {
        return format!("{:e}", n);
    }
    let s = format!("{:.10}", n);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn with_thousands(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Spreadsheet serial (days since 1899-12-30, fraction = time of day).
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(secs))
}

/// Custom patterns: `#,##0.00`, `0.0%`, `$#,##0`, `yyyy-mm-dd`, `hh:mm`.
/// Text in double quotes is a literal (`0.00 "USD"`).
fn format_custom(n: f64, pattern: &str) -> String {
    let codes = without_literals(pattern).to_ascii_lowercase();
    if codes.contains('y') || codes.contains('d') || codes.contains('h') {
        return match serial_to_datetime(n) {
            Some(dt) => dt.format(&date_pattern_to_chrono(pattern)).to_string(),
            None => general(n),
        };
    }

    let mut quoted = false;
    let digit_positions: Vec<usize> = pattern
        .char_indices()
        .filter_map(|(i, ch)| {
            if ch == '"' {
                quoted = !quoted;
                return None;
            }
            (!quoted && (ch == '#' || ch == '0')).then_some(i)
        })
        .collect();
    let (Some(&first), Some(&last)) = (digit_positions.first(), digit_positions.last()) else {
        return format!("{}{}", pattern.replace('"', ""), general(n));
    };
    let prefix = pattern[..first].replace('"', "");
    let body = &pattern[first..=last];
    let suffix = &pattern[last + 1..];

    let decimals = body.split_once('.').map(|(_, f)| f.chars().filter(|c| *c == '0' || *c == '#').count()).unwrap_or(0);
    let value = if without_literals(suffix).contains('%') { n * 100.0 } else { n };
    let digits = if body.contains(',') {
        with_thousands(value.abs(), decimals)
    } else {
        format!("{:.*}", decimals, value.abs())
    };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}{}{}", sign, prefix, digits, suffix.replace('"', ""))
}

// Even segments of a `"`-split pattern are format codes, odd ones literals
fn without_literals(pattern: &str) -> String {
    pattern.split('"').step_by(2).collect()
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

fn date_pattern_to_chrono(pattern: &str) -> String {
    let has_hours = without_literals(pattern).to_ascii_lowercase().contains('h');
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '"' {
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        let c = chars[i].to_ascii_lowercase();
        let run = chars[i..].iter().take_while(|x| x.to_ascii_lowercase() == c).count();
        let token = match (c, run) {
            ('y', 4..) => "%Y",
            ('y', _) => "%y",
            // mm after hours is minutes
            ('m', _) if has_hours && out.contains("%H") => "%M",
            ('m', 3..) => "%b",
            ('m', _) => "%m",
            ('d', _) => "%d",
            ('h', _) => "%H",
            ('s', _) => "%S",
            _ => "",
        };
        if token.is_empty() {
            for &ch in &chars[i..i + run] {
                push_literal(&mut out, ch);
            }
        } else {
            out.push_str(token);
        }
        i += run;
    }
    out
}
