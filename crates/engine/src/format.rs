//! Per-cell formatting and partial format patches.

use serde::{Deserialize, Serialize};

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Numbers right, everything else left.
    #[default]
    General,
    Left,
    Center,
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Number format kind. Decimal places live on [`CellFormat`] so they can be
/// patched independently of the kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    #[default]
    General,
    Number,
    Currency,
    Percentage,
    Date,
    Time,
    /// Pattern such as `#,##0.00`, `0%` or `yyyy-mm-dd`.
    Custom(String),
}

impl NumberFormat {
    /// Decimals shown when the cell has no explicit `decimal_places`.
    pub fn default_decimals(&self) -> u8 {
        match self {
            NumberFormat::Number | NumberFormat::Currency => 2,
            _ => 0,
        }
    }
}

/// Cell formatting options. Every field is independently settable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>, // None = inherit from settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub number_format: NumberFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

impl CellFormat {
    /// The default format as a constant, for static empty records.
    pub const DEFAULT: CellFormat = CellFormat {
        font_family: None,
        font_size: None,
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
        alignment: Alignment::General,
        vertical_alignment: VerticalAlignment::Middle,
        text_color: None,
        background_color: None,
        number_format: NumberFormat::General,
        decimal_places: None,
        hyperlink: None,
    };

    pub fn is_default(&self) -> bool {
        *self == CellFormat::default()
    }

    /// Decimals to render with: explicit setting, else the kind's default.
    pub fn effective_decimals(&self) -> u8 {
        self.decimal_places.unwrap_or_else(|| self.number_format.default_decimals())
    }
}

/// Which attribute a format command touches. Drives undo coalescing: two
/// consecutive commands of the same kind on the same cells merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    FontFamily,
    FontSize,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Alignment,
    VerticalAlignment,
    TextColor,
    BackgroundColor,
    NumberFormat,
    DecimalPlaces,
    Hyperlink,
    Clear,
    Mixed,
}

/// A partial format update. `None` leaves the field alone. For the optional
/// string fields an empty string clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatPatch {
    /// Reset to the default format before applying the other fields.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_alignment: Option<VerticalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

fn opt_string(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl FormatPatch {
    /// Patch that restores the default format.
    pub fn clear() -> Self {
        Self { reset: true, ..Self::default() }
    }

    pub fn bold(on: bool) -> Self {
        Self { bold: Some(on), ..Self::default() }
    }

    pub fn italic(on: bool) -> Self {
        Self { italic: Some(on), ..Self::default() }
    }

    pub fn number_format(kind: NumberFormat) -> Self {
        Self { number_format: Some(kind), ..Self::default() }
    }

    pub fn decimal_places(places: u8) -> Self {
        Self { decimal_places: Some(places), ..Self::default() }
    }

    pub fn background(color: &str) -> Self {
        Self { background_color: Some(color.to_string()), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == FormatPatch::default()
    }

    /// Merge this patch into `format`.
    pub fn apply(&self, format: &mut CellFormat) {
        if self.reset {
            *format = CellFormat::default();
        }
        if let Some(f) = &self.font_family {
            format.font_family = opt_string(f);
        }
        if let Some(size) = self.font_size {
            format.font_size = Some(size);
        }
        if let Some(v) = self.bold {
            format.bold = v;
        }
        if let Some(v) = self.italic {
            format.italic = v;
        }
        if let Some(v) = self.underline {
            format.underline = v;
        }
        if let Some(v) = self.strikethrough {
            format.strikethrough = v;
        }
        if let Some(v) = self.alignment {
            format.alignment = v;
        }
        if let Some(v) = self.vertical_alignment {
            format.vertical_alignment = v;
        }
        if let Some(c) = &self.text_color {
            format.text_color = opt_string(c);
        }
        if let Some(c) = &self.background_color {
            format.background_color = opt_string(c);
        }
        if let Some(kind) = &self.number_format {
            format.number_format = kind.clone();
        }
        if let Some(places) = self.decimal_places {
            format.decimal_places = Some(places);
        }
        if let Some(link) = &self.hyperlink {
            format.hyperlink = opt_string(link);
        }
    }

    /// Returns `format` with this patch merged in.
    pub fn applied_to(&self, format: &CellFormat) -> CellFormat {
        let mut out = format.clone();
        self.apply(&mut out);
        out
    }

    /// The single attribute this patch touches, or `Mixed`.
    pub fn kind(&self) -> FormatKind {
        if self.reset {
            return if self.without_reset().is_empty() { FormatKind::Clear } else { FormatKind::Mixed };
        }
        let touched = [
            (self.font_family.is_some(), FormatKind::FontFamily),
            (self.font_size.is_some(), FormatKind::FontSize),
            (self.bold.is_some(), FormatKind::Bold),
            (self.italic.is_some(), FormatKind::Italic),
            (self.underline.is_some(), FormatKind::Underline),
            (self.strikethrough.is_some(), FormatKind::Strikethrough),
            (self.alignment.is_some(), FormatKind::Alignment),
            (self.vertical_alignment.is_some(), FormatKind::VerticalAlignment),
            (self.text_color.is_some(), FormatKind::TextColor),
            (self.background_color.is_some(), FormatKind::BackgroundColor),
            (self.number_format.is_some(), FormatKind::NumberFormat),
            (self.decimal_places.is_some(), FormatKind::DecimalPlaces),
            (self.hyperlink.is_some(), FormatKind::Hyperlink),
        ];
        let mut kinds = touched.iter().filter(|(set, _)| *set).map(|(_, k)| *k);
        match (kinds.next(), kinds.next()) {
            (Some(k), None) => k,
            _ => FormatKind::Mixed,
        }
    }

    fn without_reset(&self) -> FormatPatch {
        FormatPatch { reset: false, ..self.clone() }
    }

    /// Short human label, used in command descriptions.
    pub fn describe(&self) -> String {
        match self.kind() {
            FormatKind::Bold => format!("Bold {}", on_off(self.bold)),
            FormatKind::Italic => format!("Italic {}", on_off(self.italic)),
            FormatKind::Underline => format!("Underline {}", on_off(self.underline)),
            FormatKind::Strikethrough => format!("Strikethrough {}", on_off(self.strikethrough)),
            FormatKind::FontFamily => "Font".to_string(),
            FormatKind::FontSize => "Font size".to_string(),
            FormatKind::Alignment | FormatKind::VerticalAlignment => "Alignment".to_string(),
            FormatKind::TextColor => "Text color".to_string(),
            FormatKind::BackgroundColor => "Fill color".to_string(),
            FormatKind::NumberFormat => "Number format".to_string(),
            FormatKind::DecimalPlaces => "Decimal places".to_string(),
            FormatKind::Hyperlink => "Hyperlink".to_string(),
            FormatKind::Clear => "Clear formatting".to_string(),
            FormatKind::Mixed => "Format cells".to_string(),
        }
    }
}

fn on_off(v: Option<bool>) -> &'static str {
    if v.unwrap_or(false) {
        "on"
    } else {
        "off"
    }
}
