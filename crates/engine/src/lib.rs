//! Cell data for one sheet: the sparse store, per-cell formatting, the
//! formatting resolver and the formula evaluator used for display.

pub mod cell;
pub mod display;
pub mod format;
pub mod formula;
pub mod sheet;

pub use cell::{parse_number, CellRecord, CellValue};
pub use display::CellDisplay;
pub use format::{Alignment, CellFormat, FormatKind, FormatPatch, NumberFormat, VerticalAlignment};
pub use sheet::{EvalCache, Sheet};
