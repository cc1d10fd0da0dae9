//! Grid editor: command history, clipboard and fill, the offload worker, and
//! the [`GridEditor`] facade tying them to one sheet.

pub mod clipboard;
pub mod compute;
mod editing;
pub mod editor;
pub mod fill;
pub mod history;
pub mod layout;
mod navigation;
pub mod offload;
pub mod render;
pub mod worker;

#[cfg(test)]
mod tests;

pub use clipboard::ClipboardRecord;
pub use editor::{GridEditor, OpStatus};
pub use fill::FillDrag;
pub use history::{CellChange, Command, History};
pub use layout::{Axis, ResizeDragState, SizeOverrides};
pub use render::RenderedCell;
pub use worker::{OffloadError, OffloadWorker};
