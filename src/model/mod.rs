//! Document model types for WordprocessingML content.
//!
//! The model is a typed view over the main document part: body blocks,
//! paragraphs with their runs, tables, and the stylesheet. Property
//! containers stay as XML so that saving a document never drops markup.

mod document;
mod format;
mod paragraph;
mod style;
mod table;

pub use document::{Block, Document, Metadata};
pub use format::{Alignment, FontSlots, Length, LineSpacing, ParagraphFormat, RunFormat};
pub use paragraph::{Inline, Paragraph, Run};
pub use style::{Style, StyleKind, StyleSheet};
pub use table::Table;
