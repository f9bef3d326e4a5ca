//! Table type.

use super::Paragraph;
use crate::package::xml::Element;

/// A body-level table (`w:tbl`).
///
/// Tables are kept as XML; only read access to their text grid is modeled.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// The `w:tbl` element
    pub element: Element,
}

impl Table {
    /// Wrap a `w:tbl` element.
    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.element.children_named("w:tr").count()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.element
            .children_named("w:tr")
            .map(|tr| tr.children_named("w:tc").count())
            .max()
            .unwrap_or(0)
    }

    /// Text of every cell, row by row. Paragraphs in a cell are joined by newlines.
    pub fn cell_texts(&self) -> Vec<Vec<String>> {
        self.element
            .children_named("w:tr")
            .map(|tr| tr.children_named("w:tc").map(cell_text).collect())
            .collect()
    }

    /// Get plain text representation of the table (tab-separated cells).
    pub fn plain_text(&self) -> String {
        self.cell_texts()
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

fn cell_text(tc: &Element) -> String {
    tc.children_named("w:p")
        .map(|p| Paragraph::from_element(p.clone()).text())
        .collect::<Vec<_>>()
        .join("\n")
}
