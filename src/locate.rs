//! Finding an issue's paragraph in a document.
//!
//! Indices are zero-based over top-level body paragraphs. Keywords are
//! matched as exact, case-sensitive substrings with no whitespace
//! normalization; the earliest matching paragraph wins.

use crate::model::{Document, Paragraph};
use crate::report::LocateHint;

/// Resolve a hint to a paragraph index.
pub fn locate(document: &Document, hint: &LocateHint) -> Option<usize> {
    match hint {
        LocateHint::Keyword(keyword) => find_by_keyword(document, keyword),
        LocateHint::Index(index) => find_by_index(document, *index),
    }
}

/// Resolve a hint to the paragraph itself.
pub fn locate_paragraph<'a>(document: &'a Document, hint: &LocateHint) -> Option<&'a Paragraph> {
    locate(document, hint).and_then(|index| document.paragraph(index))
}

/// Index of the first paragraph containing `keyword`. An empty keyword matches nothing.
pub fn find_by_keyword(document: &Document, keyword: &str) -> Option<usize> {
    if keyword.is_empty() {
        return None;
    }
    document
        .paragraphs()
        .iter()
        .position(|p| p.text().contains(keyword))
}

/// `index` if the document has that many paragraphs.
pub fn find_by_index(document: &Document, index: usize) -> Option<usize> {
    (index < document.paragraph_count()).then_some(index)
}
