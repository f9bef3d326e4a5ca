//! Comment bodies: rich-text paragraphs and tables.

use crate::error::{Error, Result};
use crate::package::xml::Element;
use serde::{Deserialize, Serialize};

/// A run of comment text with its own emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentRun {
    /// Run text
    pub text: String,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
}

impl CommentRun {
    /// A plain run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Make the run bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Make the run italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn to_element(&self) -> Element {
        let mut run = Element::new("w:r");
        if self.bold || self.italic {
            let mut rpr = Element::new("w:rPr");
            if self.bold {
                rpr = rpr.with_child(Element::new("w:b"));
            }
            if self.italic {
                rpr = rpr.with_child(Element::new("w:i"));
            }
            run = run.with_child(rpr);
        }
        let mut t = Element::new("w:t");
        if self.text.starts_with(' ') || self.text.ends_with(' ') {
            t.set_attr("xml:space", "preserve");
        }
        run.with_child(t.with_text(self.text.as_str()))
    }
}

/// A rectangular table in a comment body.
///
/// Always has at least one row and one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct CommentTable {
    rows: usize,
    cols: usize,
    cells: Vec<String>,
}

#[derive(Deserialize)]
struct RawTable {
    rows: usize,
    cols: usize,
    cells: Vec<String>,
}

impl TryFrom<RawTable> for CommentTable {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        if raw.rows == 0 || raw.cols == 0 {
            return Self::new(raw.rows, raw.cols);
        }
        if raw.rows.checked_mul(raw.cols) != Some(raw.cells.len()) {
            return Err(Error::InvalidTable(format!(
                "{} cells given for a {}x{} table",
                raw.cells.len(),
                raw.rows,
                raw.cols
            )));
        }
        Ok(Self {
            rows: raw.rows,
            cols: raw.cols,
            cells: raw.cells,
        })
    }
}

impl CommentTable {
    /// Create an empty table with fixed dimensions.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidTable(format!(
                "a {rows}x{cols} table has no cells"
            )));
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![String::new(); rows * cols],
        })
    }

    /// Build a table from rows of cell text; short rows are padded.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut table = Self::new(rows.len(), cols)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                table.cells[r * cols + c] = cell.as_ref().to_string();
            }
        }
        Ok(table)
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Set one cell's text.
    pub fn set(&mut self, row: usize, col: usize, text: impl Into<String>) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::InvalidTable(format!(
                "cell ({row}, {col}) is outside a {}x{} table",
                self.rows, self.cols
            )));
        }
        self.cells[row * self.cols + col] = text.into();
        Ok(())
    }

    /// Get one cell's text.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col].as_str())
    }

    fn plain_text(&self) -> String {
        (0..self.rows)
            .map(|r| self.cells[r * self.cols..(r + 1) * self.cols].join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_element(&self) -> Element {
        // Comment panes are narrow; split roughly 8cm between the columns.
        let col_width = 4500 / self.cols;

        let border = |name: &str| {
            Element::new(name)
                .with_attr("w:val", "single")
                .with_attr("w:sz", "4")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto")
        };
        let borders = ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"]
            .iter()
            .fold(Element::new("w:tblBorders"), |acc, name| acc.with_child(border(name)));

        let mut grid = Element::new("w:tblGrid");
        for _ in 0..self.cols {
            grid = grid.with_child(Element::new("w:gridCol").with_attr("w:w", col_width.to_string()));
        }

        let mut table = Element::new("w:tbl")
            .with_child(
                Element::new("w:tblPr")
                    .with_child(
                        Element::new("w:tblW")
                            .with_attr("w:w", "0")
                            .with_attr("w:type", "auto"),
                    )
                    .with_child(borders),
            )
            .with_child(grid);

        for r in 0..self.rows {
            let mut tr = Element::new("w:tr");
            for c in 0..self.cols {
                let text = &self.cells[r * self.cols + c];
                let mut p = Element::new("w:p");
                if !text.is_empty() {
                    p = p.with_child(CommentRun::plain(text.as_str()).to_element());
                }
                tr = tr.with_child(
                    Element::new("w:tc")
                        .with_child(
                            Element::new("w:tcPr").with_child(
                                Element::new("w:tcW")
                                    .with_attr("w:w", col_width.to_string())
                                    .with_attr("w:type", "dxa"),
                            ),
                        )
                        .with_child(p),
                );
            }
            table = table.with_child(tr);
        }
        table
    }
}

/// One block of a comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommentBlock {
    /// A paragraph of runs
    Paragraph {
        /// Runs in order
        runs: Vec<CommentRun>,
    },
    /// A table
    Table(CommentTable),
}

/// Ordered blocks forming a comment body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentBody {
    /// Blocks in order
    pub blocks: Vec<CommentBlock>,
}

impl CommentBody {
    /// Create an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// A body of plain text; each line becomes a paragraph.
    pub fn plain(text: &str) -> Self {
        let mut body = Self::new();
        for line in text.split('\n') {
            body = body.paragraph(vec![CommentRun::plain(line)]);
        }
        body
    }

    /// Append a paragraph of runs.
    pub fn paragraph(mut self, runs: Vec<CommentRun>) -> Self {
        self.blocks.push(CommentBlock::Paragraph { runs });
        self
    }

    /// Append a table.
    pub fn table(mut self, table: CommentTable) -> Self {
        self.blocks.push(CommentBlock::Table(table));
        self
    }

    /// Whether the body has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Plain text: blocks separated by newlines, table cells by tabs.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                CommentBlock::Paragraph { runs } => runs.iter().map(|r| r.text.as_str()).collect(),
                CommentBlock::Table(table) => table.plain_text(),
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    /// Block-level elements (`w:p`, `w:tbl`) for the body.
    pub(crate) fn to_elements(&self) -> Vec<Element> {
        self.blocks
            .iter()
            .map(|block| match block {
                CommentBlock::Paragraph { runs } => runs
                    .iter()
                    .fold(Element::new("w:p"), |p, run| p.with_child(run.to_element())),
                CommentBlock::Table(table) => table.to_element(),
            })
            .collect()
    }
}
