//! Document-level types.

use super::{Paragraph, StyleSheet, Table};
use crate::annotate::CommentsPart;
use crate::error::Result;
use crate::package::xml::{Element, Node};
use crate::package::{
    ContentTypes, Package, Relationships, CONTENT_TYPES_PART, REL_OFFICE_DOCUMENT, ROOT_RELS_PART,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAIN_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A body-level block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),
    /// A table
    Table(Table),
    /// Anything else (section properties, structured document tags)
    Other(Node),
}

impl Block {
    pub(crate) fn from_node(node: Node) -> Self {
        match node {
            Node::Element(e) if e.is("w:p") => Block::Paragraph(Paragraph::from_element(e)),
            Node::Element(e) if e.is("w:tbl") => Block::Table(Table::from_element(e)),
            other => Block::Other(other),
        }
    }

    fn into_node(self) -> Node {
        match self {
            Block::Paragraph(p) => Node::Element(p.into_element()),
            Block::Table(t) => Node::Element(t.element),
            Block::Other(node) => node,
        }
    }

    /// Borrow the paragraph if this block is one.
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this block is markup rather than content (whitespace, `w:sectPr`).
    pub fn is_markup(&self) -> bool {
        matches!(self, Block::Other(_))
    }

    /// Whether this block is a body element; false for text between elements.
    pub fn is_element(&self) -> bool {
        !matches!(self, Block::Other(Node::Text(_)))
    }
}

/// A loaded WordprocessingML document.
///
/// The document owns its package; cloning it yields an independent working
/// copy that can be annotated without touching the original.
#[derive(Debug, Clone)]
pub struct Document {
    /// Core properties (title, author, dates)
    pub metadata: Metadata,

    /// Body blocks in document order
    pub body: Vec<Block>,

    /// Styles and document defaults
    pub styles: StyleSheet,

    /// Review comments and reviewer identities
    pub comments: CommentsPart,

    package: Package,
    main_part: String,
    root: Element,
}

impl Document {
    /// Create a new empty document with a minimal package.
    pub fn new() -> Self {
        let mut package = Package::new();
        let mut content_types = ContentTypes::minimal();
        content_types.ensure_override("word/document.xml", MAIN_CONTENT_TYPE);

        let mut rels = Relationships::new();
        rels.ensure(REL_OFFICE_DOCUMENT, "word/document.xml");

        // Both serializations are infallible for these fixed trees.
        if let Ok(bytes) = content_types.to_xml_bytes() {
            package.set_part(CONTENT_TYPES_PART, bytes);
        }
        if let Ok(bytes) = rels.to_xml_bytes() {
            package.set_part(ROOT_RELS_PART, bytes);
        }

        let root = Element::new("w:document")
            .with_attr("xmlns:w", W_NS)
            .with_child(Element::new("w:body"));

        Self {
            metadata: Metadata::default(),
            body: Vec::new(),
            styles: StyleSheet::new(),
            comments: CommentsPart::new(),
            package,
            main_part: "word/document.xml".to_string(),
            root,
        }
    }

    /// Assemble a document from loaded parts. `root` is the main part's root
    /// element; its `w:body` children are replaced by `body` on save.
    pub(crate) fn from_parts(
        package: Package,
        main_part: String,
        root: Element,
        body: Vec<Block>,
        styles: StyleSheet,
        comments: CommentsPart,
        metadata: Metadata,
    ) -> Self {
        Self {
            metadata,
            body,
            styles,
            comments,
            package,
            main_part,
            root,
        }
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Top-level body paragraphs in document order (table cells excluded).
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        self.body.iter().filter_map(Block::as_paragraph).collect()
    }

    /// Get a top-level paragraph by zero-based index.
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.body.iter().filter_map(Block::as_paragraph).nth(index)
    }

    /// Get a top-level paragraph mutably by zero-based index.
    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.body
            .iter_mut()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p),
                _ => None,
            })
            .nth(index)
    }

    /// Number of top-level paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.body.iter().filter(|b| matches!(b, Block::Paragraph(_))).count()
    }

    /// Top-level tables.
    pub fn tables(&self) -> Vec<&Table> {
        self.body
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Append a block before the trailing section properties.
    pub fn push_block(&mut self, block: Block) {
        let position = self
            .body
            .iter()
            .rposition(|b| matches!(b, Block::Other(Node::Element(e)) if e.is("w:sectPr")))
            .unwrap_or(self.body.len());
        self.body.insert(position, block);
    }

    /// Append a paragraph.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.push_block(Block::Paragraph(paragraph));
    }

    /// Check if the document has no paragraphs or tables.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(Block::is_markup)
    }

    /// Get plain text content of the document.
    pub fn plain_text(&self) -> String {
        self.body
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p.text()),
                Block::Table(t) => Some(t.plain_text()),
                Block::Other(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize the document, including comments, to DOCX bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();

        let mut root = self.root.clone();
        let nodes: Vec<Node> = self.body.iter().cloned().map(Block::into_node).collect();
        match root.child_mut("w:body") {
            Some(body) => body.children = nodes,
            None => {
                let mut body = Element::new("w:body");
                body.children = nodes;
                root.children.push(Node::Element(body));
            }
        }
        package.set_part(&self.main_part, root.to_xml_bytes()?);

        self.comments.write_into(&mut package, &self.main_part)?;
        package.to_bytes()
    }

    /// Save the document to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document core properties (`docProps/core.xml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Last editor
    pub last_modified_by: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Read from a `cp:coreProperties` element.
    pub fn from_core_properties(root: &Element) -> Self {
        let text = |name: &str| {
            root.child(name)
                .map(|e| e.text_content().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let date = |name: &str| {
            text(name)
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|d| d.with_timezone(&Utc))
        };
        Self {
            title: text("dc:title"),
            author: text("dc:creator"),
            last_modified_by: text("cp:lastModifiedBy"),
            created: date("dcterms:created"),
            modified: date("dcterms:modified"),
        }
    }
}
