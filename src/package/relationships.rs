//! Relationship parts (`*.rels`).

use super::xml::{Element, Node};
use crate::error::Result;

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of the main document part.
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
/// Relationship type of the styles part.
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
/// Relationship type of the comments part.
pub const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
/// Relationship type of the people part.
pub const REL_PEOPLE: &str = "http://schemas.microsoft.com/office/2011/relationships/people";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id (`rId1`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target, relative to the source part's folder
    pub target: String,
    /// Whether the target is external to the package
    pub external: bool,
}

/// The relationships of one source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty relationship set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        let entries = root
            .children_named("Relationship")
            .filter_map(|r| {
                Some(Relationship {
                    id: r.attr("Id")?.to_string(),
                    rel_type: r.attr("Type")?.to_string(),
                    target: r.attr("Target")?.to_string(),
                    external: r.attr("TargetMode") == Some("External"),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    /// All entries in part order.
    pub fn entries(&self) -> &[Relationship] {
        &self.entries
    }

    /// First relationship of the given type.
    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.rel_type == rel_type)
    }

    /// Return the id of a relationship of this type, adding one if missing.
    pub fn ensure(&mut self, rel_type: &str, target: &str) -> String {
        if let Some(existing) = self.by_type(rel_type) {
            return existing.id.clone();
        }
        let id = self.next_id();
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    fn next_id(&self) -> String {
        let max = self
            .entries
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let mut n = max + 1;
        // Ids that do not follow the rIdN pattern could still collide.
        while self.entries.iter().any(|r| r.id == format!("rId{n}")) {
            n += 1;
        }
        format!("rId{n}")
    }

    /// Serialize to `.rels` XML.
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        let mut root = Element::new("Relationships").with_attr("xmlns", RELS_NS);
        for rel in &self.entries {
            let mut e = Element::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                e.set_attr("TargetMode", "External");
            }
            root.children.push(Node::Element(e));
        }
        root.to_xml_bytes()
    }
}

/// Path of the relationships part belonging to `part_name`.
///
/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_part_for(part_name: &str) -> String {
    let part_name = part_name.trim_start_matches('/');
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

/// Resolve a relationship target against the folder of its source part.
///
/// `("word/document.xml", "styles.xml")` -> `word/styles.xml`
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let source_part = source_part.trim_start_matches('/');
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
