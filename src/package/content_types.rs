//! `[Content_Types].xml` handling.

use super::xml::{Element, Node};
use crate::error::Result;

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Parsed content type map of a package.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    root: Element,
}

impl ContentTypes {
    /// Parse from the part's XML text.
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(Self {
            root: Element::parse(xml)?,
        })
    }

    /// An empty map with the defaults every WordprocessingML package needs.
    pub fn minimal() -> Self {
        let root = Element::new("Types")
            .with_attr("xmlns", TYPES_NS)
            .with_child(
                Element::new("Default")
                    .with_attr("Extension", "rels")
                    .with_attr(
                        "ContentType",
                        "application/vnd.openxmlformats-package.relationships+xml",
                    ),
            )
            .with_child(
                Element::new("Default")
                    .with_attr("Extension", "xml")
                    .with_attr("ContentType", "application/xml"),
            );
        Self { root }
    }

    /// Content type registered for a part name (`/word/document.xml` or `word/document.xml`).
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let absolute = absolute_part_name(part_name);
        if let Some(found) = self
            .root
            .children_named("Override")
            .find(|o| o.attr("PartName") == Some(absolute.as_str()))
        {
            return found.attr("ContentType");
        }

        let extension = part_name.rsplit('.').next()?;
        self.root
            .children_named("Default")
            .find(|d| {
                d.attr("Extension")
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            })
            .and_then(|d| d.attr("ContentType"))
    }

    /// Whether an override exists for the part.
    pub fn has_override(&self, part_name: &str) -> bool {
        let absolute = absolute_part_name(part_name);
        self.root
            .children_named("Override")
            .any(|o| o.attr("PartName") == Some(absolute.as_str()))
    }

    /// Register an override for the part unless one already exists.
    ///
    /// Returns `true` when the map was changed.
    pub fn ensure_override(&mut self, part_name: &str, content_type: &str) -> bool {
        if self.has_override(part_name) {
            return false;
        }
        self.root.children.push(Node::Element(
            Element::new("Override")
                .with_attr("PartName", absolute_part_name(part_name))
                .with_attr("ContentType", content_type),
        ));
        true
    }

    /// Serialize back to XML bytes.
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        self.root.to_xml_bytes()
    }
}

fn absolute_part_name(part_name: &str) -> String {
    if part_name.starts_with('/') {
        part_name.to_string()
    } else {
        format!("/{part_name}")
    }
}
