//! Paragraph and run types.
//!
//! Paragraphs keep their property containers as XML so that writing the
//! document back never loses properties this crate does not model.

use super::format::{Alignment, ParagraphFormat, RunFormat};
use crate::package::xml::{Element, Node};

/// Inline wrappers whose runs belong to the paragraph's visible text.
const RUN_CONTAINERS: &[&str] = &[
    "w:hyperlink",
    "w:ins",
    "w:smartTag",
    "w:customXml",
    "w:fldSimple",
    "w:moveTo",
];

/// A paragraph (`w:p`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    /// Attributes of the `w:p` element (rsids, paraId)
    pub attributes: Vec<(String, String)>,
    /// Paragraph properties (`w:pPr`)
    pub properties: Option<Element>,
    /// Inline content in document order
    pub content: Vec<Inline>,
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// A text run
    Run(Run),
    /// A wrapper around further inline content (hyperlink, insertion)
    Container {
        /// The wrapper element without its children
        element: Element,
        /// Wrapped content
        content: Vec<Inline>,
    },
    /// Anything else (bookmarks, comment ranges, proofing marks)
    Other(Node),
}

impl Inline {
    fn from_node(node: Node) -> Self {
        match node {
            Node::Element(e) if e.is("w:r") => Inline::Run(Run::from_element(e)),
            Node::Element(mut e) if RUN_CONTAINERS.contains(&e.name.as_str()) => {
                let children = std::mem::take(&mut e.children);
                Inline::Container {
                    element: e,
                    content: children.into_iter().map(Inline::from_node).collect(),
                }
            }
            other => Inline::Other(other),
        }
    }

    fn into_node(self) -> Node {
        match self {
            Inline::Run(run) => Node::Element(run.into_element()),
            Inline::Container {
                mut element,
                content,
            } => {
                element.children = content.into_iter().map(Inline::into_node).collect();
                Node::Element(element)
            }
            Inline::Other(node) => node,
        }
    }

    /// Whether this item carries (or wraps) text runs.
    pub fn has_runs(&self) -> bool {
        match self {
            Inline::Run(_) => true,
            Inline::Container { content, .. } => content.iter().any(Inline::has_runs),
            Inline::Other(_) => false,
        }
    }

    fn collect_runs<'a>(&'a self, out: &mut Vec<&'a Run>) {
        match self {
            Inline::Run(run) => out.push(run),
            Inline::Container { content, .. } => {
                for item in content {
                    item.collect_runs(out);
                }
            }
            Inline::Other(_) => {}
        }
    }
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph holding one plain run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.push_run(Run::new(text));
        p
    }

    /// Set the paragraph style id (`w:pStyle`).
    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.properties_mut()
            .replace_child(Element::new("w:pStyle").with_attr("w:val", style_id.into()));
        self
    }

    /// Set direct paragraph alignment (`w:jc`).
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.properties_mut()
            .replace_child(Element::new("w:jc").with_attr("w:val", alignment.to_ooxml()));
        self
    }

    /// Append a run.
    pub fn push_run(&mut self, run: Run) {
        self.content.push(Inline::Run(run));
    }

    /// Read a `w:p` element.
    pub fn from_element(element: Element) -> Self {
        let mut properties = None;
        let mut content = Vec::new();
        for child in element.children {
            match child {
                Node::Element(e) if e.is("w:pPr") && properties.is_none() => properties = Some(e),
                other => content.push(Inline::from_node(other)),
            }
        }
        Self {
            attributes: element.attributes,
            properties,
            content,
        }
    }

    /// Convert back into a `w:p` element.
    pub fn into_element(self) -> Element {
        let mut element = Element::new("w:p");
        element.attributes = self.attributes;
        if let Some(ppr) = self.properties {
            element.children.push(Node::Element(ppr));
        }
        element
            .children
            .extend(self.content.into_iter().map(Inline::into_node));
        element
    }

    /// The paragraph properties container, created if missing.
    pub fn properties_mut(&mut self) -> &mut Element {
        self.properties.get_or_insert_with(|| Element::new("w:pPr"))
    }

    /// Paragraph style id (`w:pStyle`).
    pub fn style_id(&self) -> Option<&str> {
        self.properties.as_ref()?.child_val("w:pStyle")
    }

    /// Direct paragraph formatting.
    pub fn direct_format(&self) -> ParagraphFormat {
        self.properties
            .as_ref()
            .map(ParagraphFormat::from_ppr)
            .unwrap_or_default()
    }

    /// Paragraph-mark run properties (`w:pPr/w:rPr`).
    pub fn mark_run_format(&self) -> RunFormat {
        self.properties
            .as_ref()
            .and_then(|p| p.child("w:rPr"))
            .map(RunFormat::from_rpr)
            .unwrap_or_default()
    }

    /// All runs, including runs inside hyperlinks and insertions.
    pub fn runs(&self) -> Vec<&Run> {
        let mut out = Vec::new();
        for item in &self.content {
            item.collect_runs(&mut out);
        }
        out
    }

    /// Whether the paragraph has any run.
    pub fn has_runs(&self) -> bool {
        self.content.iter().any(Inline::has_runs)
    }

    /// Visible text of the paragraph.
    pub fn text(&self) -> String {
        self.runs().iter().map(|r| r.text()).collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Whether any run holds a drawing, picture or embedded object.
    pub fn has_picture(&self) -> bool {
        self.runs().iter().any(|r| r.has_picture())
    }
}

/// A text run (`w:r`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    /// Attributes of the `w:r` element
    pub attributes: Vec<(String, String)>,
    /// Run properties (`w:rPr`)
    pub properties: Option<Element>,
    /// Run content (`w:t`, `w:tab`, `w:br`, drawings)
    pub content: Vec<Node>,
}

impl Run {
    /// Create a plain run with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut run = Self::default();
        if !text.is_empty() {
            run.content.push(Node::Element(text_element(text)));
        }
        run
    }

    /// An empty run, used as a placeholder anchor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Make the run bold.
    pub fn bold(mut self) -> Self {
        self.properties_mut().replace_child(Element::new("w:b"));
        self
    }

    /// Make the run italic.
    pub fn italic(mut self) -> Self {
        self.properties_mut().replace_child(Element::new("w:i"));
        self
    }

    /// Set the same font in every slot.
    pub fn font(mut self, name: &str) -> Self {
        self.properties_mut().replace_child(
            Element::new("w:rFonts")
                .with_attr("w:ascii", name)
                .with_attr("w:hAnsi", name)
                .with_attr("w:eastAsia", name)
                .with_attr("w:cs", name),
        );
        self
    }

    /// Set the font size in points.
    pub fn size(mut self, points: f32) -> Self {
        let half_points = (points * 2.0).round() as u32;
        self.properties_mut()
            .replace_child(Element::new("w:sz").with_attr("w:val", half_points.to_string()));
        self
    }

    /// Set the character style id (`w:rStyle`).
    pub fn style(mut self, style_id: &str) -> Self {
        self.properties_mut()
            .replace_child(Element::new("w:rStyle").with_attr("w:val", style_id));
        self
    }

    /// Read a `w:r` element.
    pub fn from_element(element: Element) -> Self {
        let mut properties = None;
        let mut content = Vec::new();
        for child in element.children {
            match child {
                Node::Element(e) if e.is("w:rPr") && properties.is_none() => properties = Some(e),
                other => content.push(other),
            }
        }
        Self {
            attributes: element.attributes,
            properties,
            content,
        }
    }

    /// Convert back into a `w:r` element.
    pub fn into_element(self) -> Element {
        let mut element = Element::new("w:r");
        element.attributes = self.attributes;
        if let Some(rpr) = self.properties {
            element.children.push(Node::Element(rpr));
        }
        element.children.extend(self.content);
        element
    }

    /// The run properties container, created if missing.
    pub fn properties_mut(&mut self) -> &mut Element {
        self.properties.get_or_insert_with(|| Element::new("w:rPr"))
    }

    /// Character style id (`w:rStyle`).
    pub fn style_id(&self) -> Option<&str> {
        self.properties.as_ref()?.child_val("w:rStyle")
    }

    /// Direct run formatting.
    pub fn direct_format(&self) -> RunFormat {
        self.properties
            .as_ref()
            .map(RunFormat::from_rpr)
            .unwrap_or_default()
    }

    /// Visible text of the run.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.content {
            if let Node::Element(e) = node {
                match e.name.as_str() {
                    "w:t" => out.push_str(&e.text_content()),
                    "w:tab" | "w:ptab" => out.push('\t'),
                    "w:br" | "w:cr" => out.push('\n'),
                    "w:noBreakHyphen" => out.push('-'),
                    _ => {}
                }
            }
        }
        out
    }

    /// Whether the run holds a drawing, VML picture or embedded object.
    pub fn has_picture(&self) -> bool {
        self.content.iter().filter_map(Node::as_element).any(|e| {
            PICTURE_ELEMENTS.contains(&e.name.as_str())
                || PICTURE_ELEMENTS
                    .iter()
                    .any(|name| !e.descendants_named(name).is_empty())
        })
    }
}

const PICTURE_ELEMENTS: &[&str] = &["w:drawing", "w:pict", "w:object"];

fn text_element(text: String) -> Element {
    let mut t = Element::new("w:t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    t.with_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_p(xml: &str) -> Paragraph {
        Paragraph::from_element(Element::parse(xml).unwrap())
    }

    #[test]
    fn test_text_includes_hyperlink_runs() {
        let p = parse_p(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>See </w:t></w:r><w:hyperlink r:id="rId5"><w:r><w:t>here</w:t></w:r></w:hyperlink><w:r><w:tab/><w:t>.</w:t></w:r></w:p>"#,
        );
        assert_eq!(p.text(), "See here\t.");
        assert_eq!(p.style_id(), Some("Title"));
        assert_eq!(p.runs().len(), 3);
        assert!(p.has_runs());
    }

    #[test]
    fn test_round_trip_preserves_unknown_markup() {
        let xml = r#"<w:p w14:paraId="1A"><w:pPr><w:jc w:val="center"/></w:pPr><w:bookmarkStart w:id="0" w:name="x"/><w:r><w:rPr><w:b/></w:rPr><w:t>A</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p>"#;
        let original = Element::parse(xml).unwrap();
        let p = Paragraph::from_element(original.clone());
        assert_eq!(p.into_element(), original);
    }

    #[test]
    fn test_builders() {
        let p = Paragraph::with_text(" padded ")
            .with_style("Heading1")
            .with_alignment(Alignment::Center);
        assert_eq!(p.style_id(), Some("Heading1"));
        assert_eq!(p.direct_format().alignment, Some(Alignment::Center));
        assert_eq!(p.text(), " padded ");

        let element = p.into_element();
        let t = &element.descendants_named("w:t")[0];
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_run_builders() {
        let run = Run::new("x").bold().italic().font("Arial").size(10.5);
        let f = run.direct_format();
        assert_eq!(f.bold, Some(true));
        assert_eq!(f.italic, Some(true));
        assert_eq!(f.size.map(|s| s.pt()), Some(10.5));
        assert_eq!(f.fonts.pick(false), Some("Arial"));
    }

    #[test]
    fn test_empty_paragraph() {
        let p = parse_p("<w:p><w:pPr/></w:p>");
        assert!(!p.has_runs());
        assert!(p.is_empty());
        assert!(Run::empty().text().is_empty());
    }

    #[test]
    fn test_picture_detection() {
        let p = parse_p(
            r#"<w:p xmlns:w="w"><w:r><mc:AlternateContent xmlns:mc="mc"><mc:Choice><w:drawing/></mc:Choice></mc:AlternateContent></w:r></w:p>"#,
        );
        assert!(p.has_picture());
        assert!(!Paragraph::with_text("Fig. 1 Overview").has_picture());
    }
}
