//! Styles part (`word/styles.xml`).

use super::format::{ParagraphFormat, RunFormat};
use crate::package::xml::Element;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Style type (`w:style/@w:type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    /// Paragraph style
    Paragraph,
    /// Character (run) style
    Character,
    /// Table style
    Table,
    /// Numbering style
    Numbering,
}

impl StyleKind {
    fn from_ooxml(val: Option<&str>) -> Self {
        match val {
            Some("character") => StyleKind::Character,
            Some("table") => StyleKind::Table,
            Some("numbering") => StyleKind::Numbering,
            _ => StyleKind::Paragraph,
        }
    }
}

/// A named formatting template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Style id referenced from `w:pStyle` / `w:rStyle`
    pub id: String,
    /// Display name (`w:name`), falls back to the id
    pub name: String,
    /// Style type
    pub kind: StyleKind,
    /// Parent style id (`w:basedOn`)
    pub based_on: Option<String>,
    /// Marked as the default style of its type
    pub is_default: bool,
    /// Paragraph properties of the style
    pub paragraph: ParagraphFormat,
    /// Run properties of the style
    pub run: RunFormat,
}

impl Style {
    /// Read one `w:style` element.
    pub fn from_element(element: &Element) -> Option<Self> {
        let id = element.attr("w:styleId")?.to_string();
        let name = element
            .child_val("w:name")
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        Some(Self {
            kind: StyleKind::from_ooxml(element.attr("w:type")),
            based_on: element.child_val("w:basedOn").map(str::to_string),
            is_default: matches!(element.attr("w:default"), Some("1" | "true" | "on")),
            paragraph: element
                .child("w:pPr")
                .map(ParagraphFormat::from_ppr)
                .unwrap_or_default(),
            run: element.child("w:rPr").map(RunFormat::from_rpr).unwrap_or_default(),
            id,
            name,
        })
    }
}

/// All styles of a document plus the document defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSheet {
    styles: HashMap<String, Style>,
    /// `w:docDefaults/w:pPrDefault`
    pub default_paragraph: ParagraphFormat,
    /// `w:docDefaults/w:rPrDefault`
    pub default_run: RunFormat,
}

impl StyleSheet {
    /// An empty stylesheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `w:styles` root element.
    pub fn from_element(root: &Element) -> Self {
        let mut sheet = StyleSheet::new();

        if let Some(defaults) = root.child("w:docDefaults") {
            if let Some(ppr) = defaults.child("w:pPrDefault").and_then(|d| d.child("w:pPr")) {
                sheet.default_paragraph = ParagraphFormat::from_ppr(ppr);
            }
            if let Some(rpr) = defaults.child("w:rPrDefault").and_then(|d| d.child("w:rPr")) {
                sheet.default_run = RunFormat::from_rpr(rpr);
            }
        }

        for style in root.children_named("w:style").filter_map(Style::from_element) {
            sheet.insert(style);
        }
        sheet
    }

    /// Add or replace a style.
    pub fn insert(&mut self, style: Style) {
        self.styles.insert(style.id.clone(), style);
    }

    /// Look up a style by id.
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Whether a style id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    /// Look up a style by display name (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<&Style> {
        self.styles
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Number of styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether there are no styles.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// The default paragraph style (`w:default="1"`), if any.
    pub fn default_paragraph_style(&self) -> Option<&Style> {
        let mut defaults: Vec<&Style> = self
            .styles
            .values()
            .filter(|s| s.kind == StyleKind::Paragraph && s.is_default)
            .collect();
        // Several defaults is malformed; pick deterministically.
        defaults.sort_by(|a, b| a.id.cmp(&b.id));
        defaults.first().copied()
    }

    /// The style and its ancestors, nearest first.
    ///
    /// Stops at a missing parent or at the first repeated id, so a `basedOn`
    /// cycle yields a finite chain.
    pub fn chain(&self, id: &str) -> Vec<&Style> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);

        while let Some(style_id) = current {
            if !seen.insert(style_id) {
                log::debug!("Style inheritance cycle at '{}'", style_id);
                break;
            }
            let Some(style) = self.styles.get(style_id) else {
                break;
            };
            chain.push(style);
            current = style.based_on.as_deref();
        }
        chain
    }
}
