//! Table and figure caption checks.

use super::expect::{describe, FormatRule};
use super::{locate_hint_for, RuleModule};
use crate::error::Result;
use crate::model::{Alignment, Block};
use crate::report::{Check, FindingGroup, ModuleFindings};
use crate::resolve::{ResolvedDocument, ResolvedParagraph};
use regex::Regex;
use std::collections::BTreeMap;

/// What a caption labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionKind {
    /// `Table 1 ...`, placed above the table
    Table,
    /// `Fig. 1 ...`, placed below the picture
    Figure,
}

impl CaptionKind {
    fn pattern(self) -> &'static str {
        match self {
            CaptionKind::Table => r"(?i)^\s*Table\s+(\d+)\s*[.:]?\s*(.*)$",
            CaptionKind::Figure => r"(?i)^\s*Fig(?:ure|\.)\s*(\d+)\s*[.:]?\s*(.*)$",
        }
    }

    fn module_name(self) -> &'static str {
        match self {
            CaptionKind::Table => "Table",
            CaptionKind::Figure => "Figure",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            CaptionKind::Table => "table",
            CaptionKind::Figure => "figure",
        }
    }
}

struct Caption<'d> {
    paragraph: &'d ResolvedParagraph,
    number: u32,
    title: String,
}

/// Checks numbering, format and placement of one kind of caption.
pub struct CaptionModule {
    kind: CaptionKind,
    pattern: Regex,
    format: FormatRule,
    window: usize,
}

impl CaptionModule {
    /// Table captions: bold, centered, a table within the next four blocks.
    pub fn tables() -> Self {
        Self::new(
            CaptionKind::Table,
            FormatRule {
                bold: Some(true),
                alignment: Some(Alignment::Center),
                ..Default::default()
            },
            4,
        )
    }

    /// Figure captions: centered, a picture within the two paragraphs before.
    pub fn figures() -> Self {
        Self::new(
            CaptionKind::Figure,
            FormatRule {
                alignment: Some(Alignment::Center),
                ..Default::default()
            },
            2,
        )
    }

    fn new(kind: CaptionKind, format: FormatRule, window: usize) -> Self {
        let pattern = Regex::new(kind.pattern()).expect("valid caption pattern");
        Self {
            kind,
            pattern,
            format,
            window,
        }
    }

    /// Replace the expected caption format.
    pub fn with_format(mut self, format: FormatRule) -> Self {
        self.format = format;
        self
    }

    /// Change how far the placement check looks for the captioned object.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    fn captions<'d>(&self, document: &'d ResolvedDocument<'_>) -> Vec<Caption<'d>> {
        document
            .paragraphs()
            .iter()
            .filter_map(|p| {
                let caps = self.pattern.captures(p.text.trim())?;
                let number = caps.get(1)?.as_str().parse().ok()?;
                let title = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
                Some(Caption {
                    paragraph: p,
                    number,
                    title,
                })
            })
            .collect()
    }

    fn numbering(&self, document: &ResolvedDocument<'_>, captions: &[Caption<'_>]) -> Check {
        let noun = self.kind.module_name();
        let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
        for caption in captions {
            *seen.entry(caption.number).or_default() += 1;
        }

        let mut messages = Vec::new();
        if let Some((&first, _)) = seen.iter().next() {
            if first != 1 {
                messages.push(format!("Numbering starts at {noun} {first}, expected {noun} 1"));
            }
        }
        if let Some((&last, _)) = seen.iter().next_back() {
            let missing: Vec<String> = (1..last)
                .filter(|n| !seen.contains_key(n))
                .map(|n| n.to_string())
                .collect();
            if !missing.is_empty() {
                messages.push(format!("Missing {noun} numbers: {}", missing.join(", ")));
            }
        }
        for (number, count) in seen.iter().filter(|(_, c)| **c > 1) {
            messages.push(format!("{noun} {number} is used {count} times"));
        }
        let out_of_order = captions.windows(2).find(|w| w[1].number < w[0].number);
        if let Some(w) = out_of_order {
            messages.push(format!(
                "{noun} {} appears after {noun} {}",
                w[1].number, w[0].number
            ));
        }

        if messages.is_empty() {
            Check::pass("numbering")
        } else {
            let anchor = out_of_order.map_or(&captions[0], |w| &w[1]);
            Check::fail("numbering", messages).at(locate_hint_for(document, anchor.paragraph))
        }
    }

    fn caption_format(&self, document: &ResolvedDocument<'_>, captions: &[Caption<'_>]) -> Check {
        let groups = captions
            .iter()
            .filter_map(|caption| {
                let mut messages: Vec<String> = self
                    .format
                    .evaluate(&caption.paragraph.format)
                    .into_iter()
                    .map(|m| m.message)
                    .collect();
                match caption.title.chars().next() {
                    None => messages.push("Caption has no title after the number".into()),
                    Some(c) if c.is_lowercase() => {
                        messages.push("Caption title should start with an uppercase letter".into())
                    }
                    _ => {}
                }
                (!messages.is_empty()).then(|| {
                    FindingGroup::new(caption.number.to_string(), messages)
                        .at(locate_hint_for(document, caption.paragraph))
                })
            })
            .collect();
        Check::from_groups("caption_format", groups)
    }

    fn placement(&self, document: &ResolvedDocument<'_>, captions: &[Caption<'_>]) -> Check {
        let groups = captions
            .iter()
            .filter_map(|caption| {
                let messages = match self.kind {
                    CaptionKind::Table => self.table_placement(document, caption),
                    CaptionKind::Figure => self.figure_placement(document, caption),
                };
                (!messages.is_empty()).then(|| {
                    FindingGroup::new(caption.number.to_string(), messages)
                        .at(locate_hint_for(document, caption.paragraph))
                })
            })
            .collect();
        Check::from_groups("placement", groups)
    }

    fn table_placement(&self, document: &ResolvedDocument<'_>, caption: &Caption<'_>) -> Vec<String> {
        let found = document
            .document()
            .body
            .iter()
            .skip(caption.paragraph.block_index + 1)
            .filter(|b| b.is_element())
            .take(self.window)
            .any(|b| matches!(b, Block::Table(_)));
        if found {
            Vec::new()
        } else {
            vec![format!(
                "No table found within {} blocks after the caption",
                self.window
            )]
        }
    }

    fn figure_placement(&self, document: &ResolvedDocument<'_>, caption: &Caption<'_>) -> Vec<String> {
        let doc = document.document();
        let index = caption.paragraph.index;
        let picture = (index.saturating_sub(self.window)..=index)
            .rev()
            .find(|&i| doc.paragraph(i).is_some_and(|p| p.has_picture()));

        let Some(picture) = picture else {
            return vec![format!(
                "No picture found within {} paragraphs before the caption",
                self.window
            )];
        };
        let Some(resolved) = document.paragraph(picture) else {
            return Vec::new();
        };
        let alignment = resolved.format.alignment.value().copied().unwrap_or(Alignment::Left);
        if alignment == Alignment::Center {
            Vec::new()
        } else {
            vec![format!(
                "Picture paragraph: expected center, found {}",
                describe(&resolved.format.alignment)
            )]
        }
    }
}

impl RuleModule for CaptionModule {
    fn name(&self) -> &str {
        self.kind.module_name()
    }

    fn run(&self, document: &ResolvedDocument<'_>) -> Result<ModuleFindings> {
        let mut findings = ModuleFindings::new();
        let captions = self.captions(document);
        log::debug!("{}: {} captions", self.name(), captions.len());

        if captions.is_empty() {
            findings.note(format!("No {} captions found", self.kind.noun()));
            return Ok(findings);
        }

        findings.note(format!("Found {} {} captions", captions.len(), self.kind.noun()));
        findings.push(self.numbering(document, &captions));
        findings.push(self.caption_format(document, &captions));
        findings.push(self.placement(document, &captions));
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Paragraph, Run, Table};
    use crate::package::xml::{Element, Node};
    use crate::report::LocateHint;

    fn caption(text: &str) -> Paragraph {
        let mut p = Paragraph::new().with_alignment(Alignment::Center);
        p.push_run(Run::new(text).bold());
        p
    }

    fn table() -> Block {
        Block::Table(Table::from_element(
            Element::new("w:tbl").with_child(
                Element::new("w:tr").with_child(Element::new("w:tc").with_child(Element::new("w:p"))),
            ),
        ))
    }

    fn picture() -> Paragraph {
        let mut p = Paragraph::new().with_alignment(Alignment::Center);
        let mut run = Run::empty();
        run.content.push(Node::Element(Element::new("w:drawing")));
        p.push_run(run);
        p
    }

    #[test]
    fn test_tables_all_good() {
        let mut doc = Document::new();
        doc.push_paragraph(caption("Table 1 Results"));
        doc.push_block(table());
        doc.push_paragraph(Paragraph::with_text("Text"));
        doc.push_paragraph(caption("Table 2 Costs"));
        doc.push_paragraph(Paragraph::with_text("Note"));
        doc.push_block(table());

        let findings = CaptionModule::tables().run(&ResolvedDocument::new(&doc)).unwrap();
        assert_eq!(findings.checks.len(), 3);
        assert!(findings.checks.iter().all(|c| c.ok), "{:?}", findings.checks);
        assert_eq!(findings.summary, vec!["Found 2 table captions".to_string()]);
    }

    #[test]
    fn test_table_window_ignores_whitespace_between_elements() {
        let indent = || Block::Other(Node::Text("\n  ".to_string()));
        let mut doc = Document::new();
        doc.push_block(indent());
        doc.push_paragraph(caption("Table 1 Results"));
        for _ in 0..2 {
            doc.push_block(indent());
            doc.push_paragraph(Paragraph::with_text("Note"));
        }
        doc.push_block(indent());
        doc.push_block(table());
        doc.push_block(indent());

        let findings = CaptionModule::tables().run(&ResolvedDocument::new(&doc)).unwrap();
        let placement = findings.checks.iter().find(|c| c.name == "placement").unwrap();
        assert!(placement.ok, "{:?}", placement);

        let mut far = Document::new();
        far.push_paragraph(caption("Table 1 Results"));
        for _ in 0..4 {
            far.push_block(indent());
            far.push_paragraph(Paragraph::with_text("Note"));
        }
        far.push_block(table());

        let findings = CaptionModule::tables().run(&ResolvedDocument::new(&far)).unwrap();
        let placement = findings.checks.iter().find(|c| c.name == "placement").unwrap();
        assert!(!placement.ok);
    }

    #[test]
    fn test_table_numbering_and_format() {
        let mut doc = Document::new();
        doc.push_paragraph(caption("Table 2 results"));
        doc.push_block(table());
        doc.push_paragraph(Paragraph::with_text("Table 4 Plain caption"));
        for _ in 0..4 {
            doc.push_paragraph(Paragraph::with_text("filler"));
        }
        doc.push_block(table());

        let findings = CaptionModule::tables().run(&ResolvedDocument::new(&doc)).unwrap();

        let numbering = &findings.checks[0];
        assert!(!numbering.ok);
        assert_eq!(numbering.messages[0], "Numbering starts at Table 2, expected Table 1");
        assert_eq!(numbering.messages[1], "Missing Table numbers: 1, 3");

        let format = &findings.checks[1];
        let labels: Vec<&str> = format.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["2", "4"]);
        assert_eq!(
            format.groups[0].messages,
            vec!["Caption title should start with an uppercase letter".to_string()]
        );
        assert_eq!(
            format.groups[1].locate,
            Some(LocateHint::Keyword("Table 4 Plain captio".into()))
        );

        let placement = &findings.checks[2];
        assert_eq!(placement.groups.len(), 1);
        assert_eq!(placement.groups[0].label, "4");
    }

    #[test]
    fn test_figures() {
        let mut doc = Document::new();
        doc.push_paragraph(picture());
        doc.push_paragraph(caption("Fig. 1 Architecture"));
        doc.push_paragraph(Paragraph::with_text("Body"));
        doc.push_paragraph(caption("Figure 2 Missing picture"));

        let findings = CaptionModule::figures().run(&ResolvedDocument::new(&doc)).unwrap();
        assert!(findings.checks[0].ok);
        assert!(findings.checks[1].ok);
        let placement = &findings.checks[2];
        assert_eq!(placement.groups.len(), 1);
        assert_eq!(placement.groups[0].label, "2");
        assert_eq!(
            placement.groups[0].messages,
            vec!["No picture found within 2 paragraphs before the caption".to_string()]
        );
    }

    #[test]
    fn test_no_captions() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::with_text("Tables are discussed later"));
        let findings = CaptionModule::tables().run(&ResolvedDocument::new(&doc)).unwrap();
        assert!(findings.checks.is_empty());
        assert_eq!(findings.summary, vec!["No table captions found".to_string()]);
    }

    #[test]
    fn test_duplicate_and_order() {
        let mut doc = Document::new();
        doc.push_paragraph(caption("Table 1 A"));
        doc.push_paragraph(caption("Table 2 B"));
        doc.push_paragraph(caption("Table 1 C"));
        let findings = CaptionModule::tables()
            .with_window(1)
            .run(&ResolvedDocument::new(&doc))
            .unwrap();
        let numbering = &findings.checks[0];
        assert_eq!(
            numbering.messages,
            vec![
                "Table 1 is used 2 times".to_string(),
                "Table 1 appears after Table 2".to_string()
            ]
        );
        assert_eq!(numbering.locate, Some(LocateHint::Keyword("Table 1 C".into())));
    }
}
