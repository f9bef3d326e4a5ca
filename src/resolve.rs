//! Effective formatting resolution.
//!
//! Every attribute is looked up tier by tier and the first tier that sets it
//! wins:
//!
//! | attribute kind | tiers, nearest first |
//! |---|---|
//! | paragraph (alignment, indents, spacing) | `w:pPr` → paragraph style chain → `w:pPrDefault` |
//! | run (font, size, bold, italic) | `w:rPr` → `w:pPr/w:rPr` → `w:rStyle` chain → paragraph style chain → `w:rPrDefault` |
//!
//! A paragraph without `w:pStyle` (or naming a style that does not exist)
//! uses the stylesheet's default paragraph style. Nothing is ever filled in
//! from a built-in guess: an attribute no tier sets is [`Resolved::Unset`].

use crate::model::{
    Alignment, Document, Length, LineSpacing, Paragraph, ParagraphFormat, Run, RunFormat, Style,
    StyleSheet,
};
use serde::Serialize;
use std::fmt;

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "style", rename_all = "snake_case")]
pub enum Provenance {
    /// Direct run formatting
    Run,
    /// Direct paragraph formatting
    Paragraph,
    /// A style, by id
    Style(String),
    /// Document defaults
    Default,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Run => f.write_str("run"),
            Provenance::Paragraph => f.write_str("paragraph"),
            Provenance::Style(id) => write!(f, "style '{id}'"),
            Provenance::Default => f.write_str("document defaults"),
        }
    }
}

/// A resolved attribute: a value with its provenance, or explicitly unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolved<T> {
    /// Some tier set the attribute
    Value {
        /// The effective value
        value: T,
        /// The tier that set it
        from: Provenance,
    },
    /// No tier sets the attribute
    Unset,
}

impl<T> Resolved<T> {
    /// The value, if set.
    pub fn value(&self) -> Option<&T> {
        match self {
            Resolved::Value { value, .. } => Some(value),
            Resolved::Unset => None,
        }
    }

    /// The provenance, if set.
    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            Resolved::Value { from, .. } => Some(from),
            Resolved::Unset => None,
        }
    }

    /// Whether a value was found.
    pub fn is_set(&self) -> bool {
        matches!(self, Resolved::Value { .. })
    }
}

impl<T: fmt::Display> fmt::Display for Resolved<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value { value, .. } => write!(f, "{value}"),
            Resolved::Unset => f.write_str("unset"),
        }
    }
}

fn first_set<S, T>(tiers: &[(Provenance, &S)], get: impl Fn(&S) -> Option<T>) -> Resolved<T> {
    tiers
        .iter()
        .find_map(|(from, source)| {
            get(*source).map(|value| Resolved::Value {
                value,
                from: from.clone(),
            })
        })
        .unwrap_or(Resolved::Unset)
}

/// Effective character formatting of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRun {
    /// Run text
    pub text: String,
    /// Whether the text was classified as CJK for font slot selection
    pub cjk: bool,
    /// Font family
    pub font_name: Resolved<String>,
    /// Font size
    pub font_size: Resolved<Length>,
    /// Bold
    pub bold: Resolved<bool>,
    /// Italic
    pub italic: Resolved<bool>,
}

impl ResolvedRun {
    /// Whether the run has visible (non-whitespace) text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Effective formatting of one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFormat {
    /// Alignment
    pub alignment: Resolved<Alignment>,
    /// Left indent
    pub left_indent: Resolved<Length>,
    /// Right indent
    pub right_indent: Resolved<Length>,
    /// First-line indent (negative when hanging)
    pub first_line_indent: Resolved<Length>,
    /// Space before
    pub space_before: Resolved<Length>,
    /// Space after
    pub space_after: Resolved<Length>,
    /// Line spacing
    pub line_spacing: Resolved<LineSpacing>,
    /// Per-run character formatting
    pub runs: Vec<ResolvedRun>,
}

impl ResolvedFormat {
    /// Runs that carry visible text.
    pub fn text_runs(&self) -> impl Iterator<Item = &ResolvedRun> {
        self.runs.iter().filter(|r| r.has_text())
    }

    /// The first run with visible text.
    pub fn primary_run(&self) -> Option<&ResolvedRun> {
        self.text_runs().next()
    }

    /// Distinct resolved font names over the text runs, in first-seen order.
    pub fn font_names(&self) -> Vec<Resolved<String>> {
        distinct(self.text_runs().map(|r| r.font_name.clone()))
    }

    /// Distinct resolved font sizes over the text runs, in first-seen order.
    pub fn font_sizes(&self) -> Vec<Resolved<Length>> {
        distinct(self.text_runs().map(|r| r.font_size.clone()))
    }
}

fn distinct<T: PartialEq>(items: impl Iterator<Item = Resolved<T>>) -> Vec<Resolved<T>> {
    let mut out: Vec<Resolved<T>> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| seen.value() == item.value()) {
            out.push(item);
        }
    }
    out
}

/// Resolves paragraphs against one stylesheet.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    styles: &'a StyleSheet,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a stylesheet.
    pub fn new(styles: &'a StyleSheet) -> Self {
        Self { styles }
    }

    /// The style chain governing a paragraph, nearest first.
    pub fn paragraph_style_chain(&self, paragraph: &Paragraph) -> Vec<&'a Style> {
        let named = paragraph
            .style_id()
            .map(|id| self.styles.chain(id))
            .unwrap_or_default();
        if !named.is_empty() {
            return named;
        }
        self.styles
            .default_paragraph_style()
            .map(|style| self.styles.chain(&style.id))
            .unwrap_or_default()
    }

    /// Resolve a paragraph's effective format.
    pub fn resolve(&self, paragraph: &Paragraph) -> ResolvedFormat {
        let chain = self.paragraph_style_chain(paragraph);
        let direct = paragraph.direct_format();

        let mut tiers: Vec<(Provenance, &ParagraphFormat)> = vec![(Provenance::Paragraph, &direct)];
        tiers.extend(chain.iter().map(|s| (Provenance::Style(s.id.clone()), &s.paragraph)));
        tiers.push((Provenance::Default, &self.styles.default_paragraph));

        let mark = paragraph.mark_run_format();
        let runs = paragraph
            .runs()
            .into_iter()
            .map(|run| self.resolve_run(run, &mark, &chain))
            .collect();

        ResolvedFormat {
            alignment: first_set(&tiers, |f| f.alignment),
            left_indent: first_set(&tiers, |f| f.left_indent),
            right_indent: first_set(&tiers, |f| f.right_indent),
            first_line_indent: first_set(&tiers, |f| f.first_line_indent),
            space_before: first_set(&tiers, |f| f.space_before),
            space_after: first_set(&tiers, |f| f.space_after),
            line_spacing: first_set(&tiers, |f| f.line_spacing),
            runs,
        }
    }

    fn resolve_run(&self, run: &Run, mark: &RunFormat, paragraph_chain: &[&Style]) -> ResolvedRun {
        let text = run.text();
        let cjk = is_cjk_text(&text);
        let direct = run.direct_format();
        let run_chain = run
            .style_id()
            .map(|id| self.styles.chain(id))
            .unwrap_or_default();

        let mut tiers: Vec<(Provenance, &RunFormat)> =
            vec![(Provenance::Run, &direct), (Provenance::Paragraph, mark)];
        tiers.extend(
            run_chain
                .iter()
                .chain(paragraph_chain.iter())
                .map(|s| (Provenance::Style(s.id.clone()), &s.run)),
        );
        tiers.push((Provenance::Default, &self.styles.default_run));

        ResolvedRun {
            font_name: first_set(&tiers, |f| f.fonts.pick(cjk).map(str::to_string)),
            font_size: first_set(&tiers, |f| f.size),
            bold: first_set(&tiers, |f| f.bold),
            italic: first_set(&tiers, |f| f.italic),
            cjk,
            text,
        }
    }
}

/// Whether any character of `text` belongs to a CJK block.
pub fn is_cjk_text(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303F}'   // CJK symbols and punctuation
        | '\u{3040}'..='\u{309F}' // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{4E00}'..='\u{9FFF}' // Unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
        | '\u{F900}'..='\u{FAFF}' // Compatibility ideographs
        | '\u{FF00}'..='\u{FFEF}' // Halfwidth and fullwidth forms
        | '\u{20000}'..='\u{2EBEF}' // Extensions B-F
    )
}

/// A paragraph together with its resolved format.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedParagraph {
    /// Zero-based index among top-level paragraphs
    pub index: usize,
    /// Index of the paragraph in the body block list
    pub block_index: usize,
    /// Paragraph text
    pub text: String,
    /// Effective paragraph style id
    pub style_id: Option<String>,
    /// Display name of the effective paragraph style
    pub style_name: Option<String>,
    /// Resolved format
    pub format: ResolvedFormat,
}

impl ResolvedParagraph {
    /// Whether the paragraph has visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// An immutable snapshot of a document with every top-level paragraph resolved.
#[derive(Debug, Clone)]
pub struct ResolvedDocument<'a> {
    document: &'a Document,
    paragraphs: Vec<ResolvedParagraph>,
}

impl<'a> ResolvedDocument<'a> {
    /// Resolve all top-level paragraphs of a document.
    pub fn new(document: &'a Document) -> Self {
        let resolver = Resolver::new(&document.styles);
        let paragraphs = document
            .body
            .iter()
            .enumerate()
            .filter_map(|(block_index, block)| block.as_paragraph().map(|p| (block_index, p)))
            .enumerate()
            .map(|(index, (block_index, paragraph))| {
                let style = resolver.paragraph_style_chain(paragraph).first().copied();
                ResolvedParagraph {
                    index,
                    block_index,
                    text: paragraph.text(),
                    style_id: style.map(|s| s.id.clone()),
                    style_name: style.map(|s| s.name.clone()),
                    format: resolver.resolve(paragraph),
                }
            })
            .collect();

        Self {
            document,
            paragraphs,
        }
    }

    /// The underlying document.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// All resolved paragraphs in document order.
    pub fn paragraphs(&self) -> &[ResolvedParagraph] {
        &self.paragraphs
    }

    /// A resolved paragraph by zero-based index.
    pub fn paragraph(&self, index: usize) -> Option<&ResolvedParagraph> {
        self.paragraphs.get(index)
    }

    /// Number of paragraphs.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether the document has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::xml::Element;

    const STYLES: &str = r#"<w:styles>
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:eastAsia="DengXian"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:jc w:val="both"/></w:pPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/><w:basedOn w:val="Normal"/>
    <w:pPr><w:jc w:val="center"/><w:spacing w:before="240"/></w:pPr>
    <w:rPr><w:rFonts w:ascii="Arial" w:eastAsia="SimHei"/><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="character" w:styleId="Emph"><w:name w:val="Emph"/><w:rPr><w:i/><w:sz w:val="20"/></w:rPr></w:style>
</w:styles>"#;

    fn styles() -> StyleSheet {
        StyleSheet::from_element(&Element::parse(STYLES).unwrap())
    }

    fn para(xml: &str) -> Paragraph {
        Paragraph::from_element(Element::parse(xml).unwrap())
    }

    #[test]
    fn test_style_chain_and_defaults() {
        let styles = styles();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>"#,
        ));

        assert_eq!(
            f.alignment,
            Resolved::Value {
                value: Alignment::Center,
                from: Provenance::Style("Heading1".into())
            }
        );
        assert_eq!(f.space_before.value(), Some(&Length(12.0)));
        assert_eq!(f.space_after.provenance(), Some(&Provenance::Default));
        assert!(matches!(f.line_spacing.value(), Some(LineSpacing::Multiple(_))));
        assert_eq!(f.left_indent, Resolved::Unset);

        let run = f.primary_run().unwrap();
        assert_eq!(run.font_name.value().map(String::as_str), Some("Arial"));
        assert_eq!(run.font_size.value(), Some(&Length(16.0)));
        assert_eq!(run.bold.value(), Some(&true));
        assert_eq!(run.italic, Resolved::Unset);
    }

    #[test]
    fn test_direct_formatting_wins() {
        let styles = styles();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="right"/><w:rPr><w:sz w:val="40"/></w:rPr></w:pPr><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        ));

        assert_eq!(f.alignment.value(), Some(&Alignment::Right));
        assert_eq!(f.alignment.provenance(), Some(&Provenance::Paragraph));

        let run = f.primary_run().unwrap();
        assert_eq!(run.bold.value(), Some(&false));
        assert_eq!(run.bold.provenance(), Some(&Provenance::Run));
        assert_eq!(run.font_size.value(), Some(&Length(20.0)));
        assert_eq!(run.font_size.provenance(), Some(&Provenance::Paragraph));
    }

    #[test]
    fn test_font_slots_do_not_merge_across_tiers() {
        let styles = styles();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:rFonts w:ascii="Courier New"/></w:rPr><w:t>中文</w:t></w:r></w:p>"#,
        ));
        let run = f.primary_run().unwrap();
        assert_eq!(run.font_name.value().map(String::as_str), Some("Courier New"));
        assert_eq!(run.font_name.provenance(), Some(&Provenance::Run));
    }

    #[test]
    fn test_default_paragraph_style_applies() {
        let styles = styles();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(r#"<w:p><w:r><w:t>body</w:t></w:r></w:p>"#));
        assert_eq!(f.alignment.value(), Some(&Alignment::Justify));
        assert_eq!(f.alignment.provenance(), Some(&Provenance::Style("Normal".into())));

        // An unknown style id behaves like no style.
        let f = resolver.resolve(&para(
            r#"<w:p><w:pPr><w:pStyle w:val="Nope"/></w:pPr><w:r><w:t>b</w:t></w:r></w:p>"#,
        ));
        assert_eq!(f.alignment.value(), Some(&Alignment::Justify));
    }

    #[test]
    fn test_character_style_before_paragraph_style() {
        let styles = styles();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:rStyle w:val="Emph"/></w:rPr><w:t>e</w:t></w:r></w:p>"#,
        ));
        let run = f.primary_run().unwrap();
        assert_eq!(run.font_size.value(), Some(&Length(10.0)));
        assert_eq!(run.font_size.provenance(), Some(&Provenance::Style("Emph".into())));
        assert_eq!(run.italic.value(), Some(&true));
        assert_eq!(run.bold.provenance(), Some(&Provenance::Style("Heading1".into())));
    }

    #[test]
    fn test_cjk_font_slot() {
        let styles = styles();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>摘要</w:t></w:r><w:r><w:t>Abstract</w:t></w:r></w:p>"#,
        ));
        assert!(f.runs[0].cjk);
        assert_eq!(f.runs[0].font_name.value().map(String::as_str), Some("SimHei"));
        assert_eq!(f.runs[1].font_name.value().map(String::as_str), Some("Arial"));
        assert_eq!(f.font_names().len(), 2);
    }

    #[test]
    fn test_unset_with_empty_stylesheet() {
        let styles = StyleSheet::new();
        let resolver = Resolver::new(&styles);
        let f = resolver.resolve(&para(r#"<w:p><w:r><w:t>plain</w:t></w:r></w:p>"#));
        assert_eq!(f.alignment, Resolved::Unset);
        assert_eq!(f.runs[0].font_name, Resolved::Unset);
        assert_eq!(f.runs[0].font_size.to_string(), "unset");
    }

    #[test]
    fn test_is_cjk_text() {
        assert!(is_cjk_text("第1章"));
        assert!(is_cjk_text("한국어"));
        assert!(is_cjk_text("ｶﾀｶﾅ"));
        assert!(!is_cjk_text("Chapter 1"));
    }

    #[test]
    fn test_resolved_document_indices() {
        let mut doc = Document::new();
        doc.styles = styles();
        doc.push_paragraph(Paragraph::with_text("a"));
        doc.push_block(crate::model::Block::Table(crate::model::Table::from_element(
            Element::new("w:tbl"),
        )));
        doc.push_paragraph(Paragraph::with_text("b").with_style("Heading1"));

        let resolved = ResolvedDocument::new(&doc);
        assert_eq!(resolved.len(), 2);
        let b = resolved.paragraph(1).unwrap();
        assert_eq!(b.block_index, 2);
        assert_eq!(b.style_name.as_deref(), Some("heading 1"));
        assert_eq!(resolved.paragraph(0).unwrap().style_id.as_deref(), Some("Normal"));
    }
}
