//! # paperlint
//!
//! Formatting checks for Word (`.docx`) papers, with every failure written
//! back into a copy of the document as a native review comment.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paperlint::{check_file, render};
//!
//! fn main() -> paperlint::Result<()> {
//!     // Run the built-in rule modules
//!     let outcome = check_file("paper.docx")?;
//!
//!     // Print the text report
//!     println!("{}", render::to_text(&outcome.report));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Format resolution**: run, paragraph, style chain and document defaults,
//!   with the source of every value
//! - **Pluggable rules**: JSON templates and caption checks, run in parallel
//!   with per-module fault isolation
//! - **Review comments**: rich text or table comment bodies, anchored on the
//!   offending paragraph
//! - **Reports**: plain text and JSON

pub mod annotate;
pub mod detect;
pub mod error;
pub mod locate;
pub mod model;
pub mod package;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod resolve;
pub mod rules;

// Re-export commonly used types
pub use annotate::{attach, Annotator, Comment, CommentBody, CommentRun, CommentTable};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use error::{Error, Result};
pub use model::{
    Alignment, Block, Document, Length, LineSpacing, Metadata, Paragraph, Run, Style, StyleSheet,
    Table,
};
pub use parser::{DocxParser, ErrorMode, ParseOptions};
pub use pipeline::{Annotated, CheckOptions, CheckOutcome, Checker};
pub use render::{JsonFormat, RenderOptions};
pub use report::{Check, Issue, LocateHint, Report, Summary};
pub use resolve::{Provenance, Resolved, ResolvedDocument};
pub use rules::{RuleModule, RuleRegistry, Template, TemplateModule};

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Open a `.docx` file.
///
/// # Example
///
/// ```no_run
/// let doc = paperlint::open_file("paper.docx").unwrap();
/// println!("Paragraphs: {}", doc.paragraph_count());
/// ```
pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    open_file_with_options(path, ParseOptions::default())
}

/// Open a `.docx` file with custom options.
pub fn open_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    DocxParser::open_with_options(path, options)?.parse()
}

/// Open a `.docx` package held in memory.
pub fn open_bytes(data: &[u8]) -> Result<Document> {
    DocxParser::from_bytes(data)?.parse()
}

/// Open a `.docx` package from a reader.
pub fn open_reader<R: Read>(reader: R) -> Result<Document> {
    DocxParser::from_reader(reader)?.parse()
}

/// Check a file with the built-in rule modules.
pub fn check_file<P: AsRef<Path>>(path: P) -> Result<CheckOutcome> {
    let document = open_file(path)?;
    Ok(Checker::with_builtin(CheckOptions::default())?.check(&document))
}

/// Builder for a configured check run.
///
/// # Example
///
/// ```no_run
/// use paperlint::Paperlint;
///
/// let result = Paperlint::new()
///     .lenient()
///     .with_author("Reviewer", "RV")
///     .check("paper.docx")?;
/// result.save_annotated("paper_annotated.docx")?;
/// println!("{}", result.to_text());
/// # Ok::<(), paperlint::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Paperlint {
    parse_options: ParseOptions,
    check_options: CheckOptions,
    render_options: RenderOptions,
    builtin: bool,
    templates: Vec<PathBuf>,
}

impl Paperlint {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            check_options: CheckOptions::default(),
            render_options: RenderOptions::default(),
            builtin: true,
            templates: Vec::new(),
        }
    }

    /// Enable lenient parsing mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Disable parallel module execution.
    pub fn sequential(mut self) -> Self {
        self.check_options = self.check_options.sequential();
        self
    }

    /// Set the comment author.
    pub fn with_author(mut self, author: impl Into<String>, initials: impl Into<String>) -> Self {
        self.check_options = self.check_options.with_author(author, initials);
        self
    }

    /// Add a template file. A template with a built-in module's name replaces it.
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates.push(path.into());
        self
    }

    /// Skip the built-in modules.
    pub fn without_builtin(mut self) -> Self {
        self.builtin = false;
        self
    }

    /// Set text report options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Build the checker described by this builder.
    pub fn checker(&self) -> Result<Checker> {
        let mut registry = if self.builtin {
            RuleRegistry::with_builtin()?
        } else {
            RuleRegistry::new()
        };
        for path in &self.templates {
            registry.register(Arc::new(TemplateModule::from_path(path)?));
        }
        Ok(Checker::new(registry, self.check_options.clone()))
    }

    /// Check and annotate a file.
    pub fn check<P: AsRef<Path>>(self, path: P) -> Result<PaperlintResult> {
        let document = open_file_with_options(path, self.parse_options.clone())?;
        self.check_document(document)
    }

    /// Check and annotate a package held in memory.
    pub fn check_bytes(self, data: &[u8]) -> Result<PaperlintResult> {
        let document = DocxParser::from_bytes_with_options(data, self.parse_options.clone())?.parse()?;
        self.check_document(document)
    }

    fn check_document(self, document: Document) -> Result<PaperlintResult> {
        let run = self.checker()?.run(&document)?;
        Ok(PaperlintResult {
            run,
            render_options: self.render_options,
        })
    }
}

impl Default for Paperlint {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a configured check run.
#[derive(Debug, Clone)]
pub struct PaperlintResult {
    /// Check results and the annotated copy
    pub run: pipeline::Run,
    render_options: RenderOptions,
}

impl PaperlintResult {
    /// Overall counts.
    pub fn summary(&self) -> Summary {
        self.run.outcome.summary
    }

    /// Text report including unplaced issues.
    pub fn to_text(&self) -> String {
        self.run.text_report(&self.render_options)
    }

    /// JSON report including issues.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json_with_issues(&self.run.outcome.report, &self.run.outcome.issues, format)
    }

    /// The annotated copy.
    pub fn annotated(&self) -> &Document {
        &self.run.annotated.document
    }

    /// Write the annotated copy.
    pub fn save_annotated<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.run.annotated.document.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let builder = Paperlint::new()
            .lenient()
            .sequential()
            .with_author("Reviewer", "RV")
            .without_builtin();

        assert!(builder.parse_options.is_lenient());
        assert!(!builder.check_options.parallel);
        assert_eq!(builder.check_options.initials, "RV");
        assert!(builder.checker().unwrap().registry().is_empty());
    }

    #[test]
    fn test_builder_with_template_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("title.json");
        std::fs::write(
            &path,
            r#"{"module":"Title","sections":[{"name":"title","select":{"first_nonempty":true}}]}"#,
        )
        .unwrap();

        let checker = Paperlint::new().with_template(&path).checker().unwrap();
        assert_eq!(checker.registry().names()[0], "Title");
        assert_eq!(checker.registry().len(), 6);
    }

    #[test]
    fn test_missing_template_file() {
        let result = Paperlint::new().with_template("/nonexistent/template.json").checker();
        assert!(matches!(result, Err(Error::Io(_))));
    }

    // ==================== Edge Case Tests ====================

    #[test]
    fn test_open_bytes_empty_data() {
        assert!(open_bytes(&[]).is_err());
    }

    #[test]
    fn test_open_bytes_not_a_package() {
        let result = open_bytes(b"%PDF-1.7 not a docx");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_open_file_nonexistent() {
        assert!(open_file("/nonexistent/path/paper.docx").is_err());
    }

    #[test]
    fn test_check_bytes_round_trip() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::with_text("A Title"));
        let bytes = doc.to_bytes().unwrap();

        let result = Paperlint::new().sequential().check_bytes(&bytes).unwrap();
        assert!(result.summary().total > 0);
        assert!(!result.annotated().comments.is_empty());
        assert!(result.to_text().contains("[Overall]"));
        assert!(result.to_json(JsonFormat::Compact).unwrap().contains("\"issues\""));
    }
}
