//! The check-then-annotate pipeline.
//!
//! ```no_run
//! use paperlint::pipeline::{CheckOptions, Checker};
//!
//! fn main() -> paperlint::Result<()> {
//!     let document = paperlint::open_file("paper.docx")?;
//!     let checker = Checker::with_builtin(CheckOptions::new().with_author("Reviewer", "RV"))?;
//!     let run = checker.run(&document)?;
//!     run.annotated.document.save("paper_annotated.docx")?;
//!     println!(
//!         "{} comments, {} unplaced",
//!         run.annotated.placed.len(),
//!         run.annotated.unplaced.len()
//!     );
//!     Ok(())
//! }
//! ```

use crate::annotate::{Annotator, Placement};
use crate::error::{Error, Result};
use crate::model::Document;
use crate::render::{render_text, RenderOptions};
use crate::report::{aggregate, Issue, Report, Summary};
use crate::resolve::ResolvedDocument;
use crate::rules::RuleRegistry;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

/// Options for checking and annotating.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Comment author
    pub author: String,

    /// Comment author initials
    pub initials: String,

    /// Run rule modules in parallel
    pub parallel: bool,

    /// Fixed comment date (current time when absent)
    pub comment_date: Option<DateTime<Utc>>,
}

impl CheckOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the comment author and initials.
    pub fn with_author(mut self, author: impl Into<String>, initials: impl Into<String>) -> Self {
        self.author = author.into();
        self.initials = initials.into();
        self
    }

    /// Run modules one after another.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Stamp all comments with a fixed date.
    pub fn with_comment_date(mut self, date: DateTime<Utc>) -> Self {
        self.comment_date = Some(date);
        self
    }
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            author: "paperlint".to_string(),
            initials: "PL".to_string(),
            parallel: true,
            comment_date: None,
        }
    }
}

/// Results of checking a document.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Per-module results
    pub report: Report,
    /// Overall counts
    pub summary: Summary,
    /// Failures to place as comments
    pub issues: Vec<Issue>,
}

/// An annotated working copy.
#[derive(Debug, Clone)]
pub struct Annotated {
    /// The copy with comments attached
    pub document: Document,
    /// Issues that received a comment
    pub placed: Vec<Placement>,
    /// Issues whose paragraph was not found
    pub unplaced: Vec<Issue>,
    /// Issues whose comment could not be attached
    pub failed: Vec<(Issue, String)>,
}

/// A full pipeline run.
#[derive(Debug, Clone)]
pub struct Run {
    /// Check results
    pub outcome: CheckOutcome,
    /// Annotated copy
    pub annotated: Annotated,
}

impl Run {
    /// Text report including the unplaced issues.
    pub fn text_report(&self, options: &RenderOptions) -> String {
        render_text(&self.outcome.report, &self.annotated.unplaced, options)
    }
}

/// Runs rule modules over documents and annotates copies with the failures.
#[derive(Debug, Clone)]
pub struct Checker {
    registry: RuleRegistry,
    options: CheckOptions,
}

impl Checker {
    /// Create a checker over a registry.
    pub fn new(registry: RuleRegistry, options: CheckOptions) -> Self {
        let registry = registry.with_parallel(options.parallel);
        Self { registry, options }
    }

    /// Create a checker over the built-in modules.
    pub fn with_builtin(options: CheckOptions) -> Result<Self> {
        Ok(Self::new(RuleRegistry::with_builtin()?, options))
    }

    /// The registry.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// The options.
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Resolve the document and run every module.
    pub fn check(&self, document: &Document) -> CheckOutcome {
        log::debug!("Resolving {} paragraphs", document.paragraph_count());
        let resolved = ResolvedDocument::new(document);
        let report = self.registry.run_all(&resolved);
        let summary = report.summary();
        let issues = aggregate(&report);
        log::debug!(
            "Checked: {}/{} passed, {} issues",
            summary.passed,
            summary.total,
            issues.len()
        );
        CheckOutcome {
            report,
            summary,
            issues,
        }
    }

    /// Annotate a copy of `document` with the outcome's issues.
    ///
    /// The original is never modified.
    pub fn annotate(&self, document: &Document, outcome: &CheckOutcome) -> Annotated {
        let mut copy = document.clone();
        let result = self.annotator().annotate(&mut copy, &outcome.issues);
        Annotated {
            document: copy,
            placed: result.placed,
            unplaced: result.unplaced,
            failed: result.failed,
        }
    }

    /// Check and annotate.
    pub fn run(&self, document: &Document) -> Result<Run> {
        let outcome = self.check(document);
        let annotated = self.annotate(document, &outcome);
        Ok(Run { outcome, annotated })
    }

    /// Check and annotate, giving up with [`Error::Cancelled`] when `cancel`
    /// is set between stages. A cancelled run produces no annotated copy.
    pub fn run_cancellable(&self, document: &Document, cancel: &AtomicBool) -> Result<Run> {
        let checkpoint = |stage: &str| {
            if cancel.load(Ordering::Relaxed) {
                log::debug!("Cancelled before {stage}");
                Err(Error::Cancelled)
            } else {
                Ok(())
            }
        };

        checkpoint("checking")?;
        let outcome = self.check(document);
        checkpoint("annotation")?;
        let annotated = self.annotate(document, &outcome);
        checkpoint("completion")?;
        Ok(Run { outcome, annotated })
    }

    fn annotator(&self) -> Annotator {
        let annotator = Annotator::new(&self.options.author, &self.options.initials);
        match self.options.comment_date {
            Some(date) => annotator.with_date(date),
            None => annotator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Paragraph, Run as TextRun};
    use crate::report::LocateHint;
    use chrono::TimeZone;

    fn document() -> Document {
        let mut doc = Document::new();
        let mut title = Paragraph::new().with_alignment(Alignment::Center);
        title.push_run(TextRun::new("Formatting of Things").bold().size(16.0));
        doc.push_paragraph(title);
        doc.push_paragraph(Paragraph::with_text("Keywords: one, two"));
        doc
    }

    fn checker() -> Checker {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Checker::with_builtin(
            CheckOptions::new()
                .with_author("Reviewer", "RV")
                .with_comment_date(date)
                .sequential(),
        )
        .unwrap()
    }

    #[test]
    fn test_run_leaves_original_untouched() {
        let doc = document();
        let run = checker().run(&doc).unwrap();

        assert!(doc.comments.is_empty());
        assert!(run.outcome.summary.failed > 0);
        assert_eq!(
            run.annotated.placed.len() + run.annotated.unplaced.len() + run.annotated.failed.len(),
            run.outcome.issues.len()
        );
        assert_eq!(run.annotated.document.comments.len(), run.annotated.placed.len());
        let comment = &run.annotated.document.comments.comments()[0];
        assert_eq!(comment.author, "Reviewer");
        assert_eq!(comment.date.as_deref(), Some("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_abstract_missing_is_placed_at_fallback() {
        let doc = document();
        let checker = checker();
        let outcome = checker.check(&doc);
        let missing = outcome
            .issues
            .iter()
            .find(|i| i.module == "Abstract" && i.section == "abstract_presence")
            .unwrap();
        assert_eq!(missing.locate, LocateHint::Index(0));

        let annotated = checker.annotate(&doc, &outcome);
        assert!(annotated
            .placed
            .iter()
            .any(|p| p.issue.section == "abstract_presence" && p.paragraph_index == 0));
    }

    #[test]
    fn test_cancelled_run() {
        let cancel = AtomicBool::new(true);
        let result = checker().run_cancellable(&document(), &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));

        let cancel = AtomicBool::new(false);
        assert!(checker().run_cancellable(&document(), &cancel).is_ok());
    }

    #[test]
    fn test_text_report_lists_unplaced() {
        let doc = document();
        let checker = checker();
        let outcome = checker.check(&doc);
        let mut annotated = checker.annotate(&doc, &outcome);
        annotated.unplaced.push(Issue {
            module: "Custom".into(),
            section: "gone".into(),
            locate: LocateHint::Keyword("nowhere".into()),
            messages: vec!["lost".into()],
        });
        let run = Run { outcome, annotated };
        let text = run.text_report(&RenderOptions::default());
        assert!(text.contains("Unplaced issues (1)"));
        assert!(text.contains("[Custom-gone] (keyword nowhere)"));
    }
}
