//! Writing review comments into a document.
//!
//! [`attach`] is the low-level operation: it anchors one comment on one
//! paragraph and records it in the comments part. [`Annotator`] places a
//! list of issues, locating each one and skipping those that cannot be
//! placed.

mod comment;
mod part;

pub use comment::{CommentBlock, CommentBody, CommentRun, CommentTable};
pub use part::{Comment, CommentsPart, Person, COMMENTS_CONTENT_TYPE, PEOPLE_CONTENT_TYPE};

use crate::error::{Error, Result};
use crate::locate::locate;
use crate::model::{Document, Inline, Paragraph, Run};
use crate::package::xml::{Element, Node};
use crate::report::Issue;
use chrono::{DateTime, Utc};
use serde::Serialize;

const COMMENT_REFERENCE_STYLE: &str = "CommentReference";

/// Attach a comment to the top-level paragraph at `paragraph_index`.
///
/// The comment range wraps every run of the paragraph (an empty run is added
/// first when it has none) and the reference mark follows the range end.
pub fn attach(
    document: &mut Document,
    paragraph_index: usize,
    author: &str,
    initials: &str,
    body: &CommentBody,
    date: Option<DateTime<Utc>>,
) -> Result<Comment> {
    if document.paragraph(paragraph_index).is_none() {
        return Err(Error::InvalidAnchor(format!(
            "paragraph {paragraph_index} does not exist"
        )));
    }
    let reference_style = document
        .styles
        .contains(COMMENT_REFERENCE_STYLE)
        .then_some(COMMENT_REFERENCE_STYLE);

    let id = document.comments.allocate_id()?;
    let paragraph = document
        .paragraph_mut(paragraph_index)
        .ok_or_else(|| Error::InvalidAnchor(format!("paragraph {paragraph_index} does not exist")))?;
    wrap_anchor(paragraph, id, reference_style);

    let date = date.map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let element = comment_element(id, author, initials, date.as_deref(), body, reference_style);
    let comment = Comment::new(id, author, initials, date, element);

    document.comments.push(comment.clone());
    document.comments.ensure_person(author);

    log::debug!("Attached comment {} to paragraph {}", id, paragraph_index);
    Ok(comment)
}

/// Remove a comment and its range and reference marks.
///
/// The removed id stays retired: later comments never reuse it.
pub fn remove(document: &mut Document, id: u32) -> Result<Comment> {
    let comment = document
        .comments
        .remove(id)
        .ok_or_else(|| Error::Other(format!("no comment with id {id}")))?;

    let id = id.to_string();
    for block in &mut document.body {
        if let crate::model::Block::Paragraph(p) = block {
            strip_marks(&mut p.content, &id);
        }
    }
    Ok(comment)
}

fn wrap_anchor(paragraph: &mut Paragraph, id: u32, reference_style: Option<&str>) {
    let content = &mut paragraph.content;
    let (first, last) = match content.iter().position(Inline::has_runs) {
        Some(first) => {
            let last = content.iter().rposition(Inline::has_runs).unwrap_or(first);
            (first, last)
        }
        None => {
            content.push(Inline::Run(Run::empty()));
            (content.len() - 1, content.len() - 1)
        }
    };

    let id = id.to_string();
    let mark = |name: &str| {
        Inline::Other(Node::Element(Element::new(name).with_attr("w:id", id.as_str())))
    };

    let mut reference = Run::empty();
    if let Some(style) = reference_style {
        reference = reference.style(style);
    }
    reference.content.push(Node::Element(
        Element::new("w:commentReference").with_attr("w:id", id.as_str()),
    ));

    content.insert(last + 1, mark("w:commentRangeEnd"));
    content.insert(last + 2, Inline::Run(reference));
    content.insert(first, mark("w:commentRangeStart"));
}

fn comment_element(
    id: u32,
    author: &str,
    initials: &str,
    date: Option<&str>,
    body: &CommentBody,
    reference_style: Option<&str>,
) -> Element {
    let mut element = Element::new("w:comment")
        .with_attr("w:id", id.to_string())
        .with_attr("w:author", author);
    if let Some(date) = date {
        element.set_attr("w:date", date);
    }
    element.set_attr("w:initials", initials);

    let mut annotation = Element::new("w:r");
    if let Some(style) = reference_style {
        annotation = annotation.with_child(
            Element::new("w:rPr").with_child(Element::new("w:rStyle").with_attr("w:val", style)),
        );
    }
    let annotation = annotation.with_child(Element::new("w:annotationRef"));

    let mut blocks = body.to_elements();
    match blocks.iter_mut().find(|b| b.is("w:p")) {
        Some(first_paragraph) => first_paragraph.children.insert(0, Node::Element(annotation)),
        None => blocks.insert(0, Element::new("w:p").with_child(annotation)),
    }
    element.children = blocks.into_iter().map(Node::Element).collect();
    element
}

fn strip_marks(content: &mut Vec<Inline>, id: &str) {
    content.retain(|item| match item {
        Inline::Other(Node::Element(e)) => {
            !((e.is("w:commentRangeStart") || e.is("w:commentRangeEnd")) && e.attr("w:id") == Some(id))
        }
        Inline::Run(run) => !run.content.iter().any(|n| {
            matches!(n, Node::Element(e) if e.is("w:commentReference") && e.attr("w:id") == Some(id))
        }),
        _ => true,
    });
    for item in content.iter_mut() {
        if let Inline::Container { content, .. } = item {
            strip_marks(content, id);
        }
    }
}

/// The comment body written for an issue: a bold `[Module-section]` line
/// followed by one bulleted paragraph per message.
pub fn issue_body(issue: &Issue) -> CommentBody {
    let mut body = CommentBody::new().paragraph(vec![CommentRun::plain(issue.heading()).bold()]);
    for message in &issue.messages {
        body = body.paragraph(vec![CommentRun::plain(format!("• {message}"))]);
    }
    body
}

/// An issue that received a comment.
#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    /// The issue
    pub issue: Issue,
    /// Paragraph it was anchored on
    pub paragraph_index: usize,
    /// Comment id
    pub comment_id: u32,
}

/// What happened to each issue during annotation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationOutcome {
    /// Issues that received a comment
    pub placed: Vec<Placement>,
    /// Issues whose locate hint matched no paragraph
    pub unplaced: Vec<Issue>,
    /// Issues whose comment could not be attached, with the reason
    pub failed: Vec<(Issue, String)>,
}

/// Places issues as comments with a fixed author identity.
#[derive(Debug, Clone)]
pub struct Annotator {
    author: String,
    initials: String,
    date: Option<DateTime<Utc>>,
}

impl Annotator {
    /// Create an annotator for an author.
    pub fn new(author: impl Into<String>, initials: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            initials: initials.into(),
            date: None,
        }
    }

    /// Stamp comments with a fixed date instead of the current time.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Place every issue on `document`, in order.
    ///
    /// Misses and attach failures are logged and recorded; they never stop
    /// the remaining issues.
    pub fn annotate(&self, document: &mut Document, issues: &[Issue]) -> AnnotationOutcome {
        let date = self.date.unwrap_or_else(Utc::now);
        let mut outcome = AnnotationOutcome::default();

        for issue in issues {
            let Some(index) = locate(document, &issue.locate) else {
                log::warn!(
                    "No paragraph for {} ({} '{}'); issue kept in report only",
                    issue.heading(),
                    issue.locate.method(),
                    issue.locate.data()
                );
                outcome.unplaced.push(issue.clone());
                continue;
            };

            let body = issue_body(issue);
            match attach(document, index, &self.author, &self.initials, &body, Some(date)) {
                Ok(comment) => outcome.placed.push(Placement {
                    issue: issue.clone(),
                    paragraph_index: index,
                    comment_id: comment.id,
                }),
                Err(e) => {
                    log::warn!("Could not attach comment for {}: {}", issue.heading(), e);
                    outcome.failed.push((issue.clone(), e.to_string()));
                }
            }
        }

        log::debug!(
            "Annotation: {} placed, {} unplaced, {} failed",
            outcome.placed.len(),
            outcome.unplaced.len(),
            outcome.failed.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::LocateHint;

    fn doc(texts: &[&str]) -> Document {
        let mut doc = Document::new();
        for text in texts {
            doc.push_paragraph(Paragraph::with_text(*text));
        }
        doc
    }

    fn names(p: &Paragraph) -> Vec<String> {
        p.clone()
            .into_element()
            .elements()
            .map(|e| e.name.clone())
            .collect()
    }

    #[test]
    fn test_anchor_layout() {
        let mut d = doc(&["a"]);
        d.paragraph_mut(0).unwrap().push_run(Run::new("b"));
        attach(&mut d, 0, "R", "r", &CommentBody::plain("x"), None).unwrap();
        assert_eq!(
            names(d.paragraph(0).unwrap()),
            vec!["w:commentRangeStart", "w:r", "w:r", "w:commentRangeEnd", "w:r"]
        );
        assert_eq!(d.paragraph(0).unwrap().text(), "ab");
    }

    #[test]
    fn test_empty_paragraph_gets_anchor_run() {
        let mut d = Document::new();
        d.push_paragraph(Paragraph::new());
        attach(&mut d, 0, "R", "r", &CommentBody::plain("x"), None).unwrap();
        assert_eq!(
            names(d.paragraph(0).unwrap()),
            vec!["w:commentRangeStart", "w:r", "w:commentRangeEnd", "w:r"]
        );
    }

    #[test]
    fn test_ids_distinct_and_untouched_paragraphs() {
        let mut d = doc(&["p0", "p1", "p2", "p3"]);
        let before = d.paragraph(3).unwrap().clone();
        let ids: Vec<u32> = (0..3)
            .map(|i| attach(&mut d, i, "R", "r", &CommentBody::plain("m"), None).unwrap().id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(d.paragraph(3).unwrap(), &before);
        assert_eq!(d.comments.people().len(), 1);
    }

    #[test]
    fn test_missing_paragraph_is_invalid_anchor() {
        let mut d = doc(&["only"]);
        let err = attach(&mut d, 5, "R", "r", &CommentBody::plain("x"), None).unwrap_err();
        assert!(matches!(err, Error::InvalidAnchor(_)));
        assert_eq!(d.comments.next_id(), Some(0));
    }

    #[test]
    fn test_remove_keeps_id_retired() {
        let mut d = doc(&["p0"]);
        let c = attach(&mut d, 0, "R", "r", &CommentBody::plain("x"), None).unwrap();
        remove(&mut d, c.id).unwrap();
        assert_eq!(names(d.paragraph(0).unwrap()), vec!["w:r"]);
        let next = attach(&mut d, 0, "R", "r", &CommentBody::plain("y"), None).unwrap();
        assert_eq!(next.id, 1);
        assert!(remove(&mut d, 99).is_err());
    }

    #[test]
    fn test_comment_element_and_text() {
        let mut d = doc(&["p0"]);
        let body = CommentBody::new()
            .paragraph(vec![CommentRun::plain("Bold").bold(), CommentRun::plain(" plain").italic()])
            .table(CommentTable::from_rows(&[vec!["a", "b"], vec!["c", "d"]]).unwrap());
        let comment = attach(&mut d, 0, "Reviewer", "RV", &body, None).unwrap();
        assert_eq!(comment.text(), body.plain_text());
        assert_eq!(comment.element().attr("w:initials"), Some("RV"));
        assert_eq!(comment.element().descendants_named("w:annotationRef").len(), 1);
    }

    #[test]
    fn test_table_only_body_gets_marker_paragraph() {
        let mut d = doc(&["p0"]);
        let body = CommentBody::new().table(CommentTable::from_rows(&[vec!["k"]]).unwrap());
        let comment = attach(&mut d, 0, "R", "r", &body, None).unwrap();
        assert_eq!(comment.element().elements().next().unwrap().name, "w:p");
        assert_eq!(comment.text(), "k");
    }

    #[test]
    fn test_annotator_places_and_skips() {
        let mut d = doc(&["Title", "Abstract here", "Body"]);
        let issues = vec![
            Issue {
                module: "Abstract".into(),
                section: "font".into(),
                locate: LocateHint::Keyword("Abstract".into()),
                messages: vec!["expected SimHei".into()],
            },
            Issue {
                module: "Keywords".into(),
                section: "presence".into(),
                locate: LocateHint::Keyword("Keywords:".into()),
                messages: vec!["missing".into()],
            },
        ];
        let outcome = Annotator::new("Checker", "CK").annotate(&mut d, &issues);
        assert_eq!(outcome.placed.len(), 1);
        assert_eq!(outcome.placed[0].paragraph_index, 1);
        assert_eq!(outcome.unplaced.len(), 1);
        assert!(outcome.failed.is_empty());

        let comment = &d.comments.comments()[0];
        assert_eq!(comment.text(), "[Abstract-font]\n• expected SimHei");
        assert!(comment.date.is_some());
    }
}
