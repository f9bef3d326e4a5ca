//! End-to-end tests: open, check, annotate, save and reopen.

mod common;

use chrono::{TimeZone, Utc};
use paperlint::pipeline::{CheckOptions, Checker};
use paperlint::{open_bytes, open_file, LocateHint};

fn checker() -> Checker {
    Checker::with_builtin(
        CheckOptions::new()
            .with_author("Reviewer", "RV")
            .with_comment_date(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
    )
    .unwrap()
}

#[test]
fn test_sample_paper_findings() {
    let doc = open_bytes(&common::sample_paper()).unwrap();
    assert_eq!(doc.paragraph_count(), 7);
    assert_eq!(doc.tables().len(), 1);

    let outcome = checker().check(&doc);
    let modules: Vec<&str> = outcome.report.modules.iter().map(|m| m.module.as_str()).collect();
    assert_eq!(modules, vec!["Title", "Abstract", "Keywords", "Headings", "Table", "Figure"]);
    assert!(outcome.report.modules.iter().all(|m| !m.error));

    let sections: Vec<(&str, &str)> = outcome
        .issues
        .iter()
        .map(|i| (i.module.as_str(), i.section.as_str()))
        .collect();
    assert_eq!(
        sections,
        vec![("Keywords", "keywords_text"), ("Table", "caption_format_1")]
    );
    assert_eq!(outcome.summary.failed, 2);
    assert_eq!(
        outcome.issues[1].locate,
        LocateHint::Keyword("Table 1 Measured val".into())
    );

    let title = outcome.report.module("Title").unwrap();
    assert!(title.checks.iter().all(|c| c.ok), "{:?}", title.checks);
}

#[test]
fn test_parallel_and_sequential_reports_match() {
    let doc = open_bytes(&common::sample_paper()).unwrap();
    let parallel = checker().check(&doc);
    let sequential = Checker::new(
        checker().registry().clone(),
        checker().options().clone().sequential(),
    )
    .check(&doc);
    assert_eq!(parallel.report, sequential.report);
    assert_eq!(parallel.issues, sequential.issues);
}

#[test]
fn test_annotated_copy_round_trip() {
    let bytes = common::sample_paper();
    let doc = open_bytes(&bytes).unwrap();
    let run = checker().run(&doc).unwrap();
    assert_eq!(run.annotated.placed.len(), 2);
    assert!(run.annotated.unplaced.is_empty());
    assert!(doc.comments.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paper_annotated.docx");
    run.annotated.document.save(&path).unwrap();

    let reopened = open_file(&path).unwrap();
    assert_eq!(reopened.paragraph_count(), doc.paragraph_count());
    assert_eq!(reopened.plain_text(), doc.plain_text());
    assert_eq!(reopened.comments.len(), 2);
    assert_eq!(reopened.comments.people().len(), 1);
    assert_eq!(reopened.comments.people()[0].author, "Reviewer");

    let first = &reopened.comments.comments()[0];
    assert_eq!(first.initials, "RV");
    assert_eq!(first.date.as_deref(), Some("2024-03-01T09:00:00Z"));
    assert!(first.text().contains("[Keywords-keywords_text]"));
    assert!(first.text().contains("• Found 2 items, expected 3 to 8"));

    let xml = reopened.package().part_text("word/document.xml").unwrap();
    assert_eq!(xml.matches("<w:commentRangeStart").count(), 2);
    assert_eq!(xml.matches("<w:commentRangeEnd").count(), 2);
    assert_eq!(xml.matches("<w:commentReference").count(), 2);

    let content_types = reopened.package().part_text("[Content_Types].xml").unwrap();
    assert_eq!(content_types.matches("/word/comments.xml").count(), 1);
    assert_eq!(content_types.matches("/word/people.xml").count(), 1);

    // Unrelated parts are carried over unchanged.
    assert_eq!(
        reopened.package().part("word/styles.xml"),
        Some(common::STYLES.as_bytes())
    );
}

#[test]
fn test_second_pass_continues_ids() {
    let doc = open_bytes(&common::sample_paper()).unwrap();
    let first = checker().run(&doc).unwrap().annotated.document;
    let reopened = open_bytes(&first.to_bytes().unwrap()).unwrap();
    let existing: Vec<u32> = reopened.comments.comments().iter().map(|c| c.id).collect();

    let second = checker().run(&reopened).unwrap();
    let all: Vec<u32> = second
        .annotated
        .document
        .comments
        .comments()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(all.len(), 4);
    let max_existing = existing.iter().copied().max().unwrap();
    for placement in &second.annotated.placed {
        assert!(placement.comment_id > max_existing);
    }
    // One person record despite two passes by the same author.
    assert_eq!(second.annotated.document.comments.people().len(), 1);
}

#[test]
fn test_missing_styles_part_reports_unset() {
    let body = common::para(None, &["A Title Without Styles"]);
    let doc = open_bytes(&common::build_docx(&body, None)).unwrap();
    let outcome = checker().check(&doc);

    let title = outcome.report.module("Title").unwrap();
    let size = title.check("title_font_size").unwrap();
    assert!(!size.ok);
    assert_eq!(size.messages, vec!["Font size: expected 16pt, found unset".to_string()]);
}

#[test]
fn test_indented_body_table_placement() {
    let elements = [
        common::para(None, &["Table 1 Measured values"]),
        common::para(None, &["First note."]),
        common::para(None, &["Second note."]),
        common::table("42"),
    ];
    let body = format!("\n  {}\n  ", elements.join("\n  "));
    let doc = open_bytes(&common::build_docx(&body, Some(common::STYLES))).unwrap();
    assert!(doc.body.len() > elements.len());

    let outcome = checker().check(&doc);
    let placement = outcome
        .report
        .module("Table")
        .and_then(|m| m.check("placement"))
        .unwrap();
    assert!(placement.ok, "{:?}", placement);
}
