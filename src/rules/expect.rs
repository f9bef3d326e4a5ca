//! Expected-format rules and their evaluation against resolved formats.

use crate::model::{Alignment, Length, LineSpacing};
use crate::resolve::{Resolved, ResolvedFormat, ResolvedRun};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Font size tolerance in points.
pub const SIZE_TOLERANCE: f32 = 0.5;
/// Indent and paragraph spacing tolerance in points.
pub const INDENT_TOLERANCE: f32 = 1.0;
/// Line spacing multiple tolerance.
pub const SPACING_TOLERANCE: f32 = 0.1;

/// Expected line spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacingRule {
    /// Multiple of single spacing
    Multiple(f32),
    /// Exact height in points
    Exact(f32),
    /// Minimum height in points
    AtLeast(f32),
}

impl LineSpacingRule {
    fn expected(self) -> LineSpacing {
        match self {
            LineSpacingRule::Multiple(m) => LineSpacing::Multiple(m),
            LineSpacingRule::Exact(pt) => LineSpacing::Exact(Length(pt)),
            LineSpacingRule::AtLeast(pt) => LineSpacing::AtLeast(Length(pt)),
        }
    }

    fn matches(self, actual: &LineSpacing) -> bool {
        match (self, actual) {
            (LineSpacingRule::Multiple(e), LineSpacing::Multiple(a)) => (e - a).abs() <= SPACING_TOLERANCE,
            (LineSpacingRule::Exact(e), LineSpacing::Exact(a))
            | (LineSpacingRule::AtLeast(e), LineSpacing::AtLeast(a)) => {
                (e - a.pt()).abs() <= INDENT_TOLERANCE
            }
            _ => false,
        }
    }
}

/// Expected paragraph and character formatting. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatRule {
    /// Font for non-CJK text (and CJK text when `font_name_cjk` is absent)
    pub font_name: Option<String>,
    /// Font for CJK text
    pub font_name_cjk: Option<String>,
    /// Font size in points
    pub font_size: Option<f32>,
    /// Bold
    pub bold: Option<bool>,
    /// Italic
    pub italic: Option<bool>,
    /// Alignment
    pub alignment: Option<Alignment>,
    /// Line spacing
    pub line_spacing: Option<LineSpacingRule>,
    /// First-line indent in points (negative for hanging)
    pub first_line_indent: Option<f32>,
    /// Left indent in points
    pub left_indent: Option<f32>,
    /// Right indent in points
    pub right_indent: Option<f32>,
    /// Space before in points
    pub space_before: Option<f32>,
    /// Space after in points
    pub space_after: Option<f32>,
}

/// One failed attribute: the attribute key and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Attribute key (`font_size`, `alignment`)
    pub attribute: &'static str,
    /// Human-readable message
    pub message: String,
}

impl FormatRule {
    /// Whether the rule checks nothing.
    pub fn is_empty(&self) -> bool {
        *self == FormatRule::default()
    }

    /// Attribute keys this rule checks, in evaluation order.
    pub fn attributes(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.font_name.is_some() || self.font_name_cjk.is_some() {
            keys.push("font_name");
        }
        let optional = [
            ("font_size", self.font_size.is_some()),
            ("bold", self.bold.is_some()),
            ("italic", self.italic.is_some()),
            ("alignment", self.alignment.is_some()),
            ("line_spacing", self.line_spacing.is_some()),
            ("first_line_indent", self.first_line_indent.is_some()),
            ("left_indent", self.left_indent.is_some()),
            ("right_indent", self.right_indent.is_some()),
            ("space_before", self.space_before.is_some()),
            ("space_after", self.space_after.is_some()),
        ];
        keys.extend(optional.iter().filter(|(_, set)| *set).map(|(k, _)| *k));
        keys
    }

    /// Compare a resolved format against the rule.
    ///
    /// Toggles, alignment, indents, spacing and line spacing have a value
    /// defined by the file format when nothing sets them (off, left, zero,
    /// single), so `Unset` satisfies an expectation equal to that value.
    /// Font name and size have no such value: `Unset` always fails them.
    pub fn evaluate(&self, format: &ResolvedFormat) -> Vec<Mismatch> {
        let mut out = Vec::new();

        if self.font_name.is_some() || self.font_name_cjk.is_some() {
            let mismatched: Vec<&ResolvedRun> = format
                .text_runs()
                .filter(|run| match self.font_for(run) {
                    Some(expected) => !matches!(
                        run.font_name.value(),
                        Some(actual) if actual.eq_ignore_ascii_case(expected)
                    ),
                    None => false,
                })
                .collect();
            if !mismatched.is_empty() {
                let expected = match (&self.font_name, &self.font_name_cjk) {
                    (Some(latin), Some(cjk)) if latin != cjk => format!("{latin} / {cjk} (CJK)"),
                    (Some(name), _) | (None, Some(name)) => name.clone(),
                    (None, None) => String::new(),
                };
                out.push(Mismatch {
                    attribute: "font_name",
                    message: format!(
                        "Font: expected {expected}, found {}",
                        describe_all(mismatched.iter().map(|r| &r.font_name))
                    ),
                });
            }
        }

        if let Some(size) = self.font_size {
            let expected = Length(size);
            let wrong: Vec<&Resolved<Length>> = format
                .text_runs()
                .map(|r| &r.font_size)
                .filter(|v| !matches!(v.value(), Some(a) if (a.pt() - size).abs() <= SIZE_TOLERANCE))
                .collect();
            if !wrong.is_empty() {
                out.push(Mismatch {
                    attribute: "font_size",
                    message: format!(
                        "Font size: expected {expected}, found {}",
                        describe_all(wrong.into_iter())
                    ),
                });
            }
        }

        if let Some(expected) = self.bold {
            if let Some(m) = toggle_mismatch("bold", "Bold", expected, format.text_runs().map(|r| &r.bold)) {
                out.push(m);
            }
        }
        if let Some(expected) = self.italic {
            if let Some(m) = toggle_mismatch("italic", "Italic", expected, format.text_runs().map(|r| &r.italic)) {
                out.push(m);
            }
        }

        if let Some(expected) = self.alignment {
            let actual = format.alignment.value().copied().unwrap_or(Alignment::Left);
            if actual != expected {
                out.push(Mismatch {
                    attribute: "alignment",
                    message: format!(
                        "Alignment: expected {expected}, found {}",
                        describe(&format.alignment)
                    ),
                });
            }
        }

        if let Some(rule) = self.line_spacing {
            let actual = format
                .line_spacing
                .value()
                .copied()
                .unwrap_or(LineSpacing::Multiple(1.0));
            if !rule.matches(&actual) {
                out.push(Mismatch {
                    attribute: "line_spacing",
                    message: format!(
                        "Line spacing: expected {}, found {}",
                        rule.expected(),
                        describe(&format.line_spacing)
                    ),
                });
            }
        }

        let lengths = [
            ("first_line_indent", "First-line indent", self.first_line_indent, &format.first_line_indent),
            ("left_indent", "Left indent", self.left_indent, &format.left_indent),
            ("right_indent", "Right indent", self.right_indent, &format.right_indent),
            ("space_before", "Space before", self.space_before, &format.space_before),
            ("space_after", "Space after", self.space_after, &format.space_after),
        ];
        for (attribute, label, expected, actual) in lengths {
            let Some(expected) = expected else { continue };
            let value = actual.value().map(|l| l.pt()).unwrap_or(0.0);
            if (value - expected).abs() > INDENT_TOLERANCE {
                out.push(Mismatch {
                    attribute,
                    message: format!("{label}: expected {}, found {}", Length(expected), describe(actual)),
                });
            }
        }

        out
    }

    fn font_for(&self, run: &ResolvedRun) -> Option<&str> {
        if run.cjk {
            self.font_name_cjk.as_deref().or(self.font_name.as_deref())
        } else {
            self.font_name.as_deref()
        }
    }
}

fn toggle_mismatch<'a>(
    attribute: &'static str,
    label: &str,
    expected: bool,
    values: impl Iterator<Item = &'a Resolved<bool>>,
) -> Option<Mismatch> {
    let wrong: Vec<String> = values
        .filter(|v| *v.value().unwrap_or(&false) != expected)
        .map(|v| match v {
            Resolved::Value { value, from } => format!("{} ({from})", yes_no(*value)),
            Resolved::Unset => "unset".to_string(),
        })
        .collect();
    if wrong.is_empty() {
        return None;
    }
    Some(Mismatch {
        attribute,
        message: format!(
            "{label}: expected {}, found {}",
            yes_no(expected),
            describe_all(wrong.into_iter())
        ),
    })
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// `12pt (style 'Normal')` or `unset`.
pub fn describe<T: Display>(value: &Resolved<T>) -> String {
    match value {
        Resolved::Value { value, from } => format!("{value} ({from})"),
        Resolved::Unset => "unset".to_string(),
    }
}

fn describe_all<I, D>(values: I) -> String
where
    I: Iterator<Item = D>,
    D: Describe,
{
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        let text = value.describe();
        if !seen.contains(&text) {
            seen.push(text);
        }
    }
    seen.join(", ")
}

trait Describe {
    fn describe(&self) -> String;
}

impl<T: Display> Describe for &Resolved<T> {
    fn describe(&self) -> String {
        describe(self)
    }
}

impl Describe for String {
    fn describe(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Provenance;

    fn value<T>(value: T, from: Provenance) -> Resolved<T> {
        Resolved::Value { value, from }
    }

    fn run(text: &str, cjk: bool, font: Resolved<String>, size: Resolved<Length>) -> ResolvedRun {
        ResolvedRun {
            text: text.into(),
            cjk,
            font_name: font,
            font_size: size,
            bold: Resolved::Unset,
            italic: Resolved::Unset,
        }
    }

    fn format(runs: Vec<ResolvedRun>) -> ResolvedFormat {
        ResolvedFormat {
            alignment: value(Alignment::Center, Provenance::Paragraph),
            left_indent: Resolved::Unset,
            right_indent: Resolved::Unset,
            first_line_indent: value(Length(24.0), Provenance::Style("Body".into())),
            space_before: Resolved::Unset,
            space_after: Resolved::Unset,
            line_spacing: value(LineSpacing::Exact(Length(20.0)), Provenance::Default),
            runs,
        }
    }

    #[test]
    fn test_matching_format_has_no_mismatches() {
        let rule: FormatRule = serde_json::from_str(
            r#"{"font_name":"Times New Roman","font_size":10.5,"bold":false,"alignment":"center","first_line_indent":24.5,"left_indent":0,"line_spacing":{"exact":20}}"#,
        )
        .unwrap();
        let f = format(vec![run(
            "Text",
            false,
            value("times new roman".into(), Provenance::Run),
            value(Length(10.5), Provenance::Default),
        )]);
        assert!(rule.evaluate(&f).is_empty(), "{:?}", rule.evaluate(&f));
    }

    #[test]
    fn test_unset_font_fails_and_is_reported() {
        let rule = FormatRule {
            font_size: Some(12.0),
            ..Default::default()
        };
        let f = format(vec![run("x", false, Resolved::Unset, Resolved::Unset)]);
        let mismatches = rule.evaluate(&f);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].attribute, "font_size");
        assert_eq!(mismatches[0].message, "Font size: expected 12pt, found unset");
    }

    #[test]
    fn test_cjk_font_slot_rule() {
        let rule = FormatRule {
            font_name: Some("Times New Roman".into()),
            font_name_cjk: Some("SimSun".into()),
            ..Default::default()
        };
        let f = format(vec![
            run("摘要", true, value("SimHei".into(), Provenance::Run), Resolved::Unset),
            run("Abstract", false, value("Times New Roman".into(), Provenance::Run), Resolved::Unset),
        ]);
        let mismatches = rule.evaluate(&f);
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].message.contains("found SimHei (run)"));
    }

    #[test]
    fn test_line_spacing_kind_mismatch() {
        let rule = FormatRule {
            line_spacing: Some(LineSpacingRule::Multiple(1.0)),
            alignment: Some(Alignment::Justify),
            ..Default::default()
        };
        let mismatches = rule.evaluate(&format(vec![]));
        let keys: Vec<&str> = mismatches.iter().map(|m| m.attribute).collect();
        assert_eq!(keys, vec!["alignment", "line_spacing"]);
        assert_eq!(
            mismatches[1].message,
            "Line spacing: expected 1 lines, found exactly 20pt (document defaults)"
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<FormatRule>(r#"{"font_sise": 12}"#).is_err());
    }

    #[test]
    fn test_attributes_order() {
        let rule = FormatRule {
            font_name_cjk: Some("SimSun".into()),
            bold: Some(true),
            space_after: Some(0.0),
            ..Default::default()
        };
        assert_eq!(rule.attributes(), vec!["font_name", "bold", "space_after"]);
        assert!(FormatRule::default().is_empty());
    }
}
