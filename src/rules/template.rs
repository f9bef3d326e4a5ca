//! Rule modules described by JSON templates.
//!
//! A template names a module and lists sections. Each section selects
//! paragraphs and checks their count, text and format:
//!
//! ```json
//! {
//!   "module": "Abstract",
//!   "sections": [{
//!     "name": "abstract",
//!     "select": { "pattern": "^Abstract\\s*:" },
//!     "count": { "min": 1, "max": 1 },
//!     "text": { "prefix": "^Abstract\\s*:\\s*", "min_length": 50 },
//!     "format": { "font_size": 10.5, "alignment": "justify" }
//!   }]
//! }
//! ```

use super::expect::FormatRule;
use super::{locate_hint_for, RuleModule};
use crate::error::{Error, Result};
use crate::report::{title_case, Check, FindingGroup, ModuleFindings};
use crate::resolve::{ResolvedDocument, ResolvedParagraph};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("title.json", include_str!("../../templates/title.json")),
    ("abstract.json", include_str!("../../templates/abstract.json")),
    ("keywords.json", include_str!("../../templates/keywords.json")),
    ("headings.json", include_str!("../../templates/headings.json")),
];

/// Load the templates shipped with the crate.
pub fn builtin_templates() -> Result<Vec<Template>> {
    BUILTIN
        .iter()
        .map(|(file, json)| {
            Template::from_json(json).map_err(|e| Error::Template(format!("{file}: {e}")))
        })
        .collect()
}

/// A module template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Template {
    /// Module name
    pub module: String,
    /// Paragraph for issues without a locate hint
    #[serde(default)]
    pub fallback_index: usize,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sections in check order
    pub sections: Vec<SectionRule>,
}

impl Template {
    /// Parse a template from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Template = serde_json::from_str(json)?;
        if template.module.trim().is_empty() {
            return Err(Error::Template("module name is empty".into()));
        }
        if template.sections.is_empty() {
            return Err(Error::Template(format!("template '{}' has no sections", template.module)));
        }
        Ok(template)
    }

    /// Read a template file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json).map_err(|e| match e {
            Error::Template(msg) => Error::Template(format!("{}: {msg}", path.as_ref().display())),
            other => other,
        })
    }
}

/// One section of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionRule {
    /// Section name, used as the check name prefix
    pub name: String,
    /// Which paragraphs belong to the section
    #[serde(default)]
    pub select: Selector,
    /// Fail when nothing is selected
    #[serde(default = "default_required")]
    pub required: bool,
    /// Allowed number of selected paragraphs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CountRule>,
    /// Text expectations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextRule>,
    /// Format expectations
    #[serde(default)]
    pub format: FormatRule,
}

fn default_required() -> bool {
    true
}

/// Paragraph selection. Filters apply in field order; empty paragraphs are
/// never selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    /// Only this zero-based paragraph index
    pub index: Option<usize>,
    /// Trimmed text must match this regex
    pub pattern: Option<String>,
    /// Style name (case-insensitive) or style id
    pub style: Option<String>,
    /// Keep only the first remaining paragraph
    #[serde(default)]
    pub first_nonempty: bool,
    /// Start after the first paragraph matching this regex
    pub after: Option<String>,
    /// Stop before the first later paragraph matching this regex
    pub until: Option<String>,
    /// Keep at most this many paragraphs
    pub limit: Option<usize>,
}

/// Occurrence bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountRule {
    /// Minimum
    pub min: Option<usize>,
    /// Maximum
    pub max: Option<usize>,
}

impl CountRule {
    fn allows(&self, n: usize) -> bool {
        self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
    }

    fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => format!("exactly {min}"),
            (Some(min), Some(max)) => format!("{min} to {max}"),
            (Some(min), None) => format!("at least {min}"),
            (None, Some(max)) => format!("at most {max}"),
            (None, None) => "any number".into(),
        }
    }
}

/// Text expectations for each selected paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextRule {
    /// Trimmed text must match this regex
    pub pattern: Option<String>,
    /// Regex stripped from the start before measuring length and items
    pub prefix: Option<String>,
    /// Minimum content length in characters
    pub min_length: Option<usize>,
    /// Maximum content length in characters
    pub max_length: Option<usize>,
    /// Shown when `pattern` does not match
    pub hint: Option<String>,
    /// Item list expectations (keywords)
    pub items: Option<ItemsRule>,
}

/// Expectations for a separated item list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemsRule {
    /// Separator characters; any of them splits
    #[serde(default = "default_separators")]
    pub separator: String,
    /// Minimum item count
    pub min: Option<usize>,
    /// Maximum item count
    pub max: Option<usize>,
}

fn default_separators() -> String {
    ",;，；".into()
}

struct CompiledSelector {
    index: Option<usize>,
    pattern: Option<Regex>,
    style: Option<String>,
    first_nonempty: bool,
    after: Option<Regex>,
    until: Option<Regex>,
    limit: Option<usize>,
}

struct CompiledText {
    pattern: Option<Regex>,
    prefix: Option<Regex>,
    rule: TextRule,
}

struct CompiledSection {
    rule: SectionRule,
    select: CompiledSelector,
    text: Option<CompiledText>,
}

fn compile(pattern: &Option<String>) -> Result<Option<Regex>> {
    pattern.as_deref().map(Regex::new).transpose().map_err(Error::from)
}

impl CompiledSection {
    fn new(rule: SectionRule) -> Result<Self> {
        let s = &rule.select;
        let select = CompiledSelector {
            index: s.index,
            pattern: compile(&s.pattern)?,
            style: s.style.clone(),
            first_nonempty: s.first_nonempty,
            after: compile(&s.after)?,
            until: compile(&s.until)?,
            limit: s.limit,
        };
        let text = match &rule.text {
            Some(t) => Some(CompiledText {
                pattern: compile(&t.pattern)?,
                prefix: compile(&t.prefix)?,
                rule: t.clone(),
            }),
            None => None,
        };
        Ok(Self { rule, select, text })
    }

    fn select<'d>(&self, paragraphs: &'d [ResolvedParagraph]) -> Vec<&'d ResolvedParagraph> {
        let sel = &self.select;
        let mut candidates: &[ResolvedParagraph] = paragraphs;

        if let Some(after) = &sel.after {
            match candidates.iter().position(|p| after.is_match(p.text.trim())) {
                Some(pos) => candidates = &candidates[pos + 1..],
                None => return Vec::new(),
            }
        }
        if let Some(until) = &sel.until {
            if let Some(pos) = candidates.iter().position(|p| until.is_match(p.text.trim())) {
                candidates = &candidates[..pos];
            }
        }

        let mut selected: Vec<&ResolvedParagraph> = candidates
            .iter()
            .filter(|p| !p.is_empty())
            .filter(|p| sel.index.map_or(true, |i| p.index == i))
            .filter(|p| sel.pattern.as_ref().map_or(true, |re| re.is_match(p.text.trim())))
            .filter(|p| {
                sel.style.as_deref().map_or(true, |style| {
                    p.style_id.as_deref() == Some(style)
                        || p.style_name
                            .as_deref()
                            .is_some_and(|name| name.eq_ignore_ascii_case(style))
                })
            })
            .collect();

        if sel.first_nonempty {
            selected.truncate(1);
        }
        if let Some(limit) = sel.limit {
            selected.truncate(limit);
        }
        selected
    }
}

impl CompiledText {
    fn problems(&self, paragraph: &ResolvedParagraph) -> Vec<String> {
        let mut problems = Vec::new();
        let trimmed = paragraph.text.trim();

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(trimmed) {
                problems.push(match &self.rule.hint {
                    Some(hint) => format!("Text does not have the expected form: {hint}"),
                    None => format!("Text does not match /{}/", pattern.as_str()),
                });
            }
        }

        let content = match &self.prefix {
            Some(prefix) => prefix.find(trimmed).map_or(trimmed, |m| &trimmed[m.end()..]),
            None => trimmed,
        }
        .trim();
        let length = content.chars().count();

        if let Some(min) = self.rule.min_length {
            if length < min {
                problems.push(format!("Length: {length} characters, expected at least {min}"));
            }
        }
        if let Some(max) = self.rule.max_length {
            if length > max {
                problems.push(format!("Length: {length} characters, expected at most {max}"));
            }
        }

        if let Some(items) = &self.rule.items {
            let found: Vec<&str> = content
                .split(|c: char| items.separator.contains(c))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let bounds = CountRule {
                min: items.min,
                max: items.max,
            };
            if !bounds.allows(found.len()) {
                problems.push(format!(
                    "Found {} items, expected {}",
                    found.len(),
                    bounds.describe()
                ));
                problems.push(format!("- Items: {}", found.join(" | ")));
            }
        }

        problems
    }
}

/// A rule module driven by a [`Template`].
pub struct TemplateModule {
    template: Template,
    sections: Vec<CompiledSection>,
}

impl TemplateModule {
    /// Compile a template. Invalid regexes are reported as template errors.
    pub fn new(template: Template) -> Result<Self> {
        let sections = template
            .sections
            .iter()
            .cloned()
            .map(CompiledSection::new)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::Template(format!("{}: {e}", template.module)))?;
        Ok(Self { template, sections })
    }

    /// Load and compile a template file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Template::from_path(path)?)
    }

    /// The underlying template.
    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl RuleModule for TemplateModule {
    fn name(&self) -> &str {
        &self.template.module
    }

    fn fallback_index(&self) -> usize {
        self.template.fallback_index
    }

    fn run(&self, document: &ResolvedDocument<'_>) -> Result<ModuleFindings> {
        let mut findings = ModuleFindings::new();

        for section in &self.sections {
            let name = &section.rule.name;
            let title = title_case(name);
            let selected = section.select(document.paragraphs());
            log::debug!("{}: section '{}' selected {} paragraphs", self.name(), name, selected.len());

            if selected.is_empty() {
                if section.rule.required {
                    findings.push(Check::fail(
                        format!("{name}_presence"),
                        vec![format!("{title} not found")],
                    ));
                } else {
                    findings.note(format!("{title}: not present"));
                }
                continue;
            }

            if section.rule.required {
                findings.push(Check::pass(format!("{name}_presence")));
            }
            findings.note(match selected.as_slice() {
                [one] => format!("{title}: paragraph {}", one.index),
                many => format!("{title}: {} paragraphs", many.len()),
            });

            if let Some(count) = &section.rule.count {
                let n = selected.len();
                let check = if count.allows(n) {
                    Check::pass(format!("{name}_count"))
                } else {
                    Check::fail(
                        format!("{name}_count"),
                        vec![format!("Expected {} paragraphs, found {n}", count.describe())],
                    )
                    .at(locate_hint_for(document, selected[0]))
                };
                findings.push(check);
            }

            if let Some(text) = &section.text {
                let problems = selected.iter().map(|p| (*p, text.problems(p))).collect();
                findings.push(per_paragraph(document, format!("{name}_text"), problems));
            }

            let attributes = section.rule.format.attributes();
            if attributes.is_empty() {
                continue;
            }
            let mismatches: Vec<_> = selected
                .iter()
                .map(|p| (*p, section.rule.format.evaluate(&p.format)))
                .collect();
            for attribute in attributes {
                let problems = mismatches
                    .iter()
                    .map(|(p, found)| {
                        let messages = found
                            .iter()
                            .filter(|m| m.attribute == attribute)
                            .map(|m| m.message.clone())
                            .collect();
                        (*p, messages)
                    })
                    .collect();
                findings.push(per_paragraph(document, format!("{name}_{attribute}"), problems));
            }
        }

        Ok(findings)
    }
}

/// One check over several paragraphs: a single paragraph reports directly,
/// several report one group per failing paragraph.
fn per_paragraph(
    document: &ResolvedDocument<'_>,
    name: String,
    problems: Vec<(&ResolvedParagraph, Vec<String>)>,
) -> Check {
    if let [(paragraph, messages)] = problems.as_slice() {
        return if messages.is_empty() {
            Check::pass(name)
        } else {
            Check::fail(name, messages.clone()).at(locate_hint_for(document, paragraph))
        };
    }

    let groups = problems
        .into_iter()
        .filter(|(_, messages)| !messages.is_empty())
        .map(|(p, messages)| {
            FindingGroup::new(format!("p{}", p.index), messages).at(locate_hint_for(document, p))
        })
        .collect();
    Check::from_groups(name, groups)
}
