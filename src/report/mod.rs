//! Check results as produced by rule modules and collected by the registry.

mod issues;
mod summary;

pub use issues::{aggregate, Issue};
pub use summary::Summary;

use serde::{Deserialize, Serialize};

/// How an issue finds its paragraph again in a document copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "locate_method", content = "locate_data", rename_all = "snake_case")]
pub enum LocateHint {
    /// First paragraph whose text contains the substring (case-sensitive)
    Keyword(String),
    /// Zero-based top-level paragraph index
    Index(usize),
}

impl LocateHint {
    /// Method name as used in issue listings.
    pub fn method(&self) -> &'static str {
        match self {
            LocateHint::Keyword(_) => "keyword",
            LocateHint::Index(_) => "index",
        }
    }

    /// Locate data rendered as text.
    pub fn data(&self) -> String {
        match self {
            LocateHint::Keyword(k) => k.clone(),
            LocateHint::Index(i) => i.to_string(),
        }
    }
}

/// A failing unit inside a check, e.g. one offending paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingGroup {
    /// Short label, appended to the check name in issue sections
    pub label: String,
    /// Messages for this unit
    pub messages: Vec<String>,
    /// Where to anchor the unit's comment
    pub locate: Option<LocateHint>,
}

impl FindingGroup {
    /// Create a group with messages.
    pub fn new(label: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            label: label.into(),
            messages,
            locate: None,
        }
    }

    /// Set the locate hint.
    pub fn at(mut self, locate: LocateHint) -> Self {
        self.locate = Some(locate);
        self
    }
}

/// One named check with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// Check name (snake_case, e.g. `font_size`)
    pub name: String,
    /// Whether the check passed
    pub ok: bool,
    /// Detail messages (lines beginning with `-` are sub-items)
    pub messages: Vec<String>,
    /// Where to anchor the check's comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locate: Option<LocateHint>,
    /// Failing units, when the check reports per paragraph
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<FindingGroup>,
}

impl Check {
    /// A passing check.
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            messages: Vec::new(),
            locate: None,
            groups: Vec::new(),
        }
    }

    /// A failing check.
    pub fn fail(name: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            ok: false,
            messages,
            ..Self::pass(name)
        }
    }

    /// Pass or fail depending on whether any group was collected.
    pub fn from_groups(name: impl Into<String>, groups: Vec<FindingGroup>) -> Self {
        Self {
            ok: groups.is_empty(),
            groups,
            ..Self::pass(name)
        }
    }

    /// Append a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Set the locate hint.
    pub fn at(mut self, locate: LocateHint) -> Self {
        self.locate = Some(locate);
        self
    }

    /// Human title, `font_size` -> `Font Size`.
    pub fn title(&self) -> String {
        title_case(&self.name)
    }
}

/// The output of one rule module run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleFindings {
    /// Checks in the order the module produced them
    pub checks: Vec<Check>,
    /// Informational lines shown under the module in the report
    pub summary: Vec<String>,
}

impl ModuleFindings {
    /// Create empty findings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a check.
    pub fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    /// Append a summary line.
    pub fn note(&mut self, line: impl Into<String>) {
        self.summary.push(line.into());
    }
}

/// The report fragment of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Module name
    pub module: String,
    /// Checks (empty when the module failed)
    pub checks: Vec<Check>,
    /// Informational lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
    /// Whether the module itself failed
    pub error: bool,
    /// Failure message when `error` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Paragraph used for issues without a locate hint
    pub fallback_index: usize,
}

impl ModuleReport {
    /// Fragment for a module that completed.
    pub fn completed(module: impl Into<String>, findings: ModuleFindings, fallback_index: usize) -> Self {
        Self {
            module: module.into(),
            checks: findings.checks,
            summary: findings.summary,
            error: false,
            message: None,
            fallback_index,
        }
    }

    /// Fragment for a module that failed.
    pub fn failed(module: impl Into<String>, message: impl Into<String>, fallback_index: usize) -> Self {
        Self {
            module: module.into(),
            checks: Vec::new(),
            summary: Vec::new(),
            error: true,
            message: Some(message.into()),
            fallback_index,
        }
    }

    /// Look up a check by name.
    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Passed and total check counts of this module.
    pub fn counts(&self) -> (usize, usize) {
        let passed = self.checks.iter().filter(|c| c.ok).count();
        (passed, self.checks.len())
    }
}

/// All module fragments of one run, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Module fragments
    pub modules: Vec<ModuleReport>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a module fragment by name.
    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.module == name)
    }

    /// Overall pass/fail counts.
    pub fn summary(&self) -> Summary {
        Summary::from_report(self)
    }
}

/// `table_caption` -> `Table Caption`.
pub(crate) fn title_case(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
