//! Turning failed checks into issues that can be placed as comments.

use super::{LocateHint, Report};
use serde::{Deserialize, Serialize};

/// A failure to be written back into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Module that reported it
    pub module: String,
    /// Check name, or `check_label` for a group
    pub section: String,
    /// Where the comment goes
    #[serde(flatten)]
    pub locate: LocateHint,
    /// Messages in order
    pub messages: Vec<String>,
}

impl Issue {
    /// `[Module-section]`, the heading used in comments and listings.
    pub fn heading(&self) -> String {
        format!("[{}-{}]", self.module, self.section)
    }
}

/// Collect one issue per failing check, or per group for grouped checks.
///
/// Errored modules are skipped. A check or group without a locate hint is
/// placed at the module's fallback paragraph.
pub fn aggregate(report: &Report) -> Vec<Issue> {
    let mut issues = Vec::new();

    for module in report.modules.iter().filter(|m| !m.error) {
        let fallback = LocateHint::Index(module.fallback_index);

        for check in module.checks.iter().filter(|c| !c.ok) {
            if check.groups.is_empty() {
                issues.push(Issue {
                    module: module.module.clone(),
                    section: check.name.clone(),
                    locate: check.locate.clone().unwrap_or_else(|| fallback.clone()),
                    messages: check.messages.clone(),
                });
                continue;
            }

            for group in &check.groups {
                issues.push(Issue {
                    module: module.module.clone(),
                    section: format!("{}_{}", check.name, group.label),
                    locate: group
                        .locate
                        .clone()
                        .or_else(|| check.locate.clone())
                        .unwrap_or_else(|| fallback.clone()),
                    messages: group.messages.clone(),
                });
            }
        }
    }

    log::debug!("Aggregated {} issues", issues.len());
    issues
}
