//! JSON rendering for check reports.

use crate::error::{Error, Result};
use crate::report::{Issue, ModuleReport, Report, Summary};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    modules: &'a [ModuleReport],
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<&'a [Issue]>,
}

/// Convert a report to JSON: `{summary, modules}`.
pub fn to_json(report: &Report, format: JsonFormat) -> Result<String> {
    serialize(
        &JsonReport {
            summary: report.summary(),
            modules: &report.modules,
            issues: None,
        },
        format,
    )
}

/// Convert a report and its issues to JSON: `{summary, modules, issues}`.
pub fn to_json_with_issues(report: &Report, issues: &[Issue], format: JsonFormat) -> Result<String> {
    serialize(
        &JsonReport {
            summary: report.summary(),
            modules: &report.modules,
            issues: Some(issues),
        },
        format,
    )
}

fn serialize<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
