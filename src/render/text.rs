//! Plain text report.

use super::RenderOptions;
use crate::report::{Check, Issue, Report};
use std::fmt::Write;

const PASS: &str = "✓ PASS";
const FAIL: &str = "✗ FAIL";

/// Render a report with default options and no unplaced issues.
pub fn to_text(report: &Report) -> String {
    render_text(report, &[], &RenderOptions::default())
}

/// Render a report.
///
/// Modules appear in report order, checks in module order. Issues that could
/// not be placed as comments are listed at the end.
pub fn render_text(report: &Report, unplaced: &[Issue], options: &RenderOptions) -> String {
    let mut out = String::new();
    let heavy = "=".repeat(options.width);
    let light = "-".repeat(options.width);

    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "{}", options.title);
    let _ = writeln!(out, "{heavy}");
    if let Some(source) = &options.source {
        let _ = writeln!(out, "File: {source}");
    }
    if let Some(at) = &options.generated_at {
        let _ = writeln!(out, "Generated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let summary = report.summary();
    let _ = writeln!(out);
    let _ = writeln!(out, "[Overall]");
    let _ = writeln!(out, "  Total checks: {}", summary.total);
    let _ = writeln!(out, "  Passed: {}", summary.passed);
    let _ = writeln!(out, "  Failed: {}", summary.failed);
    let _ = writeln!(out, "  Pass rate: {:.2}%", summary.pass_rate);
    if summary.errored_modules > 0 {
        let _ = writeln!(out, "  Modules failed to run: {}", summary.errored_modules);
    }

    for module in &report.modules {
        let _ = writeln!(out);
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "Module: {}", module.module);
        let _ = writeln!(out, "{light}");

        if module.error {
            let _ = writeln!(
                out,
                "✗ Module failed: {}",
                module.message.as_deref().unwrap_or("unknown error")
            );
            continue;
        }
        if module.checks.is_empty() {
            let _ = writeln!(out, "(no checks)");
        }
        for check in &module.checks {
            write_check(&mut out, check);
        }

        if options.include_summary && !module.summary.is_empty() {
            let _ = writeln!(out, "Summary:");
            for line in &module.summary {
                let _ = writeln!(out, "  {line}");
            }
        }
    }

    if !unplaced.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "Unplaced issues ({})", unplaced.len());
        let _ = writeln!(out, "{light}");
        for issue in unplaced {
            let _ = writeln!(
                out,
                "{} ({} {})",
                issue.heading(),
                issue.locate.method(),
                issue.locate.data()
            );
            write_messages(&mut out, &issue.messages, "  ");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{heavy}");
    out
}

fn write_check(out: &mut String, check: &Check) {
    let _ = writeln!(out, "[{}] {}", check.title(), if check.ok { PASS } else { FAIL });
    write_messages(out, &check.messages, "  ");
    for group in &check.groups {
        let _ = writeln!(out, "  {}:", group.label);
        write_messages(out, &group.messages, "    ");
    }
}

fn write_messages(out: &mut String, messages: &[String], indent: &str) {
    for message in messages {
        if message.starts_with('-') {
            let _ = writeln!(out, "{indent}  {message}");
        } else {
            let _ = writeln!(out, "{indent}• {message}");
        }
    }
}
