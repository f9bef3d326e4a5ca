//! Overall pass/fail statistics.

use super::Report;
use serde::{Deserialize, Serialize};

/// Check counts over all modules that completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of checks
    pub total: usize,
    /// Checks that passed
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
    /// `passed / total * 100`, two decimals, 0 for an empty run
    pub pass_rate: f64,
    /// Modules that failed to run (not counted above)
    pub errored_modules: usize,
}

impl Summary {
    /// Summarize a report. Failed modules contribute no checks.
    pub fn from_report(report: &Report) -> Self {
        let mut summary = Summary::default();
        for module in &report.modules {
            if module.error {
                summary.errored_modules += 1;
                continue;
            }
            let (passed, total) = module.counts();
            summary.passed += passed;
            summary.total += total;
        }
        summary.failed = summary.total - summary.passed;
        summary.pass_rate = pass_rate(summary.passed, summary.total);
        summary
    }
}

/// Percentage rounded to two decimals; 0 when `total` is 0.
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = passed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Check, ModuleFindings, ModuleReport};

    fn module(name: &str, passed: usize, failed: usize) -> ModuleReport {
        let mut findings = ModuleFindings::new();
        for i in 0..passed {
            findings.push(Check::pass(format!("p{i}")));
        }
        for i in 0..failed {
            findings.push(Check::fail(format!("f{i}"), vec![]));
        }
        ModuleReport::completed(name, findings, 0)
    }

    #[test]
    fn test_pass_rate_rounding() {
        assert_eq!(pass_rate(5, 7), 71.43);
        assert_eq!(pass_rate(1, 3), 33.33);
        assert_eq!(pass_rate(2, 2), 100.0);
        assert_eq!(pass_rate(0, 0), 0.0);
    }

    #[test]
    fn test_summary_excludes_errored_modules() {
        let report = Report {
            modules: vec![
                module("A", 3, 1),
                ModuleReport::failed("B", "boom", 0),
                module("C", 2, 1),
            ],
        };
        let summary = report.summary();
        assert_eq!(summary.total, 7);
        assert_eq!(summary.passed, 5);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.pass_rate, 71.43);
        assert_eq!(summary.errored_modules, 1);
    }

    #[test]
    fn test_empty_report() {
        let summary = Report::new().summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_rate, 0.0);
    }
}
