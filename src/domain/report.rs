use std::fmt;

use serde::Serialize;

use crate::domain::issue::{escalate_warnings, Issue, Level};

/// Issue counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of [`Level::Error`] issues.
    pub errors: usize,
    /// Number of [`Level::Warning`] issues.
    pub warnings: usize,
    /// Number of [`Level::Info`] issues.
    pub info: usize,
}

impl Summary {
    fn count(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut summary, issue| {
            match issue.level {
                Level::Error => summary.errors += 1,
                Level::Warning => summary.warnings += 1,
                Level::Info => summary.info += 1,
            }
            summary
        })
    }
}

/// The outcome of validating a single spec or change.
///
/// A report is always built from a complete issue list and never modified
/// afterwards. It is valid exactly when it holds no errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    valid: bool,
    issues: Vec<Issue>,
    summary: Summary,
}

impl Report {
    /// Builds a report from the issues produced by a validation pass.
    ///
    /// In strict mode every warning is rewritten as an error before the
    /// summary is computed.
    #[must_use]
    pub fn new(mut issues: Vec<Issue>, strict: bool) -> Self {
        if strict {
            escalate_warnings(&mut issues);
        }
        let summary = Summary::count(&issues);
        Self {
            valid: summary.errors == 0,
            issues,
            summary,
        }
    }

    /// Whether the report contains no errors.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// The issues, in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Counts by severity.
    #[must_use]
    pub const fn summary(&self) -> Summary {
        self.summary
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Vec<Issue> {
        vec![
            Issue::error("a", "broken"),
            Issue::warning("a", "brief"),
            Issue::warning("b", "no scenarios"),
            Issue::info("b", "long"),
        ]
    }

    #[test]
    fn warnings_alone_do_not_invalidate() {
        let report = Report::new(vec![Issue::warning("a", "brief")], false);
        assert!(report.is_valid());
        assert_eq!(report.summary().warnings, 1);
    }

    #[test]
    fn strict_mode_moves_warnings_into_errors() {
        let lenient = Report::new(mixed(), false);
        let strict = Report::new(mixed(), true);

        let Summary {
            errors, warnings, ..
        } = lenient.summary();
        assert_eq!(strict.summary().errors, errors + warnings);
        assert_eq!(strict.summary().warnings, 0);
        assert_eq!(strict.summary().info, lenient.summary().info);
        assert!(!strict.is_valid());
    }

    #[test]
    fn strict_mode_with_only_warnings_is_invalid() {
        let report = Report::new(vec![Issue::warning("a", "brief")], true);
        assert!(!report.is_valid());
    }

    #[test]
    fn json_shape_is_stable() {
        let report = Report::new(vec![Issue::error("a", "broken").at_line(3)], false);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "valid": false,
                "issues": [{"level": "ERROR", "path": "a", "message": "broken", "line": 3}],
                "summary": {"errors": 1, "warnings": 0, "info": 0}
            })
        );
    }

    #[test]
    fn text_form_prints_each_issue() {
        let report = Report::new(mixed(), false);
        let text = report.to_string();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("[ERROR] a: broken\n"));
    }
}
