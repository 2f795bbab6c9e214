use std::fmt;

use serde::Serialize;

/// The severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Makes the report invalid.
    Error,
    /// Reported, but only invalidates the report in strict mode.
    Warning,
    /// Purely informational. Never escalated.
    Info,
}

impl Level {
    /// The upper-case label used in text and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found while validating a spec or delta file.
///
/// `path` is the file the issue belongs to, optionally followed by a
/// locator (for example `changes/x/specs/auth/spec.md: ADDED Requirement
/// 'Login'`). `line` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// The severity.
    pub level: Level,
    /// The file (and locator) the issue is attributed to.
    pub path: String,
    /// Human readable description.
    pub message: String,
    /// Line the issue was found at, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Issue {
    /// Creates an issue with the given severity and no line number.
    #[must_use]
    pub fn new(level: Level, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Creates an [`Level::Error`] issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Error, path, message)
    }

    /// Creates a [`Level::Warning`] issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Warning, path, message)
    }

    /// Creates a [`Level::Info`] issue.
    #[must_use]
    pub fn info(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Level::Info, path, message)
    }

    /// Attaches a line number.
    #[must_use]
    pub const fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.path, self.message)
    }
}

/// Rewrites every warning as an error.
///
/// This runs once over the complete issue list, after all rules have been
/// evaluated. Info issues are left alone.
pub fn escalate_warnings(issues: &mut [Issue]) {
    for issue in issues.iter_mut().filter(|i| i.level == Level::Warning) {
        issue.level = Level::Error;
    }
}
