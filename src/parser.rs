//! Structural parsing of spec and delta markdown.
//!
//! Only the heading conventions used by spec files are understood:
//!
//! - `## <name>` opens a section
//! - `### Requirement: <name>` opens a requirement
//! - `#### Scenario: <name>` opens a scenario within a requirement
//!
//! Everything else is body text. Parsing never fails; missing structure
//! yields empty results. Every extracted block records the 1-indexed line of
//! its heading so diagnostics can point at it.

use std::sync::LazyLock;

use regex::Regex;

/// Parsing of delta files into operation lists.
pub mod delta;
pub use delta::{Delta, DeltaSection, Operation, RenamePair};

mod requirements;
use requirements::extract_requirements_from;
pub use requirements::{extract_requirements, extract_scenarios, Marker, Requirement};

mod sections;
pub use sections::{extract_sections, Section, Sections};

static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+)$").expect("section pattern is valid"));

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^###\s+Requirement:\s*(.+)$").expect("requirement pattern is valid")
});

static SCENARIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^####\s+Scenario:\s*(.+)$").expect("scenario pattern is valid")
});

// Scenario markers at the wrong heading level, or written as bold text.
static MALFORMED_SCENARIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:###\s+|#{5,6}\s+|[-*]\s+\*\*|\*\*)Scenario:")
        .expect("malformed scenario pattern is valid")
});

/// The structural role of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    /// `## <name>`
    Section(&'a str),
    /// `### Requirement: <name>`
    Requirement(&'a str),
    /// `#### Scenario: <name>`
    Scenario,
    /// A scenario marker that will not be recognised as one.
    MalformedScenario,
    /// Any other heading, by the number of leading `#`.
    Heading(usize),
    Text,
}

impl<'a> Line<'a> {
    fn classify(line: &'a str) -> Self {
        if let Some(name) = capture_name(&SECTION, line) {
            return Self::Section(name);
        }
        if let Some(name) = capture_name(&REQUIREMENT, line) {
            return Self::Requirement(name);
        }
        if SCENARIO.is_match(line) {
            return Self::Scenario;
        }
        if MALFORMED_SCENARIO.is_match(line.trim_start()) {
            return Self::MalformedScenario;
        }
        match line.bytes().take_while(|&b| b == b'#').count() {
            0 => Self::Text,
            level => Self::Heading(level),
        }
    }

    /// The number of leading `#` for heading lines, zero otherwise.
    fn level(self, raw: &str) -> usize {
        match self {
            Self::Section(_) => 2,
            Self::Requirement(_) => 3,
            Self::Scenario => 4,
            Self::Heading(level) => level,
            Self::MalformedScenario => raw.bytes().take_while(|&b| b == b'#').count(),
            Self::Text => 0,
        }
    }
}

fn capture_name<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
    pattern
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}
