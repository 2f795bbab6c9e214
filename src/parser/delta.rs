use std::{fmt, sync::LazyLock};

use regex::Regex;

use super::{extract_sections, Requirement, Section};

static RENAME_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-\s*FROM:\s*`?\s*(?:###\s+Requirement:\s*)?(.*?)\s*`?\s*$")
        .expect("rename FROM pattern is valid")
});

static RENAME_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-\s*TO:\s*`?\s*(?:###\s+Requirement:\s*)?(.*?)\s*`?\s*$")
        .expect("rename TO pattern is valid")
});

/// The kind of change a delta section declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    /// New requirements.
    Added,
    /// Replacements for existing requirements.
    Modified,
    /// Requirements to delete.
    Removed,
    /// Requirements to give a new name.
    Renamed,
}

impl Operation {
    /// Every operation, in the order sections are validated.
    pub const ALL: [Self; 4] = [Self::Added, Self::Modified, Self::Removed, Self::Renamed];

    /// The upper-case keyword used in section headings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Modified => "MODIFIED",
            Self::Removed => "REMOVED",
            Self::Renamed => "RENAMED",
        }
    }

    /// Recognises headings such as `ADDED Requirements`, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn from_heading(heading: &str) -> Option<Self> {
        let mut words = heading.split_whitespace();
        let keyword = words.next()?;
        let noun = words.next()?;
        if words.next().is_some() || !noun.eq_ignore_ascii_case("requirements") {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|op| keyword.eq_ignore_ascii_case(op.as_str()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `FROM`/`TO` pair from a RENAMED section.
///
/// Either side may be empty when the pair is incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePair {
    /// The current requirement name.
    pub from: String,
    /// The new requirement name.
    pub to: String,
    /// Line of the `FROM` entry, or of the `TO` entry when there is none.
    pub line: usize,
}

impl RenamePair {
    /// Whether both names are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty()
    }
}

/// One operation section of a delta file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaSection<T> {
    /// Line of the section heading.
    pub line: usize,
    /// The entries, in file order.
    pub entries: Vec<T>,
}

impl<T> DeltaSection<T> {
    /// Whether the section declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The operation lists declared by a single delta file.
///
/// A section is `None` when its heading does not appear in the file at all,
/// and empty when the heading is present but declares nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// `## ADDED Requirements`
    pub added: Option<DeltaSection<Requirement>>,
    /// `## MODIFIED Requirements`
    pub modified: Option<DeltaSection<Requirement>>,
    /// `## REMOVED Requirements`. Only the names are significant.
    pub removed: Option<DeltaSection<Requirement>>,
    /// `## RENAMED Requirements`
    pub renamed: Option<DeltaSection<RenamePair>>,
}

impl Delta {
    /// Parses the operation sections of a delta file.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut delta = Self::default();
        for section in &extract_sections(text) {
            match Operation::from_heading(&section.name) {
                Some(Operation::Added) => delta.added = Some(requirement_section(section)),
                Some(Operation::Modified) => delta.modified = Some(requirement_section(section)),
                Some(Operation::Removed) => delta.removed = Some(requirement_section(section)),
                Some(Operation::Renamed) => delta.renamed = Some(rename_section(section)),
                None => {}
            }
        }
        delta
    }

    /// How many of the four operation sections are present.
    #[must_use]
    pub fn section_count(&self) -> usize {
        [
            self.added.is_some(),
            self.modified.is_some(),
            self.removed.is_some(),
            self.renamed.is_some(),
        ]
        .into_iter()
        .filter(|&present| present)
        .count()
    }

    /// The requirements of an ADDED, MODIFIED or REMOVED section.
    #[must_use]
    pub fn requirements(&self, operation: Operation) -> &[Requirement] {
        let section = match operation {
            Operation::Added => &self.added,
            Operation::Modified => &self.modified,
            Operation::Removed => &self.removed,
            Operation::Renamed => &None,
        };
        section
            .as_ref()
            .map(|s| s.entries.as_slice())
            .unwrap_or_default()
    }

    /// The rename pairs, if any.
    #[must_use]
    pub fn renames(&self) -> &[RenamePair] {
        self.renamed
            .as_ref()
            .map(|s| s.entries.as_slice())
            .unwrap_or_default()
    }
}

fn requirement_section(section: &Section) -> DeltaSection<Requirement> {
    DeltaSection {
        line: section.line,
        entries: section.requirements(),
    }
}

fn rename_section(section: &Section) -> DeltaSection<RenamePair> {
    DeltaSection {
        line: section.line,
        entries: parse_renames(section.lines()),
    }
}

/// Pairs `- FROM:` and `- TO:` lines.
///
/// A `TO` belongs to the most recent unpaired `FROM`, however many lines
/// separate them. A `FROM` followed by another `FROM`, or a `TO` with nothing
/// pending, produces a pair with one side empty.
fn parse_renames<'a>(lines: impl IntoIterator<Item = (usize, &'a str)>) -> Vec<RenamePair> {
    let mut pairs = Vec::new();
    let mut pending_from: Option<(String, usize)> = None;

    for (line, text) in lines {
        if let Some(name) = capture(&RENAME_FROM, text) {
            if let Some((from, line)) = pending_from.take() {
                pairs.push(RenamePair {
                    from,
                    to: String::new(),
                    line,
                });
            }
            pending_from = Some((name, line));
        } else if let Some(to) = capture(&RENAME_TO, text) {
            let (from, line) = pending_from.take().unwrap_or((String::new(), line));
            pairs.push(RenamePair { from, to, line });
        }
    }

    if let Some((from, line)) = pending_from {
        pairs.push(RenamePair {
            from,
            to: String::new(),
            line,
        });
    }

    pairs
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
}
