//! Text predicates shared by every validator.

use std::sync::LazyLock;

use regex::Regex;

static SHALL_OR_MUST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:shall|must)\b").expect("SHALL/MUST pattern is valid")
});

/// Returns the canonical form of a requirement name.
///
/// Leading and trailing whitespace is removed, the name is lowercased and any
/// internal run of whitespace (including tabs and newlines) collapses to a
/// single space. Two names that normalize identically refer to the same
/// requirement.
#[must_use]
pub fn normalize_requirement_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the text contains the normative keyword "shall" or "must" as a
/// whole word, in any case.
#[must_use]
pub fn contains_shall_or_must(text: &str) -> bool {
    SHALL_OR_MUST.is_match(text)
}
