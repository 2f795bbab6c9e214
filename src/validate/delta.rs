use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    path::{Path, PathBuf},
};

use crate::{
    domain::{contains_shall_or_must, normalize_requirement_name, Issue},
    parser::{Delta, DeltaSection, Operation, RenamePair, Requirement},
    validate::spec::malformed_scenario_issue,
};

/// Which file first declared each normalized name.
#[derive(Debug, Default)]
struct Claims(HashMap<String, PathBuf>);

impl Claims {
    /// Records `path` as declaring `name`.
    ///
    /// Returns the other file if a different one already declared it.
    fn claim(&mut self, name: String, path: &Path) -> Option<&Path> {
        match self.0.entry(name) {
            Entry::Occupied(entry) => {
                let existing: &PathBuf = entry.into_mut();
                (existing.as_path() != path).then_some(existing.as_path())
            }
            Entry::Vacant(entry) => {
                entry.insert(path.to_path_buf());
                None
            }
        }
    }
}

/// Duplicate tracking shared by all delta files of one change.
///
/// Create one context per change and pass every delta file of that change
/// through [`DeltaContext::validate`]. Names declared by one file for an
/// operation are reported when another file declares them for the same
/// operation.
#[derive(Debug, Default)]
pub struct DeltaContext {
    added: Claims,
    modified: Claims,
    removed: Claims,
    renamed_from: Claims,
    renamed_to: Claims,
}

impl DeltaContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks one delta file, recording its names for later files.
    pub fn validate(&mut self, path: &Path, delta: &Delta) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let Some(section) = &delta.added {
            self.check_requirements(path, Operation::Added, section, &mut issues);
        }
        if let Some(section) = &delta.modified {
            self.check_requirements(path, Operation::Modified, section, &mut issues);
        }
        if let Some(section) = &delta.removed {
            self.check_removed(path, section, &mut issues);
        }
        if let Some(section) = &delta.renamed {
            self.check_renamed(path, section, &mut issues);
        }
        check_conflicts(path, delta, &mut issues);

        tracing::trace!(
            "{}: {} section(s), {} issue(s)",
            path.display(),
            delta.section_count(),
            issues.len()
        );
        issues
    }

    const fn claims(&mut self, operation: Operation) -> &mut Claims {
        match operation {
            Operation::Added => &mut self.added,
            Operation::Modified => &mut self.modified,
            Operation::Removed => &mut self.removed,
            Operation::Renamed => &mut self.renamed_from,
        }
    }

    fn check_requirements(
        &mut self,
        path: &Path,
        operation: Operation,
        section: &DeltaSection<Requirement>,
        issues: &mut Vec<Issue>,
    ) {
        let file = path.display().to_string();
        if section.is_empty() {
            issues.push(empty_section(&file, operation, section.line));
            return;
        }

        let mut seen = HashSet::new();
        for requirement in &section.entries {
            let name = &requirement.name;
            let locator = format!("{file}: {operation} Requirement '{name}'");

            if !contains_shall_or_must(&requirement.content) {
                issues.push(
                    Issue::error(
                        &locator,
                        format!("{operation} requirement \"{name}\" must contain SHALL or MUST"),
                    )
                    .at_line(requirement.line),
                );
            }
            if requirement.scenarios.is_empty() {
                issues.push(
                    Issue::error(
                        &locator,
                        format!("{operation} requirement \"{name}\" must include at least one scenario"),
                    )
                    .at_line(requirement.line),
                );
            }
            if let Some(issue) = malformed_scenario_issue(&locator, requirement) {
                issues.push(issue);
            }

            self.check_duplicate(path, operation, name, requirement.line, &mut seen, issues);
        }
    }

    fn check_removed(
        &mut self,
        path: &Path,
        section: &DeltaSection<Requirement>,
        issues: &mut Vec<Issue>,
    ) {
        if section.is_empty() {
            issues.push(empty_section(
                &path.display().to_string(),
                Operation::Removed,
                section.line,
            ));
            return;
        }

        let mut seen = HashSet::new();
        for requirement in &section.entries {
            self.check_duplicate(
                path,
                Operation::Removed,
                &requirement.name,
                requirement.line,
                &mut seen,
                issues,
            );
        }
    }

    fn check_renamed(
        &mut self,
        path: &Path,
        section: &DeltaSection<RenamePair>,
        issues: &mut Vec<Issue>,
    ) {
        let file = path.display().to_string();
        if section.is_empty() {
            issues.push(empty_section(&file, Operation::Renamed, section.line));
            return;
        }

        let mut seen_from = HashSet::new();
        let mut seen_to = HashSet::new();
        for pair in &section.entries {
            if !pair.is_complete() {
                issues.push(
                    Issue::error(
                        &file,
                        format!(
                            "RENAMED entry is malformed: FROM \"{}\" / TO \"{}\" (both \"- FROM:\" and \"- TO:\" lines are required)",
                            pair.from, pair.to
                        ),
                    )
                    .at_line(pair.line),
                );
                continue;
            }

            let locator = format!("{file}: RENAMED Requirement '{}'", pair.from);

            let from = normalize_requirement_name(&pair.from);
            if seen_from.insert(from.clone()) {
                if let Some(other) = self.renamed_from.claim(from, path) {
                    issues.push(
                        Issue::error(
                            &locator,
                            format!(
                                "Requirement \"{}\" is RENAMED (FROM) in multiple files: {} and {file}",
                                pair.from,
                                other.display()
                            ),
                        )
                        .at_line(pair.line),
                    );
                }
            } else {
                issues.push(
                    Issue::error(
                        &locator,
                        format!("Duplicate FROM name \"{}\" in RENAMED section", pair.from),
                    )
                    .at_line(pair.line),
                );
            }

            let to = normalize_requirement_name(&pair.to);
            if seen_to.insert(to.clone()) {
                if let Some(other) = self.renamed_to.claim(to, path) {
                    issues.push(
                        Issue::error(
                            &locator,
                            format!(
                                "Requirement \"{}\" is RENAMED (TO) in multiple files: {} and {file}",
                                pair.to,
                                other.display()
                            ),
                        )
                        .at_line(pair.line),
                    );
                }
            } else {
                issues.push(
                    Issue::error(
                        &locator,
                        format!("Duplicate TO name \"{}\" in RENAMED section", pair.to),
                    )
                    .at_line(pair.line),
                );
            }
        }
    }

    /// Reports `name` if it repeats within this section, or if another file
    /// already declared it for the same operation.
    fn check_duplicate(
        &mut self,
        path: &Path,
        operation: Operation,
        name: &str,
        line: usize,
        seen: &mut HashSet<String>,
        issues: &mut Vec<Issue>,
    ) {
        let file = path.display().to_string();
        let locator = format!("{file}: {operation} Requirement '{name}'");
        let normalized = normalize_requirement_name(name);

        if !seen.insert(normalized.clone()) {
            issues.push(
                Issue::error(
                    &locator,
                    format!("Duplicate requirement \"{name}\" in {operation} section"),
                )
                .at_line(line),
            );
            return;
        }

        if let Some(other) = self.claims(operation).claim(normalized, path) {
            issues.push(
                Issue::error(
                    &locator,
                    format!(
                        "Requirement \"{name}\" is {operation} in multiple files: {} and {file}",
                        other.display()
                    ),
                )
                .at_line(line),
            );
        }
    }
}

fn empty_section(file: &str, operation: Operation, line: usize) -> Issue {
    let expected = if operation == Operation::Renamed {
        "\"- FROM:\" / \"- TO:\" pairs"
    } else {
        "\"### Requirement:\" blocks"
    };
    Issue::error(
        file,
        format!("{operation} section is empty (no {expected} found)"),
    )
    .at_line(line)
}

/// Names that one delta file may not place in two sections at once.
fn check_conflicts(path: &Path, delta: &Delta, issues: &mut Vec<Issue>) {
    let file = path.display().to_string();
    let names = |operation| -> HashSet<String> {
        delta
            .requirements(operation)
            .iter()
            .map(|r| normalize_requirement_name(&r.name))
            .collect()
    };
    let added = names(Operation::Added);
    let modified = names(Operation::Modified);
    let renamed_from: HashSet<_> = delta
        .renames()
        .iter()
        .filter(|p| p.is_complete())
        .map(|p| normalize_requirement_name(&p.from))
        .collect();
    let renamed_to: HashSet<_> = delta
        .renames()
        .iter()
        .filter(|p| p.is_complete())
        .map(|p| normalize_requirement_name(&p.to))
        .collect();

    report_conflicts(&file, delta, Operation::Modified, &added, issues, |name| {
        format!("Requirement \"{name}\" appears in both ADDED and MODIFIED sections")
    });
    report_conflicts(&file, delta, Operation::Removed, &modified, issues, |name| {
        format!("Requirement \"{name}\" appears in both MODIFIED and REMOVED sections")
    });
    report_conflicts(&file, delta, Operation::Removed, &added, issues, |name| {
        format!("Requirement \"{name}\" appears in both ADDED and REMOVED sections")
    });
    report_conflicts(&file, delta, Operation::Modified, &renamed_from, issues, |name| {
        format!(
            "MODIFIED requirement \"{name}\" is renamed in this delta; refer to it by its new name"
        )
    });
    report_conflicts(&file, delta, Operation::Added, &renamed_to, issues, |name| {
        format!("ADDED requirement \"{name}\" collides with the new name of a RENAMED requirement")
    });
}

/// Reports each requirement of `operation` whose name is also in `against`.
fn report_conflicts(
    file: &str,
    delta: &Delta,
    operation: Operation,
    against: &HashSet<String>,
    issues: &mut Vec<Issue>,
    message: impl Fn(&str) -> String,
) {
    let mut reported = HashSet::new();
    for requirement in delta.requirements(operation) {
        let normalized = normalize_requirement_name(&requirement.name);
        if against.contains(&normalized) && reported.insert(normalized) {
            issues.push(
                Issue::error(
                    format!("{file}: {operation} Requirement '{}'", requirement.name),
                    message(&requirement.name),
                )
                .at_line(requirement.line),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::Level;

    const LOGIN: &str = "\
### Requirement: Login
The system SHALL authenticate users.

#### Scenario: Valid credentials
- WHEN valid credentials are submitted
- THEN a session is created
";

    fn added(requirements: &str) -> Delta {
        Delta::parse(&format!("## ADDED Requirements\n{requirements}"))
    }

    fn validate_one(delta: &Delta) -> Vec<Issue> {
        DeltaContext::new().validate(Path::new("changes/c/specs/auth/spec.md"), delta)
    }

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn well_formed_added_section_is_clean() {
        assert!(validate_one(&added(LOGIN)).is_empty());
    }

    #[test]
    fn empty_sections_are_errors() {
        let delta = Delta::parse(
            "## ADDED Requirements\n\n## REMOVED Requirements\n\n## RENAMED Requirements\nnothing\n",
        );
        let issues = validate_one(&delta);

        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.level == Level::Error));
        assert!(issues.iter().all(|i| i.message.contains("section is empty")));
        let lines: Vec<_> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, [Some(1), Some(3), Some(5)]);
    }

    #[test]
    fn delta_requirements_are_held_to_errors() {
        let issues = validate_one(&added("### Requirement: Vague\nThe system logs in.\n"));
        assert_eq!(
            messages(&issues),
            [
                "ADDED requirement \"Vague\" must contain SHALL or MUST",
                "ADDED requirement \"Vague\" must include at least one scenario",
            ]
        );
        assert!(issues.iter().all(|i| i.level == Level::Error));
        assert_eq!(
            issues[0].path,
            "changes/c/specs/auth/spec.md: ADDED Requirement 'Vague'"
        );
        assert_eq!(issues[0].line, Some(2));
    }

    #[test]
    fn malformed_scenarios_in_modified_section() {
        let delta = Delta::parse(
            "## MODIFIED Requirements\n### Requirement: A\nUsers MUST sign in.\n##### Scenario: deep\n- WHEN x\n",
        );
        let issues = validate_one(&delta);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("at least one scenario"));
        assert!(issues[1].message.contains("#### Scenario:"));
        assert_eq!(issues[1].line, Some(4));
    }

    #[test]
    fn duplicate_names_within_a_section_are_normalized() {
        let renamed = LOGIN.replace("Requirement: Login", "Requirement:   LOGIN ");
        let issues = validate_one(&added(&format!("{LOGIN}\n{renamed}")));
        assert_eq!(messages(&issues), ["Duplicate requirement \"LOGIN\" in ADDED section"]);
    }

    #[test]
    fn same_name_in_two_files_is_reported_once_with_both_paths() {
        let mut context = DeltaContext::new();
        let first = context.validate(Path::new("a/spec.md"), &added(LOGIN));
        let second = context.validate(Path::new("b/spec.md"), &added(LOGIN));

        assert!(first.is_empty());
        assert_eq!(second.len(), 1);
        let message = &second[0].message;
        assert!(message.contains("multiple files"));
        assert!(message.contains("a/spec.md"));
        assert!(message.contains("b/spec.md"));
    }

    #[test]
    fn removed_name_in_two_files_is_reported_with_both_paths() {
        let removed =
            Delta::parse("## REMOVED Requirements\n### Requirement: Legacy\n**Reason**: gone\n");
        let mut context = DeltaContext::new();
        assert!(context.validate(Path::new("a/spec.md"), &removed).is_empty());
        let issues = context.validate(Path::new("b/spec.md"), &removed);

        assert_eq!(
            messages(&issues),
            ["Requirement \"Legacy\" is REMOVED in multiple files: a/spec.md and b/spec.md"]
        );
        assert_eq!(issues[0].line, Some(2));
        assert_eq!(issues[0].path, "b/spec.md: REMOVED Requirement 'Legacy'");
    }

    #[test]
    fn same_name_under_different_operations_is_not_a_cross_file_duplicate() {
        let mut context = DeltaContext::new();
        let modified = Delta::parse(&format!("## MODIFIED Requirements\n{LOGIN}"));
        context.validate(Path::new("a/spec.md"), &added(LOGIN));
        assert!(context.validate(Path::new("b/spec.md"), &modified).is_empty());
    }

    #[test]
    fn removed_entries_only_need_names() {
        let delta = Delta::parse(
            "## REMOVED Requirements\n### Requirement: Old\n**Reason**: unused\n### Requirement: old\n",
        );
        let issues = validate_one(&delta);
        assert_eq!(messages(&issues), ["Duplicate requirement \"old\" in REMOVED section"]);
    }

    #[test]
    fn renamed_pairs_are_checked() {
        let delta = Delta::parse(
            "\
## RENAMED Requirements
- FROM: `### Requirement: A`
- TO: `### Requirement: B`
- FROM: `### Requirement: a`
- TO: `### Requirement: C`
- FROM: `### Requirement: D`
- TO: `### Requirement: b`
- TO: `### Requirement: E`
",
        );
        let issues = validate_one(&delta);
        assert_eq!(
            messages(&issues),
            [
                "Duplicate FROM name \"a\" in RENAMED section",
                "Duplicate TO name \"b\" in RENAMED section",
                "RENAMED entry is malformed: FROM \"\" / TO \"E\" (both \"- FROM:\" and \"- TO:\" lines are required)",
            ]
        );
        assert_eq!(issues[2].line, Some(8));
    }

    #[test]
    fn renames_conflict_across_files() {
        let rename = Delta::parse("## RENAMED Requirements\n- FROM: A\n- TO: B\n");
        let mut context = DeltaContext::new();
        context.validate(Path::new("x/spec.md"), &rename);
        let issues = context.validate(Path::new("y/spec.md"), &rename);

        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("RENAMED (FROM) in multiple files"));
        assert!(issues[1].message.contains("RENAMED (TO) in multiple files"));
    }

    #[test]
    fn added_and_modified_conflict_within_a_file() {
        let delta = Delta::parse(&format!(
            "## ADDED Requirements\n{LOGIN}\n## MODIFIED Requirements\n{}",
            LOGIN.replace("Login", "login")
        ));
        let issues = validate_one(&delta);
        assert_eq!(
            messages(&issues),
            ["Requirement \"login\" appears in both ADDED and MODIFIED sections"]
        );
    }

    #[test]
    fn modifying_a_renamed_requirement_by_its_old_name_conflicts() {
        let delta = Delta::parse(&format!(
            "## RENAMED Requirements\n- FROM: Login\n- TO: Sign in\n\n## MODIFIED Requirements\n{LOGIN}"
        ));
        let issues = validate_one(&delta);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("refer to it by its new name"));
    }

    #[test_case(
        "## MODIFIED Requirements\n### Requirement: A\nThe system SHALL a.\n#### Scenario: s\nok\n\n## REMOVED Requirements\n### Requirement: a\n",
        "Requirement \"a\" appears in both MODIFIED and REMOVED sections",
        8;
        "modified and removed"
    )]
    #[test_case(
        "## ADDED Requirements\n### Requirement: A\nThe system SHALL a.\n#### Scenario: s\nok\n\n## REMOVED Requirements\n### Requirement: A\n",
        "Requirement \"A\" appears in both ADDED and REMOVED sections",
        8;
        "added and removed"
    )]
    #[test_case(
        "## RENAMED Requirements\n- FROM: X\n- TO: A\n\n## ADDED Requirements\n### Requirement: A\nThe system SHALL a.\n#### Scenario: s\nok\n",
        "ADDED requirement \"A\" collides with the new name of a RENAMED requirement",
        6;
        "added and renamed to"
    )]
    fn cross_section_conflicts(text: &str, message: &str, line: usize) {
        let issues = validate_one(&Delta::parse(text));
        assert_eq!(messages(&issues), [message]);
        assert_eq!(issues[0].line, Some(line));
        assert_eq!(issues[0].level, Level::Error);
    }
}
