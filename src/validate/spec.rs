use crate::{
    domain::{contains_shall_or_must, Config, Issue},
    parser::{extract_sections, Requirement},
};

const PURPOSE: &str = "Purpose";
const REQUIREMENTS: &str = "Requirements";

/// Applies the structural rules for a standalone base spec.
///
/// `path` is used to attribute issues. Issues are returned at their natural
/// severity; strict mode is applied when the report is built.
#[must_use]
pub fn validate_spec_text(path: &str, text: &str, config: &Config) -> Vec<Issue> {
    let sections = extract_sections(text);
    let mut issues = Vec::new();

    let purpose = sections.get(PURPOSE);
    let requirements = sections.get(REQUIREMENTS);

    if purpose.is_none() {
        issues.push(Issue::error(path, "Spec must have a Purpose section").at_line(1));
    }
    if requirements.is_none() {
        issues.push(Issue::error(path, "Spec must have a Requirements section").at_line(1));
    }

    if let Some(purpose) = purpose {
        let min = config.min_purpose_length();
        if purpose.body.chars().count() < min {
            issues.push(
                Issue::warning(
                    path,
                    format!("Purpose section is too brief (less than {min} characters)"),
                )
                .at_line(purpose.line),
            );
        }
    }

    if let Some(section) = requirements {
        for requirement in section.requirements() {
            check_requirement(path, &requirement, config, &mut issues);
        }
    }

    tracing::trace!("{path}: {} issue(s)", issues.len());
    issues
}

fn check_requirement(
    path: &str,
    requirement: &Requirement,
    config: &Config,
    issues: &mut Vec<Issue>,
) {
    let name = &requirement.name;
    let locator = format!("{path}: Requirement '{name}'");

    if !contains_shall_or_must(&requirement.content) {
        issues.push(
            Issue::warning(
                &locator,
                format!("Requirement \"{name}\" must contain SHALL or MUST"),
            )
            .at_line(requirement.line),
        );
    }

    if requirement.scenarios.is_empty() {
        issues.push(
            Issue::warning(
                &locator,
                format!("Requirement \"{name}\" must have at least one scenario"),
            )
            .at_line(requirement.line),
        );
    }

    if let Some(issue) = malformed_scenario_issue(&locator, requirement) {
        issues.push(issue);
    }

    if let Some(max) = config.max_requirement_length() {
        if requirement.content.chars().count() > max {
            issues.push(
                Issue::info(
                    &locator,
                    format!("Requirement text is very long (more than {max} characters)"),
                )
                .at_line(requirement.line),
            );
        }
    }
}

/// The error raised when a requirement's only scenarios are written in a
/// form the parser does not recognise.
pub(super) fn malformed_scenario_issue(locator: &str, requirement: &Requirement) -> Option<Issue> {
    if !requirement.has_only_malformed_scenarios() {
        return None;
    }
    let first = requirement.malformed_scenarios.first()?;
    Some(
        Issue::error(
            locator,
            format!(
                "Scenarios must use level-4 headings (\"#### Scenario: <name>\"); found \"{}\"",
                first.text
            ),
        )
        .at_line(first.line),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;

    const PURPOSE_TEXT: &str =
        "Authentication lets users prove who they are before they reach their data.";

    fn spec(requirements: &str) -> String {
        format!("# Auth\n\n## Purpose\n{PURPOSE_TEXT}\n\n## Requirements\n{requirements}")
    }

    fn validate(text: &str) -> Vec<Issue> {
        validate_spec_text("spec.md", text, &Config::default())
    }

    fn messages(issues: &[Issue]) -> Vec<(Level, &str)> {
        issues
            .iter()
            .map(|i| (i.level, i.message.as_str()))
            .collect()
    }

    #[test]
    fn well_formed_spec_is_clean() {
        let text = spec(
            "### Requirement: Login\nThe system SHALL log users in.\n\n#### Scenario: ok\n- WHEN x\n- THEN y\n",
        );
        assert!(validate(&text).is_empty());
    }

    #[test]
    fn missing_sections_are_errors_on_line_one() {
        let issues = validate("# Empty\n\nNothing here.\n");
        assert_eq!(
            messages(&issues),
            [
                (Level::Error, "Spec must have a Purpose section"),
                (Level::Error, "Spec must have a Requirements section"),
            ]
        );
        assert!(issues.iter().all(|i| i.line == Some(1)));
    }

    #[test]
    fn brief_purpose_is_a_warning_at_its_heading() {
        let issues = validate("# X\n\n## Purpose\nToo short.\n\n## Requirements\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, Level::Warning);
        assert!(issues[0].message.contains("too brief"));
        assert_eq!(issues[0].line, Some(3));
    }

    #[test]
    fn purpose_length_follows_configuration() {
        let mut config = Config::default();
        config.set_min_purpose_length(5);
        let issues = validate_spec_text(
            "spec.md",
            "## Purpose\nShort.\n## Requirements\n",
            &config,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn requirement_without_keyword_or_scenario_warns_twice() {
        let text = spec("### Requirement: Vague\nThe system logs users in.\n");
        let issues = validate(&text);

        assert_eq!(
            messages(&issues),
            [
                (Level::Warning, "Requirement \"Vague\" must contain SHALL or MUST"),
                (Level::Warning, "Requirement \"Vague\" must have at least one scenario"),
            ]
        );
        assert_eq!(issues[0].path, "spec.md: Requirement 'Vague'");
        assert_eq!(issues[0].line, Some(7));
    }

    #[test]
    fn malformed_scenario_reports_format_error_and_missing_scenario() {
        let text = spec("### Requirement: A\nThe system SHALL do A.\n\n### Scenario: X\n- WHEN y\n");
        let issues = validate(&text);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].level, Level::Warning);
        assert!(issues[0].message.contains("at least one scenario"));
        assert_eq!(issues[1].level, Level::Error);
        assert!(issues[1].message.contains("#### Scenario:"));
        assert_eq!(issues[1].line, Some(10));
    }

    #[test]
    fn requirements_outside_the_requirements_section_are_ignored() {
        let text = format!(
            "## Purpose\n{PURPOSE_TEXT}\n### Requirement: Stray\nno keyword\n## Requirements\n"
        );
        assert!(validate(&text).is_empty());
    }

    #[test]
    fn long_requirements_are_reported_when_configured() {
        let mut config = Config::default();
        config.set_max_requirement_length(Some(20));
        let text = spec(
            "### Requirement: Wordy\nThe system SHALL do a great many things at once.\n#### Scenario: s\nok\n",
        );

        let issues = validate_spec_text("spec.md", &text, &config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, Level::Info);
    }
}
