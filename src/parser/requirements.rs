use super::Line;

/// A `### Requirement: <name>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// The name following `Requirement:`, trimmed.
    pub name: String,
    /// The body below the heading, trimmed.
    pub content: String,
    /// Well-formed `#### Scenario:` blocks, each including its heading line.
    pub scenarios: Vec<String>,
    /// Line of the heading.
    pub line: usize,
    /// Scenario markers that were not recognised as scenarios.
    pub malformed_scenarios: Vec<Marker>,
}

/// A line of interest inside a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// The line number.
    pub line: usize,
    /// The line, trimmed.
    pub text: String,
}

struct OpenRequirement<'a> {
    name: &'a str,
    line: usize,
    body: Vec<&'a str>,
    malformed_scenarios: Vec<Marker>,
}

impl OpenRequirement<'_> {
    fn finish(self) -> Requirement {
        let content = self.body.join("\n").trim().to_string();
        Requirement {
            name: self.name.to_string(),
            scenarios: extract_scenarios(&content),
            content,
            line: self.line,
            malformed_scenarios: self.malformed_scenarios,
        }
    }
}

enum State<'a> {
    Outside,
    InRequirement(OpenRequirement<'a>),
}

impl State<'_> {
    fn close(self, requirements: &mut Vec<Requirement>) {
        if let Self::InRequirement(open) = self {
            requirements.push(open.finish());
        }
    }
}

/// Extracts every requirement block from the text, in order.
///
/// A requirement runs until the next level-2 or level-3 heading. Scenario
/// markers written at level 3 stay inside the requirement so they can be
/// reported as malformed.
#[must_use]
pub fn extract_requirements(text: &str) -> Vec<Requirement> {
    extract_requirements_from(text.lines(), 1)
}

pub(super) fn extract_requirements_from<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    first_line: usize,
) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut state = State::Outside;

    for (offset, raw) in lines.into_iter().enumerate() {
        let line_number = first_line + offset;
        let line = Line::classify(raw);

        match line {
            Line::Requirement(name) => {
                state.close(&mut requirements);
                state = State::InRequirement(OpenRequirement {
                    name,
                    line: line_number,
                    body: Vec::new(),
                    malformed_scenarios: Vec::new(),
                });
            }
            Line::Section(_) | Line::Heading(2 | 3) => {
                state.close(&mut requirements);
                state = State::Outside;
            }
            Line::MalformedScenario => {
                if let State::InRequirement(open) = &mut state {
                    open.body.push(raw);
                    open.malformed_scenarios.push(Marker {
                        line: line_number,
                        text: raw.trim().to_string(),
                    });
                }
            }
            Line::Scenario | Line::Heading(_) | Line::Text => {
                if let State::InRequirement(open) = &mut state {
                    open.body.push(raw);
                }
            }
        }
    }
    state.close(&mut requirements);

    requirements
}

/// Extracts the `#### Scenario:` blocks from a requirement body.
///
/// Each entry includes its own heading line. A scenario ends at the next
/// heading of level 3 or deeper.
#[must_use]
pub fn extract_scenarios(block: &str) -> Vec<String> {
    let mut scenarios = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for raw in block.lines() {
        let line = Line::classify(raw);
        if line == Line::Scenario {
            close_scenario(current.take(), &mut scenarios);
            current = Some(vec![raw]);
        } else if line.level(raw) >= 3 {
            close_scenario(current.take(), &mut scenarios);
        } else if let Some(lines) = &mut current {
            lines.push(raw);
        }
    }
    close_scenario(current, &mut scenarios);

    scenarios
}

fn close_scenario(lines: Option<Vec<&str>>, scenarios: &mut Vec<String>) {
    if let Some(lines) = lines {
        scenarios.push(lines.join("\n").trim().to_string());
    }
}

impl Requirement {
    /// Whether the body contains scenario markers that were not recognised,
    /// and no scenario that was.
    #[must_use]
    pub fn has_only_malformed_scenarios(&self) -> bool {
        self.scenarios.is_empty() && !self.malformed_scenarios.is_empty()
    }
}
