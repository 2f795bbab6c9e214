use super::{extract_requirements_from, Line, Requirement};

/// A `## <name>` section and the text beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The heading text, without the `##` marker.
    pub name: String,
    /// Everything up to the next `##` heading, trimmed.
    pub body: String,
    /// Line of the heading.
    pub line: usize,
    raw: Vec<String>,
}

impl Section {
    /// The requirements declared inside this section.
    ///
    /// Line numbers are relative to the file the section came from.
    #[must_use]
    pub fn requirements(&self) -> Vec<Requirement> {
        extract_requirements_from(self.raw.iter().map(String::as_str), self.line + 1)
    }

    /// The untrimmed body lines, paired with their line numbers.
    pub(crate) fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.raw
            .iter()
            .enumerate()
            .map(|(offset, line)| (self.line + 1 + offset, line.as_str()))
    }
}

/// The sections of a file, in file order.
///
/// Names are unique. When a heading repeats, the later section replaces the
/// earlier one and takes its place in the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections(Vec<Section>);

impl Sections {
    /// Looks up a section by its exact heading text.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.0.iter().find(|section| section.name == name)
    }

    /// Iterates over the sections in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.0.iter()
    }

    /// The number of distinct sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the file has no sections at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, section: Section) {
        self.0.retain(|s| s.name != section.name);
        self.0.push(section);
    }
}

impl<'a> IntoIterator for &'a Sections {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

enum State {
    Outside,
    InSection(Section),
}

impl State {
    fn close(self, sections: &mut Sections) {
        if let Self::InSection(mut section) = self {
            section.body = section.raw.join("\n").trim().to_string();
            sections.insert(section);
        }
    }
}

/// Splits a markdown document into its `##` sections.
///
/// Text before the first section heading is ignored.
#[must_use]
pub fn extract_sections(text: &str) -> Sections {
    let mut sections = Sections::default();
    let mut state = State::Outside;

    for (index, line) in text.lines().enumerate() {
        if let Line::Section(name) = Line::classify(line) {
            state.close(&mut sections);
            state = State::InSection(Section {
                name: name.to_string(),
                body: String::new(),
                line: index + 1,
                raw: Vec::new(),
            });
        } else if let State::InSection(section) = &mut state {
            section.raw.push(line.to_string());
        }
    }
    state.close(&mut sections);

    sections
}
