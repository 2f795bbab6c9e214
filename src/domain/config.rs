use std::path::Path;

use serde::{Deserialize, Serialize};

/// Project level validation settings.
///
/// Read from `config.toml` in the project root, next to the `specs/` and
/// `changes/` directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// A Purpose section shorter than this many characters is reported as a
    /// warning.
    min_purpose_length: usize,

    /// When set, requirements whose content is longer than this many
    /// characters are reported at info level.
    max_requirement_length: Option<usize>,

    /// Whether validation runs in strict mode unless told otherwise.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_purpose_length: default_min_purpose_length(),
            max_requirement_length: None,
            strict: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads `config.toml` from the project root, falling back to the
    /// defaults if it is missing or invalid.
    #[must_use]
    pub fn load_or_default(root: &Path) -> Self {
        let path = root.join("config.toml");
        Self::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// The minimum length of a Purpose section, in characters.
    #[must_use]
    pub const fn min_purpose_length(&self) -> usize {
        self.min_purpose_length
    }

    /// The length above which requirement content is flagged, if any.
    #[must_use]
    pub const fn max_requirement_length(&self) -> Option<usize> {
        self.max_requirement_length
    }

    /// Sets the minimum Purpose length.
    pub const fn set_min_purpose_length(&mut self, value: usize) {
        self.min_purpose_length = value;
    }

    /// Sets or clears the requirement length limit.
    pub const fn set_max_requirement_length(&mut self, value: Option<usize>) {
        self.max_requirement_length = value;
    }
}

const fn default_min_purpose_length() -> usize {
    50
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_min_purpose_length")]
        min_purpose_length: usize,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_requirement_length: Option<usize>,

        #[serde(default)]
        strict: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                min_purpose_length,
                max_requirement_length,
                strict,
            } => Self {
                min_purpose_length,
                max_requirement_length,
                strict,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            min_purpose_length: config.min_purpose_length,
            max_requirement_length: config.max_requirement_length,
            strict: config.strict,
        }
    }
}
