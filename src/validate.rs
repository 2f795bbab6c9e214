//! Validation of base specs and change deltas.
//!
//! The [`Validator`] is the entry point. It reads the files, runs the rules
//! and returns a [`Report`]. Problems with the content of a file become
//! issues inside the report; problems that prevent validation from running
//! at all (a missing directory, an unreadable file) are returned as an
//! [`Error`] instead.

use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::domain::{Config, Report};

mod change;

/// Per-operation rules for delta files.
pub mod delta;
pub use delta::DeltaContext;

/// Pre-merge checks of a delta against its base spec.
pub mod reconcile;
pub use reconcile::{reconcile, ReconcileError};

mod spec;
pub use spec::validate_spec_text;

/// Failures that stop a target from being validated at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The change has no `specs/` directory.
    #[error("specs directory not found: {}", .0.display())]
    SpecsDirNotFound(PathBuf),

    /// The change's `specs/` directory contains no delta files.
    #[error("no spec.md files found under {}", .0.display())]
    NoDeltaFiles(PathBuf),
}

/// Validates specs and changes, producing a [`Report`] for each.
///
/// Each call is independent: a change's duplicate tracking lives only for
/// the duration of [`Validator::validate_change`], so a single validator can
/// be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    strict: bool,
    config: Config,
}

impl Validator {
    /// Creates a validator with the default configuration.
    ///
    /// In strict mode every warning is reported as an error.
    #[must_use]
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            config: Config::default(),
        }
    }

    /// Replaces the configuration used for spec file rules.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Whether warnings are escalated to errors.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Validates a standalone base spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    #[instrument(level = "debug", skip(self))]
    pub fn validate_spec(&self, path: &Path) -> Result<Report, Error> {
        let text = read(path)?;
        let issues = validate_spec_text(&path.display().to_string(), &text, &self.config);
        Ok(Report::new(issues, self.strict))
    }

    /// Validates every delta file of a change.
    ///
    /// The base specs are looked up in the `specs/` directory that sits
    /// beside the change's parent directory, i.e. for
    /// `<project>/changes/<id>` the base specs live in `<project>/specs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the change has no `specs/` directory, if that
    /// directory holds no `spec.md` files, or if any file cannot be read.
    #[instrument(level = "debug", skip(self))]
    pub fn validate_change(&self, change_dir: &Path) -> Result<Report, Error> {
        let spec_root = spec_root_for(change_dir);
        let issues = change::validate_change(change_dir, &spec_root)?;
        Ok(Report::new(issues, self.strict))
    }
}

/// The base spec directory of the project a change belongs to.
fn spec_root_for(change_dir: &Path) -> PathBuf {
    change_dir
        .parent()
        .and_then(Path::parent)
        .filter(|project| !project.as_os_str().is_empty())
        .map_or_else(
            || change_dir.join("..").join("..").join("specs"),
            |project| project.join("specs"),
        )
}

fn read(path: &Path) -> Result<String, Error> {
    tracing::debug!("reading {}", path.display());
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a file that is allowed to be absent.
fn read_optional(path: &Path) -> Result<Option<String>, Error> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist", path.display());
            Ok(None)
        }
        Err(source) => Err(Error::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
