//! Locating changes, specs and delta files on disk.
//!
//! A project directory is laid out as:
//!
//! ```text
//! <project>/
//!   config.toml
//!   specs/<capability>/spec.md
//!   changes/<change>/specs/<capability>/spec.md
//!   changes/archive/...
//! ```

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

const SPEC_FILE: &str = "spec.md";

/// A delta `spec.md` inside a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaFile {
    /// Path to the delta file.
    pub path: PathBuf,
    /// The capability it targets: its directory relative to the change's
    /// `specs/` directory.
    pub capability: PathBuf,
}

/// Every `spec.md` beneath a change's `specs/` directory, sorted by path.
#[must_use]
pub fn collect_delta_files(specs_dir: &Path) -> Vec<DeltaFile> {
    WalkDir::new(specs_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == OsStr::new(SPEC_FILE))
        .filter_map(|entry| {
            let path = entry.into_path();
            let capability = path.parent()?.strip_prefix(specs_dir).ok()?.to_path_buf();
            Some(DeltaFile { path, capability })
        })
        .collect()
}

/// The ids of active changes, sorted.
///
/// Hidden directories and the `archive` directory are skipped. Returns an
/// empty list if `<root>/changes` does not exist.
#[must_use]
pub fn list_change_ids(root: &Path) -> Vec<String> {
    list_dirs(&root.join("changes"))
        .filter(|(name, _)| name != "archive")
        .map(|(name, _)| name)
        .collect()
}

/// The ids of base specs, sorted.
///
/// Only directories containing a `spec.md` count. Returns an empty list if
/// `<root>/specs` does not exist.
#[must_use]
pub fn list_spec_ids(root: &Path) -> Vec<String> {
    list_dirs(&root.join("specs"))
        .filter(|(_, path)| path.join(SPEC_FILE).is_file())
        .map(|(name, _)| name)
        .collect()
}

/// Non-hidden subdirectories of `dir`, sorted by name.
fn list_dirs(dir: &Path) -> impl Iterator<Item = (String, PathBuf)> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            (!name.starts_with('.')).then(|| (name, entry.into_path()))
        })
}
