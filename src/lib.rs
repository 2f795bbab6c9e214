//! Validation of markdown requirement specs and change deltas
//!
//! A project keeps one base spec per capability under `specs/`, and proposed
//! changes under `changes/`, each with delta files declaring requirements as
//! ADDED, MODIFIED, REMOVED or RENAMED. This crate checks that base specs are
//! well-formed and that deltas are consistent with each other and with the
//! specs they target, without performing the merge.

pub mod domain;
pub use domain::{Config, Issue, Level, Report, Summary};

/// Structural parsing of spec and delta markdown.
pub mod parser;

/// Filesystem discovery of changes, specs and delta files.
pub mod storage;

pub mod validate;
pub use validate::{Error, Validator};
