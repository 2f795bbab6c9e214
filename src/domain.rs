//! Domain models for spec validation.
//!
//! This module contains the issue and report types produced by every
//! validator, the project configuration, and the name predicates used for
//! duplicate and conflict detection.

mod config;
pub use config::Config;

/// Validation issues and their severity.
pub mod issue;
pub use issue::{Issue, Level};

/// Requirement name normalization and normative keyword detection.
pub mod name;
pub use name::{contains_shall_or_must, normalize_requirement_name};

/// Aggregated validation reports.
pub mod report;
pub use report::{Report, Summary};
