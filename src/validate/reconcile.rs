use std::collections::HashSet;

use crate::{
    domain::normalize_requirement_name,
    parser::{extract_requirements, Delta, Operation},
};

/// Why a delta cannot be applied to its base spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The base spec is absent and the delta does more than add.
    #[error("target spec does not exist; only ADDED is allowed (found {0})")]
    TargetMissing(Operation),

    /// A MODIFIED requirement is not in the base spec.
    #[error("MODIFIED requirement \"{0}\" does not exist in base spec")]
    ModifiedMissing(String),

    /// A REMOVED requirement is not in the base spec.
    #[error("REMOVED requirement \"{0}\" does not exist in base spec")]
    RemovedMissing(String),

    /// The source of a rename is not in the base spec.
    #[error("RENAMED requirement \"{0}\" does not exist in base spec")]
    RenameSourceMissing(String),

    /// The target of a rename is already taken.
    #[error("RENAMED target \"{to}\" (from \"{from}\") already exists in base spec")]
    RenameTargetExists {
        /// The current name.
        from: String,
        /// The requested name.
        to: String,
    },

    /// An ADDED requirement is already in the base spec.
    #[error("ADDED requirement \"{0}\" already exists in base spec")]
    AlreadyExists(String),
}

/// Checks that a delta could be merged into its base spec.
///
/// `base` is the text of the base spec, or `None` if it does not exist. The
/// first problem found is returned. Incomplete rename pairs are skipped;
/// they are reported by the delta rules.
///
/// # Errors
///
/// Returns the first operation that cannot be applied.
pub fn reconcile(delta: &Delta, base: Option<&str>) -> Result<(), ReconcileError> {
    let renames: Vec<_> = delta.renames().iter().filter(|p| p.is_complete()).collect();

    let Some(base) = base else {
        let illegal = [Operation::Modified, Operation::Removed]
            .into_iter()
            .find(|&op| !delta.requirements(op).is_empty())
            .or_else(|| (!renames.is_empty()).then_some(Operation::Renamed));
        return illegal.map_or(Ok(()), |op| Err(ReconcileError::TargetMissing(op)));
    };

    let existing: HashSet<String> = extract_requirements(base)
        .iter()
        .map(|r| normalize_requirement_name(&r.name))
        .collect();

    // Names a MODIFIED entry may refer to once this delta's renames apply.
    let renamed_to: HashSet<String> = renames
        .iter()
        .filter(|p| existing.contains(&normalize_requirement_name(&p.from)))
        .map(|p| normalize_requirement_name(&p.to))
        .collect();

    for requirement in delta.requirements(Operation::Modified) {
        let name = normalize_requirement_name(&requirement.name);
        if !existing.contains(&name) && !renamed_to.contains(&name) {
            return Err(ReconcileError::ModifiedMissing(requirement.name.clone()));
        }
    }

    for requirement in delta.requirements(Operation::Removed) {
        if !existing.contains(&normalize_requirement_name(&requirement.name)) {
            return Err(ReconcileError::RemovedMissing(requirement.name.clone()));
        }
    }

    for pair in renames {
        let from = normalize_requirement_name(&pair.from);
        let to = normalize_requirement_name(&pair.to);
        if !existing.contains(&from) {
            return Err(ReconcileError::RenameSourceMissing(pair.from.clone()));
        }
        if to != from && existing.contains(&to) {
            return Err(ReconcileError::RenameTargetExists {
                from: pair.from.clone(),
                to: pair.to.clone(),
            });
        }
    }

    for requirement in delta.requirements(Operation::Added) {
        if existing.contains(&normalize_requirement_name(&requirement.name)) {
            return Err(ReconcileError::AlreadyExists(requirement.name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "\
## Purpose
Handles user authentication for every client application we ship.

## Requirements
### Requirement: Login
The system SHALL log users in.

### Requirement: Logout
The system SHALL log users out.
";

    fn delta(section: &str, body: &str) -> Delta {
        Delta::parse(&format!("## {section} Requirements\n{body}"))
    }

    fn requirement(name: &str) -> String {
        format!("### Requirement: {name}\nThe system SHALL work.\n#### Scenario: s\nok\n")
    }

    #[test]
    fn added_only_delta_passes_without_base() {
        assert_eq!(reconcile(&delta("ADDED", &requirement("New")), None), Ok(()));
    }

    #[test]
    fn modified_without_base_allows_only_added() {
        let error = reconcile(&delta("MODIFIED", &requirement("Foo")), None).unwrap_err();
        assert_eq!(error, ReconcileError::TargetMissing(Operation::Modified));
        assert!(error.to_string().contains("only ADDED"));
    }

    #[test]
    fn renamed_without_base_is_rejected() {
        let error = reconcile(&delta("RENAMED", "- FROM: A\n- TO: B\n"), None).unwrap_err();
        assert_eq!(error, ReconcileError::TargetMissing(Operation::Renamed));
    }

    #[test]
    fn empty_delta_passes_without_base() {
        assert_eq!(reconcile(&Delta::default(), None), Ok(()));
    }

    #[test]
    fn added_name_must_be_new_in_any_spelling() {
        let error = reconcile(&delta("ADDED", &requirement("  login  ")), Some(BASE)).unwrap_err();
        assert_eq!(error, ReconcileError::AlreadyExists("login".to_string()));
        assert!(error.to_string().contains("already exists in base spec"));
    }

    #[test]
    fn modified_and_removed_names_must_exist() {
        assert_eq!(
            reconcile(&delta("MODIFIED", &requirement("LOGOUT")), Some(BASE)),
            Ok(())
        );
        assert_eq!(
            reconcile(&delta("MODIFIED", &requirement("Register")), Some(BASE)),
            Err(ReconcileError::ModifiedMissing("Register".to_string()))
        );
        assert_eq!(
            reconcile(&delta("REMOVED", "### Requirement: Register\n"), Some(BASE)),
            Err(ReconcileError::RemovedMissing("Register".to_string()))
        );
    }

    #[test]
    fn rename_source_must_exist_and_target_must_be_free() {
        assert_eq!(
            reconcile(&delta("RENAMED", "- FROM: Login\n- TO: Sign in\n"), Some(BASE)),
            Ok(())
        );
        assert_eq!(
            reconcile(&delta("RENAMED", "- FROM: Register\n- TO: Sign up\n"), Some(BASE)),
            Err(ReconcileError::RenameSourceMissing("Register".to_string()))
        );
        assert!(matches!(
            reconcile(&delta("RENAMED", "- FROM: Login\n- TO: Logout\n"), Some(BASE)),
            Err(ReconcileError::RenameTargetExists { .. })
        ));
    }

    #[test]
    fn rename_to_the_same_normalized_name_is_allowed() {
        assert_eq!(
            reconcile(&delta("RENAMED", "- FROM: Login\n- TO: LOGIN\n"), Some(BASE)),
            Ok(())
        );
    }

    #[test]
    fn modified_may_use_the_new_name_of_a_rename() {
        let text = format!(
            "## RENAMED Requirements\n- FROM: Login\n- TO: Sign in\n\n## MODIFIED Requirements\n{}",
            requirement("Sign in")
        );
        assert_eq!(reconcile(&Delta::parse(&text), Some(BASE)), Ok(()));
    }

    #[test]
    fn incomplete_rename_pairs_are_skipped() {
        assert_eq!(
            reconcile(&delta("RENAMED", "- TO: Orphan\n"), Some(BASE)),
            Ok(())
        );
    }
}
