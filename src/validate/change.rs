use std::path::Path;

use super::{read, read_optional, reconcile, DeltaContext, Error};
use crate::{domain::Issue, parser::Delta, storage::collect_delta_files};

/// Runs the delta rules and the base spec checks over every delta file of a
/// change.
///
/// Duplicate tracking is shared between the change's delta files and
/// dropped when this returns.
pub(super) fn validate_change(change_dir: &Path, spec_root: &Path) -> Result<Vec<Issue>, Error> {
    let specs_dir = change_dir.join("specs");
    if !specs_dir.is_dir() {
        return Err(Error::SpecsDirNotFound(specs_dir));
    }

    let files = collect_delta_files(&specs_dir);
    if files.is_empty() {
        return Err(Error::NoDeltaFiles(specs_dir));
    }

    let mut context = DeltaContext::new();
    let mut issues = Vec::new();
    let mut sections = 0;

    for file in &files {
        let delta = Delta::parse(&read(&file.path)?);
        sections += delta.section_count();
        issues.extend(context.validate(&file.path, &delta));

        let base_path = spec_root.join(&file.capability).join("spec.md");
        let base = read_optional(&base_path)?;
        if let Err(e) = reconcile(&delta, base.as_deref()) {
            issues.push(Issue::error(
                file.path.display().to_string(),
                format!("{} fails: {e}", file.capability.display()),
            ));
        }
    }

    if sections == 0 {
        issues.push(Issue::error(
            specs_dir.display().to_string(),
            "Change must have at least one delta operation (ADDED, MODIFIED, REMOVED or RENAMED)",
        ));
    }

    Ok(issues)
}
