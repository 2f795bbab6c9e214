use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use specdelta::{
    storage::{list_change_ids, list_spec_ids},
    Config, Report, Validator,
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Validate changes and specs")]
#[allow(clippy::struct_excessive_bools)]
pub struct Validate {
    /// A change id, spec id, or path to a change directory or spec file
    item: Option<String>,

    /// Treat ITEM as this kind of target when the name is ambiguous
    #[arg(long = "type", value_name = "TYPE")]
    item_type: Option<ItemType>,

    /// Validate every change and every spec
    #[arg(long, conflicts_with_all = ["item", "changes", "specs"])]
    all: bool,

    /// Validate every change
    #[arg(long, conflicts_with = "item")]
    changes: bool,

    /// Validate every spec
    #[arg(long, conflicts_with = "item")]
    specs: bool,

    /// Report warnings as errors
    #[arg(long)]
    strict: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum ItemType {
    Change,
    Spec,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Change => f.write_str("change"),
            Self::Spec => f.write_str("spec"),
        }
    }
}

/// Something to validate: a change directory or a spec file.
#[derive(Debug, Clone)]
struct Target {
    id: String,
    kind: ItemType,
    path: PathBuf,
}

impl Target {
    fn change(root: &Path, id: String) -> Self {
        let path = root.join("changes").join(&id);
        Self {
            id,
            kind: ItemType::Change,
            path,
        }
    }

    fn spec(root: &Path, id: String) -> Self {
        let path = root.join("specs").join(&id).join("spec.md");
        Self {
            id,
            kind: ItemType::Spec,
            path,
        }
    }

    fn validate(&self, validator: &Validator) -> Result<Report, specdelta::Error> {
        match self.kind {
            ItemType::Change => validator.validate_change(&self.path),
            ItemType::Spec => validator.validate_spec(&self.path),
        }
    }
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let validator = self.validator(root);

        if self.all || self.changes || self.specs {
            return self.run_bulk(root, &validator);
        }

        let Some(item) = &self.item else {
            anyhow::bail!("Nothing to validate. Pass an item, or use --all, --changes or --specs");
        };
        let target = resolve(root, item, self.item_type)?;
        let report = target
            .validate(&validator)
            .with_context(|| format!("Failed to validate {} '{}'", target.kind, target.id))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&target, &report, validator.is_strict());
        }

        if !report.is_valid() {
            std::process::exit(1);
        }
        Ok(())
    }

    /// Strict mode is on when either the flag or the project config asks for it.
    fn validator(&self, root: &Path) -> Validator {
        let config = Config::load_or_default(root);
        Validator::new(self.strict || config.strict).with_config(config)
    }

    fn run_bulk(&self, root: &Path, validator: &Validator) -> anyhow::Result<()> {
        let mut targets = Vec::new();
        if self.all || self.changes {
            targets.extend(
                list_change_ids(root)
                    .into_iter()
                    .map(|id| Target::change(root, id)),
            );
        }
        if self.all || self.specs {
            targets.extend(
                list_spec_ids(root)
                    .into_iter()
                    .map(|id| Target::spec(root, id)),
            );
        }

        if targets.is_empty() {
            if self.json {
                println!("{}", bulk_json(&[]));
            } else {
                println!("{}", "Nothing to validate.".dim());
            }
            return Ok(());
        }

        // Each target gets its own validation pass, so they can run in parallel.
        let results: Vec<_> = targets
            .into_par_iter()
            .map(|target| {
                let result = target.validate(validator);
                (target, result)
            })
            .collect();

        let failed = count_failures(&results);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&bulk_json(&results))?);
        } else {
            Self::output_bulk_table(&results, failed, validator.is_strict());
        }

        if failed > 0 {
            std::process::exit(1);
        }
        Ok(())
    }

    fn output_bulk_table(results: &[BulkResult], failed: usize, strict: bool) {
        for (target, result) in results {
            match result {
                Ok(report) => print_report(target, report, strict),
                Err(e) => println!(
                    "{}",
                    format!("✗ {} '{}': {e}", target.kind, target.id).error()
                ),
            }
        }

        let total = results.len();
        let summary = format!(
            "Validated {total} item(s): {} passed, {failed} failed",
            total - failed
        );
        if failed == 0 {
            println!("\n{}", summary.success());
        } else {
            println!("\n{}", summary.warning());
        }
    }
}

type BulkResult = (Target, Result<Report, specdelta::Error>);

/// Items that could not be validated count as failures.
fn count_failures(results: &[BulkResult]) -> usize {
    results
        .iter()
        .filter(|(_, result)| !result.as_ref().is_ok_and(Report::is_valid))
        .count()
}

fn bulk_json(results: &[BulkResult]) -> serde_json::Value {
    use serde_json::json;

    let failed = count_failures(results);
    let items: Vec<_> = results
        .iter()
        .map(|(target, result)| match result {
            Ok(report) => json!({
                "id": target.id,
                "type": target.kind,
                "valid": report.is_valid(),
                "report": report,
            }),
            Err(e) => json!({
                "id": target.id,
                "type": target.kind,
                "valid": false,
                "error": e.to_string(),
            }),
        })
        .collect();

    json!({
        "items": items,
        "summary": {
            "total": results.len(),
            "passed": results.len() - failed,
            "failed": failed,
        }
    })
}

/// Works out whether `item` names a change or a spec.
///
/// Ids are looked up under `changes/` and `specs/` first; anything else is
/// treated as a path.
fn resolve(root: &Path, item: &str, item_type: Option<ItemType>) -> anyhow::Result<Target> {
    let change = Target::change(root, item.to_string());
    let spec = Target::spec(root, item.to_string());
    let is_change = change.path.is_dir();
    let is_spec = spec.path.is_file();

    let path = Path::new(item);
    let as_path = |kind| Target {
        id: item.to_string(),
        kind,
        path: path.to_path_buf(),
    };

    match item_type {
        Some(ItemType::Change) if is_change => Ok(change),
        Some(ItemType::Change) if path.is_dir() => Ok(as_path(ItemType::Change)),
        Some(ItemType::Spec) if is_spec => Ok(spec),
        Some(ItemType::Spec) if path.is_file() => Ok(as_path(ItemType::Spec)),
        Some(kind) => anyhow::bail!("No {kind} named '{item}'"),
        None => match (is_change, is_spec) {
            (true, true) => anyhow::bail!(
                "'{item}' is both a change and a spec. Use --type change or --type spec"
            ),
            (true, false) => Ok(change),
            (false, true) => Ok(spec),
            (false, false) if path.is_file() => Ok(as_path(ItemType::Spec)),
            (false, false) if path.is_dir() => Ok(as_path(ItemType::Change)),
            (false, false) => anyhow::bail!("Unknown item '{item}'"),
        },
    }
}

fn print_report(target: &Target, report: &Report, strict: bool) {
    if report.issues().is_empty() {
        println!(
            "{}",
            format!("✓ {} '{}' is valid", target.kind, target.id).success()
        );
        return;
    }

    for issue in report.issues() {
        let label = format!("[{}]", issue.level).level(issue.level);
        println!("{label} {}: {}", issue.path, issue.message);
    }

    let summary = report.summary();
    let line = format!(
        "{} {} '{}': {} error(s), {} warning(s), {} info{}",
        if report.is_valid() { "✓" } else { "✗" },
        target.kind,
        target.id,
        summary.errors,
        summary.warnings,
        summary.info,
        if strict { " (strict)" } else { "" }
    );
    if report.is_valid() {
        println!("{}", line.success());
    } else {
        println!("{}", line.error());
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("changes/add-2fa/specs/auth")).unwrap();
        fs::create_dir_all(tmp.path().join("specs/auth")).unwrap();
        fs::write(tmp.path().join("specs/auth/spec.md"), "").unwrap();
        tmp
    }

    #[test]
    fn ids_resolve_to_changes_and_specs() {
        let tmp = project();

        let change = resolve(tmp.path(), "add-2fa", None).unwrap();
        assert_eq!(change.kind, ItemType::Change);
        assert_eq!(change.path, tmp.path().join("changes/add-2fa"));

        let spec = resolve(tmp.path(), "auth", None).unwrap();
        assert_eq!(spec.kind, ItemType::Spec);
        assert_eq!(spec.path, tmp.path().join("specs/auth/spec.md"));
    }

    #[test]
    fn ambiguous_ids_need_a_type() {
        let tmp = project();
        fs::create_dir_all(tmp.path().join("changes/auth")).unwrap();

        assert!(resolve(tmp.path(), "auth", None).is_err());
        let spec = resolve(tmp.path(), "auth", Some(ItemType::Spec)).unwrap();
        assert_eq!(spec.kind, ItemType::Spec);
    }

    #[test]
    fn paths_are_accepted() {
        let tmp = project();
        let file = tmp.path().join("specs/auth/spec.md");
        let target = resolve(tmp.path(), file.to_str().unwrap(), None).unwrap();
        assert_eq!(target.kind, ItemType::Spec);
        assert_eq!(target.path, file);
    }

    #[test]
    fn unknown_items_are_rejected() {
        let tmp = project();
        assert!(resolve(tmp.path(), "nope", None).is_err());
        assert!(resolve(tmp.path(), "add-2fa", Some(ItemType::Spec)).is_err());
    }

    fn args() -> Validate {
        Validate {
            item: None,
            item_type: None,
            all: false,
            changes: false,
            specs: false,
            strict: false,
            json: false,
        }
    }

    #[test]
    fn config_can_turn_on_strict_mode() {
        let tmp = project();
        let spec = tmp.path().join("specs/auth/spec.md");
        fs::write(&spec, "## Purpose\nShort.\n\n## Requirements\n").unwrap();

        let lenient = args().validator(tmp.path());
        assert!(!lenient.is_strict());
        assert_eq!(lenient.validate_spec(&spec).unwrap().summary().warnings, 1);

        fs::write(tmp.path().join("config.toml"), "_version = \"1\"\nstrict = true\n").unwrap();
        let strict = args().validator(tmp.path());
        assert!(strict.is_strict());
        let report = strict.validate_spec(&spec).unwrap();
        assert_eq!(report.summary().errors, 1);
        assert!(!report.is_valid());
    }

    fn bulk_results() -> Vec<BulkResult> {
        let root = Path::new("project");
        vec![
            (
                Target::change(root, "broken".to_string()),
                Err(specdelta::Error::SpecsDirNotFound(
                    root.join("changes/broken/specs"),
                )),
            ),
            (
                Target::spec(root, "auth".to_string()),
                Ok(Report::new(Vec::new(), false)),
            ),
            (
                Target::spec(root, "billing".to_string()),
                Ok(Report::new(
                    vec![specdelta::Issue::error("billing", "Spec must have a Purpose section")],
                    false,
                )),
            ),
        ]
    }

    #[test]
    fn unvalidatable_items_count_as_failures() {
        assert_eq!(count_failures(&bulk_results()), 2);
        assert_eq!(count_failures(&bulk_results()[1..2]), 0);
    }

    #[test]
    fn bulk_json_reports_each_item_and_totals() {
        let json = bulk_json(&bulk_results());

        assert_eq!(
            json["summary"],
            serde_json::json!({"total": 3, "passed": 1, "failed": 2})
        );

        let broken = &json["items"][0];
        assert_eq!(broken["id"], "broken");
        assert_eq!(broken["type"], "change");
        assert_eq!(broken["valid"], false);
        assert!(broken["error"].as_str().unwrap().starts_with("specs directory not found"));
        assert!(broken.get("report").is_none());

        let auth = &json["items"][1];
        assert_eq!(auth["type"], "spec");
        assert_eq!(auth["valid"], true);
        assert_eq!(auth["report"]["summary"]["errors"], 0);
        assert!(auth.get("error").is_none());

        assert_eq!(json["items"][2]["report"]["issues"][0]["level"], "ERROR");
    }

    #[test]
    fn empty_bulk_run_has_zero_totals() {
        let json = bulk_json(&[]);
        assert_eq!(json["items"], serde_json::json!([]));
        assert_eq!(json["summary"]["total"], 0);
    }
}
