use std::path::Path;

use clap::Parser;
use specdelta::storage::{list_change_ids, list_spec_ids};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "List active changes, or base specs")]
pub struct List {
    /// List base specs instead of changes
    #[arg(long)]
    specs: bool,

    /// Print the ids as a JSON array
    #[arg(long)]
    json: bool,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let (ids, noun) = if self.specs {
            (list_spec_ids(root), "specs")
        } else {
            (list_change_ids(root), "changes")
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ids)?);
            return Ok(());
        }

        if ids.is_empty() {
            println!("{}", format!("No {noun} found.").dim());
            return Ok(());
        }

        for id in ids {
            println!("{id}");
        }
        Ok(())
    }
}
