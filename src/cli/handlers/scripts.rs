//! Script upload handler

use super::super::CliContext;
use anyhow::Result;
use std::path::Path;

/// Handler for `upload` and `scripts`
pub struct ScriptsHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ScriptsHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub fn handle_upload(&self, source: &Path, name: Option<&str>) -> Result<()> {
        let placed = self.context.script_store().place(source, name)?;

        if let Some(warning) = &placed.warning {
            eprintln!("warning: {}", warning);
        }
        let how = if placed.copied { "copied" } else { "moved" };
        println!("Placed {} at {} ({})", placed.file_name, placed.path.display(), how);
        Ok(())
    }

    pub fn handle_list(&self, json: bool) -> Result<()> {
        let store = self.context.script_store();
        let entries = store.list()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No scripts in {}", store.dest_dir().display());
            return Ok(());
        }

        println!("Scripts in {}:", store.dest_dir().display());
        for entry in &entries {
            let modified = entry
                .modified
                .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            if entry.is_dir {
                println!("  {:<32} {:>10}  {}", format!("{}/", entry.name), "<dir>", modified);
            } else {
                println!("  {:<32} {:>10}  {}", entry.name, entry.size, modified);
            }
        }
        Ok(())
    }
}

super::traits::impl_context_handler!(ScriptsHandler<'a>);
