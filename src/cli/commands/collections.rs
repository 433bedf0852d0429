//! `cardlog collections`: list collection files in the data directory.

use std::fs;
use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::store::STORE_EXTENSION;

/// Execute `cardlog collections`.
pub fn execute(ctx: &Context) -> Result<()> {
    let data_dir = ctx.data_dir();

    if !data_dir.exists() {
        output::info("No data directory found.");
        output::tip("Run `cardlog init` to create a collection.");
        return Ok(());
    }

    let mut collections = list_collections(&data_dir)?;
    collections.sort_by(|a, b| a.name.cmp(&b.name));

    if collections.is_empty() {
        output::info("No collections found.");
        output::tip("Run `cardlog init` to create your first collection.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Collection", "Size", "Active"]);

    for c in &collections {
        let active = if c.name == ctx.collection {
            style("*").green().bold().to_string()
        } else {
            String::new()
        };

        table.add_row(vec![c.name.clone(), format_size(c.size), active]);
    }

    output::info(&format!("{} collection(s) found:", collections.len()));
    println!("{table}");

    Ok(())
}

/// A collection file on disk.
pub struct CollectionInfo {
    pub name: String,
    pub size: u64,
}

/// Scan a data directory for `*.cardlog` files.
pub fn list_collections(data_dir: &Path) -> Result<Vec<CollectionInfo>> {
    let mut collections = Vec::new();

    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().is_some_and(|ext| ext == STORE_EXTENSION) {
            if let Some(stem) = path.file_stem() {
                let name = stem.to_string_lossy().to_string();
                // Staged writes are hidden `.name.tmp` files; skip dotfiles anyway.
                if name.starts_with('.') {
                    continue;
                }
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                collections.push(CollectionInfo { name, size });
            }
        }
    }

    Ok(collections)
}

/// Format file size in human-readable form.
#[allow(clippy::cast_precision_loss)] // File sizes are well within f64 precision range
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
