//! `cardlog import`: load records from a CSV file.
//!
//! Each row replaces the stored quantity for its (card, print type).
//! Cards the catalog does not know are skipped and listed.

use std::fs;
use std::path::Path;

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};
use crate::exchange;

/// Execute the `import` command.
pub fn execute(ctx: &Context, file_path: &str) -> Result<()> {
    let source = Path::new(file_path);

    if !source.exists() {
        return Err(CardLogError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }

    // Parse first so a malformed file fails before the password prompt.
    let rows = exchange::read_rows(fs::File::open(source)?)?;
    if rows.is_empty() {
        output::warning("No rows found in the import file.");
        return Ok(());
    }

    let mut store = ctx.open_collection()?;
    let catalog = ctx.catalog();
    let summary = exchange::import_rows(&mut store, &catalog, &rows)?;

    for card_id in &summary.skipped {
        output::warning(&format!("Skipped unknown card '{card_id}'"));
    }

    ctx.audit(
        AuditOp::Import,
        None,
        Some(&format!(
            "{} rows applied, {} skipped, from {file_path}",
            summary.applied,
            summary.skipped.len()
        )),
    );

    output::success(&format!(
        "Imported {} rows into '{}' ({} records, {} cards)",
        summary.applied,
        ctx.collection,
        store.len(),
        store.total_quantity()
    ));

    Ok(())
}
