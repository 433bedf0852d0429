//! `cardlog sets`: browse expansion sets.
//!
//! Usage:
//!   cardlog sets list
//!   cardlog sets show swsh1

use crate::catalog::CatalogGateway;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};

/// Execute `cardlog sets list`.
pub fn execute_list(ctx: &Context) -> Result<()> {
    let sets = ctx.catalog().list_sets()?;

    if sets.is_empty() {
        output::info("The catalog returned no sets.");
        return Ok(());
    }

    output::info(&format!("{} set(s):", sets.len()));
    output::print_sets_table(&sets);
    Ok(())
}

/// Execute `cardlog sets show <id>`.
pub fn execute_show(ctx: &Context, set_id: &str) -> Result<()> {
    let set = ctx
        .catalog()
        .find_set(set_id)?
        .ok_or_else(|| CardLogError::CommandFailed(format!("set '{set_id}' does not exist")))?;

    output::print_set_details(&set);
    Ok(())
}
