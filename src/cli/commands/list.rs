//! `cardlog list`: show every record in the collection.

use console::style;

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_collection()?;
    let records = store.records();

    if !records.is_empty() {
        println!(
            "{} {} record(s), {} card(s)",
            style(format!("{}:", ctx.collection)).bold(),
            store.len(),
            store.total_quantity()
        );
    }
    output::print_records_table(&records);

    Ok(())
}
