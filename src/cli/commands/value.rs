//! `cardlog value`: price the collection at current market prices.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::exchange;

/// Execute the `value` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_collection()?;

    if store.is_empty() {
        output::info("No cards in this collection yet.");
        return Ok(());
    }

    let catalog = ctx.catalog();
    let lines = exchange::valuation(&store, &catalog)?;
    let total = exchange::total_value(&lines);

    output::print_valuation_table(&lines, total);

    let unpriced = lines.iter().filter(|l| l.unit_price.is_none()).count();
    if unpriced > 0 {
        output::tip(&format!("{unpriced} record(s) have no market price and count as $0.00."));
    }

    Ok(())
}
