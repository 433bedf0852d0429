//! `cardlog show`: how many copies of a card are held.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::store::{PrintType, Record};

/// Execute the `show` command.
pub fn execute(ctx: &Context, card_id: &str, print_type: Option<PrintType>) -> Result<()> {
    let store = ctx.open_collection()?;

    if let Some(pt) = print_type {
        let qty = store.quantity(card_id, pt);
        println!("{qty}");
        if qty == 0 {
            output::tip(&format!("No {} copies of {card_id} held.", pt.label()));
        }
        return Ok(());
    }

    let records: Vec<Record> = store
        .variants(card_id)
        .into_iter()
        .map(|(print_type, quantity)| Record {
            card_id: card_id.to_string(),
            print_type,
            quantity,
        })
        .collect();

    if records.is_empty() {
        output::info(&format!("No copies of {card_id} in '{}'.", ctx.collection));
        return Ok(());
    }

    output::print_records_table(&records);
    Ok(())
}
