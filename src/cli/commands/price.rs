//! `cardlog price`: show the catalog's price table for a card.

use crate::catalog::CatalogGateway;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};

/// Execute the `price` command.  Needs no collection password.
pub fn execute(ctx: &Context, card_id: &str) -> Result<()> {
    let catalog = ctx.catalog();
    let card = catalog
        .find_card(card_id)?
        .ok_or_else(|| CardLogError::UnknownCard(card_id.to_string()))?;

    output::print_price_table(&card);
    Ok(())
}
