//! `cardlog add`: add copies of a card to the collection.

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::store::PrintType;

/// Execute the `add` command.
pub fn execute(ctx: &Context, card_id: &str, print_type: PrintType, qty: u64) -> Result<()> {
    let mut store = ctx.open_collection()?;
    let catalog = ctx.catalog();

    let total = store.add_card(&catalog, card_id, print_type, qty)?;

    ctx.audit(AuditOp::Add, Some(card_id), Some(&format!("+{qty} {print_type}")));
    output::success(&format!(
        "Added {qty}x {card_id} ({}) — you now hold {total}",
        print_type.label()
    ));

    Ok(())
}
