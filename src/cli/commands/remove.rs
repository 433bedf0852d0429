//! `cardlog remove`: remove copies of a card.

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::store::PrintType;

/// Execute the `remove` command.
pub fn execute(ctx: &Context, card_id: &str, print_type: PrintType, qty: u64) -> Result<()> {
    let mut store = ctx.open_collection()?;
    let held = store.quantity(card_id, print_type);

    let remaining = store.remove_card(card_id, print_type, qty)?;

    ctx.audit(AuditOp::Remove, Some(card_id), Some(&format!("-{qty} {print_type}")));

    if remaining == 0 {
        if qty > held {
            output::warning(&format!(
                "Only {held} held; removed all of them."
            ));
        }
        output::success(&format!(
            "Removed {card_id} ({}) from the collection",
            print_type.label()
        ));
    } else {
        output::success(&format!(
            "Removed {qty}x {card_id} ({}) — {remaining} left",
            print_type.label()
        ));
    }

    Ok(())
}
