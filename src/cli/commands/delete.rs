//! `cardlog delete`: drop a record regardless of quantity.

use dialoguer::Confirm;

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};
use crate::store::PrintType;

/// Execute the `delete` command.
pub fn execute(ctx: &Context, card_id: &str, print_type: PrintType, force: bool) -> Result<()> {
    let mut store = ctx.open_collection()?;

    let held = store.quantity(card_id, print_type);
    if held == 0 {
        return Err(CardLogError::RecordNotFound {
            card_id: card_id.to_string(),
            print_type: print_type.to_string(),
        });
    }

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete all {held} of {card_id} ({})?",
                print_type.label()
            ))
            .default(false)
            .interact()
            .map_err(|e| CardLogError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let dropped = store.delete_card(card_id, print_type)?;

    ctx.audit(AuditOp::Delete, Some(card_id), Some(&format!("{dropped} {print_type}")));
    output::success(&format!(
        "Deleted {card_id} ({}), {dropped} copies",
        print_type.label()
    ));

    Ok(())
}
