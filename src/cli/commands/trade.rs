//! `cardlog trade`: exchange cards with another collection.
//!
//! Usage:
//!   cardlog trade --with misty --give swsh1-1:holofoil:2 --take base1-4:feh
//!   cardlog trade --with misty --give swsh1-1:holofoil --take base1-4:feh -y
//!
//! The counterparty's password comes from `CARDLOG_OTHER_PASSWORD` or a
//! prompt.  Both sides are priced first and the trade only goes ahead once
//! confirmed (or with `--yes`).  Nothing is written unless every line
//! checks out.

use dialoguer::Confirm;

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};
use crate::trade::{self, TradeItem, TradeResult};

/// Execute the `trade` command.
pub fn execute(
    ctx: &Context,
    with: &str,
    give: &[TradeItem],
    take: &[TradeItem],
    yes: bool,
) -> Result<()> {
    if with == ctx.collection {
        return Err(CardLogError::Validation(
            "cannot trade a collection with itself".into(),
        ));
    }

    let mut own = ctx.open_collection()?;
    let mut other = ctx.open_other(with)?;
    let catalog = ctx.catalog();

    let value = trade::trade_value(&catalog, give, take)?;
    output::info(&format!(
        "You give ${:.2}, you take ${:.2}",
        value.offered, value.requested
    ));
    output::info(&value.to_string());

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Trade with '{with}'?"))
            .default(false)
            .interact()
            .map_err(|e| CardLogError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let result = trade::trade_many(&mut own, &mut other, &catalog, give, take)?;

    let lines = |items: &[TradeItem]| {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    ctx.audit(
        AuditOp::Trade,
        None,
        Some(&format!(
            "with {with}: gave [{}], took [{}], code {}",
            lines(give),
            lines(take),
            result.code()
        )),
    );
    if result.is_success() {
        ctx.audit_for(
            with,
            AuditOp::Trade,
            None,
            Some(&format!(
                "with {}: gave [{}], took [{}], code 0",
                ctx.collection,
                lines(take),
                lines(give)
            )),
        );
    }

    match result {
        TradeResult::Success => {
            output::success(&format!("Traded with '{with}'"));
            output::info(&format!("Gave: {}", lines(give)));
            output::info(&format!("Took: {}", lines(take)));
            Ok(())
        }
        failure => Err(CardLogError::CommandFailed(format!(
            "trade rejected (code {}): {failure}",
            failure.code()
        ))),
    }
}
