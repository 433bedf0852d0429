//! `cardlog logins`: show when the collection was opened.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `logins` command.
///
/// Opening the collection to read the history records a login too, so the
/// last row is always the current invocation.
pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_collection()?;
    output::print_logins_table(&store.logins());
    Ok(())
}
