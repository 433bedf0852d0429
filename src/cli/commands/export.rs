//! `cardlog export`: write the collection as CSV.
//!
//! Columns are `card_id,print_type,qnty`, plus `price` (market value of the
//! whole line) with `--prices`.

use std::io;
use std::path::Path;

use crate::audit::AuditOp;
use crate::catalog::CatalogGateway;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};
use crate::exchange;
use crate::store::STORE_EXTENSION;

/// Execute the `export` command.
pub fn execute(ctx: &Context, output_path: Option<&str>, prices: bool) -> Result<()> {
    let store = ctx.open_collection()?;

    let client = ctx.catalog();
    let catalog: Option<&dyn CatalogGateway> = if prices { Some(&client) } else { None };

    let rows = exchange::export_rows(&store, catalog)?;

    ctx.audit(
        AuditOp::Export,
        None,
        Some(&format!("{} rows, prices: {prices}", rows.len())),
    );

    match output_path {
        Some(dest) => {
            let dest_path = Path::new(dest);

            // Refuse to overwrite collection files.
            if dest_path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(STORE_EXTENSION))
            {
                return Err(CardLogError::CommandFailed(format!(
                    "refusing to export over a .{STORE_EXTENSION} file"
                )));
            }

            let file = std::fs::File::create(dest_path).map_err(|e| {
                CardLogError::CommandFailed(format!("failed to write export file: {e}"))
            })?;
            exchange::write_rows(file, &rows, prices)?;

            output::success(&format!("Exported {} rows to {dest}", rows.len()));
        }
        None => {
            // Raw CSV on stdout, no decoration.
            exchange::write_rows(io::stdout().lock(), &rows, prices)?;
        }
    }

    Ok(())
}
