//! `cardlog status`: check that the card catalog answers.

use std::time::Instant;

use crate::catalog::CatalogGateway;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `status` command.
///
/// The probe goes through the client's normal retry policy, so a flaky
/// connection gets `catalog_retries` attempts before this reports failure.
pub fn execute(ctx: &Context) -> Result<()> {
    let config = ctx.settings.catalog_config();
    let catalog = ctx.catalog();

    let started = Instant::now();
    catalog.probe()?;

    output::success(&format!(
        "Catalog at {} is up ({} ms)",
        config.base_url,
        started.elapsed().as_millis()
    ));
    if config.api_key.is_none() {
        output::tip("No API key configured; requests are rate-limited. Set CARDLOG_API_KEY.");
    }

    Ok(())
}
