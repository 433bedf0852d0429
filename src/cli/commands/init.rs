//! `cardlog init`: create a new encrypted collection.

use std::fs;

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{prompt_new_password, Context};
use crate::errors::{CardLogError, Result};
use crate::store::EncryptedStore;

/// Execute the `init` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let data_dir = ctx.data_dir();
    let path = ctx.collection_path();

    // 1. Create the data directory if it doesn't exist.
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
        output::info(&format!("Created data directory: {}", data_dir.display()));
    }

    // 2. Refuse to overwrite an existing collection.
    if path.exists() {
        output::tip("Use `cardlog add` to add cards to the existing collection.");
        return Err(CardLogError::CollectionAlreadyExists(path));
    }

    // 3. Choose a password and write the empty collection.
    let password = prompt_new_password(ctx.settings.prompt_attempts)?;
    let store = EncryptedStore::create(&path, password.as_bytes(), &ctx.settings.kdf_params())?;

    output::success(&format!(
        "Collection '{}' created at {}",
        ctx.collection,
        store.path().display()
    ));

    ctx.audit(AuditOp::Init, None, Some("collection created"));

    output::tip("Run `cardlog add <CARD> <PRINT-TYPE> [QTY]` to add a card.");
    output::tip("Run `cardlog import <FILE>` to load a CSV export.");

    Ok(())
}
